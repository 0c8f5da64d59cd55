use std::collections::HashMap;

use agora_security::SecurityContext;
use async_trait::async_trait;
use uuid::Uuid;

use crate::config::AuthConfig;
use crate::errors::AuthError;
use crate::traits::TokenValidator;

/// Validator backed by a fixed token -> subject table from configuration.
#[derive(Clone, Default)]
pub struct StaticTokenValidator {
    tokens: HashMap<String, Uuid>,
}

impl StaticTokenValidator {
    #[must_use]
    pub fn new(tokens: HashMap<String, Uuid>) -> Self {
        Self { tokens }
    }

    #[must_use]
    pub fn from_config(config: &AuthConfig) -> Self {
        Self::new(config.tokens.clone())
    }
}

// Tokens are credentials; keep them out of debug output.
impl std::fmt::Debug for StaticTokenValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticTokenValidator")
            .field("tokens", &self.tokens.len())
            .finish()
    }
}

#[async_trait]
impl TokenValidator for StaticTokenValidator {
    async fn validate(&self, token: &str) -> Result<SecurityContext, AuthError> {
        let subject_id = self.tokens.get(token).ok_or(AuthError::InvalidToken)?;
        Ok(SecurityContext::builder().subject_id(*subject_id).build())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_known_token_yields_subject() {
        let subject = Uuid::new_v4();
        let validator = StaticTokenValidator::new(HashMap::from([("t1".to_owned(), subject)]));
        let ctx = validator.validate("t1").await.unwrap();
        assert_eq!(ctx.subject_id(), subject);
    }

    #[tokio::test]
    async fn test_unknown_token_is_rejected() {
        let validator = StaticTokenValidator::default();
        assert!(matches!(
            validator.validate("nope").await,
            Err(AuthError::InvalidToken)
        ));
    }

    #[test]
    fn test_debug_hides_tokens() {
        let validator =
            StaticTokenValidator::new(HashMap::from([("secret".to_owned(), Uuid::new_v4())]));
        assert!(!format!("{validator:?}").contains("secret"));
    }
}
