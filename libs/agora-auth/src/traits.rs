use agora_security::SecurityContext;
use async_trait::async_trait;

use crate::errors::AuthError;

/// Validates bearer tokens
#[async_trait]
pub trait TokenValidator: Send + Sync {
    /// Validate a token and return the security context of its subject
    async fn validate(&self, token: &str) -> Result<SecurityContext, AuthError>;
}
