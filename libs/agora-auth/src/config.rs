use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Authentication configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuthConfig {
    /// Accepted bearer tokens and the subject each one authenticates
    #[serde(default)]
    pub tokens: HashMap<String, Uuid>,
}

impl AuthConfig {
    /// Validate the configuration for consistency
    ///
    /// # Errors
    /// Returns a message for an empty token or a nil subject.
    pub fn validate(&self) -> Result<(), String> {
        if self.tokens.keys().any(|t| t.trim().is_empty()) {
            return Err("auth.tokens contains an empty token".to_owned());
        }
        if self.tokens.values().any(Uuid::is_nil) {
            return Err("auth.tokens maps a token to the nil subject".to_owned());
        }
        Ok(())
    }
}
