//! Domain error types for the user-preferences module.

use agora_security::CapabilityError;
use thiserror::Error;
use user_preferences_sdk::{MergeError, PreferencesError};

#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Identity not found")]
    NotFound,

    #[error(transparent)]
    Merge(#[from] MergeError),

    #[error("Validation error on '{field}': {message}")]
    Validation { field: String, message: String },

    #[error(transparent)]
    Forbidden(#[from] CapabilityError),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Storage error: {0}")]
    Storage(#[from] anyhow::Error),
}

impl DomainError {
    #[must_use]
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    #[must_use]
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict(message.into())
    }
}

impl From<DomainError> for PreferencesError {
    fn from(e: DomainError) -> Self {
        match e {
            DomainError::NotFound => PreferencesError::not_found(),
            DomainError::Merge(err) => PreferencesError::InvalidDocument(err),
            DomainError::Validation { field, message } => {
                PreferencesError::validation(format!("{field}: {message}"))
            }
            DomainError::Forbidden(err) => PreferencesError::Forbidden(err),
            DomainError::Conflict(message) => PreferencesError::conflict(message),
            DomainError::Storage(err) => {
                tracing::error!(error = %err, "storage failure in user_preferences");
                PreferencesError::internal()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agora_security::Capability;

    #[test]
    fn forbidden_maps_without_losing_capability() {
        let err: PreferencesError = DomainError::from(CapabilityError::Denied {
            required: Capability::Administer,
        })
        .into();
        assert_eq!(
            err,
            PreferencesError::Forbidden(CapabilityError::Denied {
                required: Capability::Administer
            })
        );
    }

    #[test]
    fn storage_errors_are_opaque() {
        let err: PreferencesError = DomainError::Storage(anyhow::anyhow!("disk on fire")).into();
        assert_eq!(err, PreferencesError::Internal);
        assert!(!err.to_string().contains("disk"));
    }

    #[test]
    fn validation_keeps_field_name() {
        let err: PreferencesError = DomainError::validation("role", "unrecognized role").into();
        assert!(err.to_string().contains("role: unrecognized role"));
    }
}
