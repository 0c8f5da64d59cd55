//! Error types for the user-preferences SDK.

use agora_security::CapabilityError;
use thiserror::Error;

use crate::models::DroppedKey;

/// Path used in errors that concern the document root.
pub const ROOT_PATH: &str = "$";

/// A settings patch could not be accepted.
///
/// Every variant is a client error; the stored record is untouched whenever
/// one is returned.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MergeError {
    #[error("document is {size} bytes, limit is {max}")]
    TooLarge { size: usize, max: usize },

    #[error("document nesting exceeds the maximum depth of {max_depth}")]
    TooDeep { max_depth: usize },

    #[error("'{path}' has more than {max_keys} entries")]
    TooWide { path: String, max_keys: usize },

    #[error("malformed document at '{path}': {message}")]
    MalformedDocument { path: String, message: String },

    #[error("patch contains {} key(s) that cannot be applied", keys.len())]
    KeyRejected { keys: Vec<DroppedKey> },
}

impl MergeError {
    #[must_use]
    pub fn malformed(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::MalformedDocument {
            path: path.into(),
            message: message.into(),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PreferencesError {
    #[error("Identity not found")]
    NotFound,

    #[error("Invalid settings document: {0}")]
    InvalidDocument(#[from] MergeError),

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error(transparent)]
    Forbidden(#[from] CapabilityError),

    #[error("Conflict: {message}")]
    Conflict { message: String },

    #[error("Internal error")]
    Internal,
}

impl PreferencesError {
    #[must_use]
    pub fn not_found() -> Self {
        Self::NotFound
    }

    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn internal() -> Self {
        Self::Internal
    }
}
