//! Configuration for the user-preferences module.

use serde::{Deserialize, Serialize};
use user_preferences_sdk::DocumentLimits;

use crate::domain::merge::MergeRules;
use crate::domain::service::ServiceConfig;

/// Configuration for the user-preferences module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct UserPreferencesConfig {
    /// Maximum nesting depth of a settings patch; the root object is depth 1.
    pub max_depth: usize,
    /// Maximum entries per object and elements per array.
    pub max_keys_per_level: usize,
    /// Maximum size of a serialized patch in bytes.
    pub max_document_bytes: usize,
    /// Maximum length of a single string inside a list setting.
    pub max_string_length: usize,
    /// Maximum number of elements in a list setting.
    pub max_list_length: usize,
    /// Fail the whole submission instead of dropping keys that cannot be applied.
    pub reject_dropped_keys: bool,
}

impl Default for UserPreferencesConfig {
    fn default() -> Self {
        let limits = DocumentLimits::default();
        let rules = MergeRules::default();
        Self {
            max_depth: limits.max_depth,
            max_keys_per_level: limits.max_keys_per_level,
            max_document_bytes: limits.max_document_bytes,
            max_string_length: rules.max_string_length,
            max_list_length: rules.max_list_length,
            reject_dropped_keys: false,
        }
    }
}

impl UserPreferencesConfig {
    #[must_use]
    pub fn limits(&self) -> DocumentLimits {
        DocumentLimits {
            max_document_bytes: self.max_document_bytes,
            max_depth: self.max_depth,
            max_keys_per_level: self.max_keys_per_level,
        }
    }

    #[must_use]
    pub fn rules(&self) -> MergeRules {
        MergeRules {
            max_string_length: self.max_string_length,
            max_list_length: self.max_list_length,
        }
    }

    #[must_use]
    pub fn service_config(&self) -> ServiceConfig {
        ServiceConfig {
            limits: self.limits(),
            rules: self.rules(),
            reject_dropped_keys: self.reject_dropped_keys,
        }
    }

    /// Check that every bound is usable.
    ///
    /// # Errors
    /// Returns an error naming the first bound that is zero. A zero
    /// `max_depth` would reject every document, including `{}`.
    pub fn validate(&self) -> anyhow::Result<()> {
        let bounds = [
            ("max_depth", self.max_depth),
            ("max_keys_per_level", self.max_keys_per_level),
            ("max_document_bytes", self.max_document_bytes),
            ("max_string_length", self.max_string_length),
            ("max_list_length", self.max_list_length),
        ];
        if let Some((name, _)) = bounds.iter().find(|(_, value)| *value == 0) {
            anyhow::bail!("user_preferences.{name} must be greater than zero");
        }
        Ok(())
    }
}
