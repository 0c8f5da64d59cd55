//! User preferences module implementation
//!
//! The public API is defined in `user-preferences-sdk` and re-exported here.

pub use user_preferences_sdk::{
    MergePatch, PreferencesError, SettingsRecord, SettingsSubmission, UserPreferencesApi,
};

pub mod module;
pub use module::UserPreferencesModule;

pub mod local_client;

#[doc(hidden)]
pub mod api;
#[doc(hidden)]
pub mod config;
#[doc(hidden)]
pub mod domain;
#[doc(hidden)]
pub mod errors;
#[doc(hidden)]
pub mod infra;

pub use config::UserPreferencesConfig;
