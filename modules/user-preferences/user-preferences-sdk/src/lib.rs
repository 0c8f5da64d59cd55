//! Public contract of the user-preferences module.
//!
//! - `UserPreferencesApi` - the API trait consumed by other modules
//! - `models` - identities, the closed settings schema and submission results
//! - `document` - the bounded, tagged patch document accepted from callers
//! - `errors` - transport-agnostic error types

pub mod api;
pub mod document;
pub mod errors;
pub mod models;

pub use api::UserPreferencesApi;
pub use document::{DocumentLimits, MergePatch, PatchObject, PatchValue};
pub use errors::{MergeError, PreferencesError};
pub use models::{
    CapabilityCheck, DigestFrequency, DropReason, DroppedKey, Identity, IdentityProfile,
    NewIdentity, NotificationSettings, PrivacySettings, ProfileVisibility, RoleAssignment,
    SettingsRecord, SettingsSubmission, Theme,
};
