use agora_security::{Capability, Role};
use serde::{Deserialize, Serialize};
use user_preferences_sdk::{DroppedKey, SettingsRecord, SettingsSubmission};

/// Envelope member of `PATCH /settings` that holds the patch.
pub const SETTINGS_FIELD: &str = "settings";

/// Response of a settings submission.
#[derive(Debug, Clone, Serialize)]
pub struct SubmitSettingsResponse {
    pub settings: SettingsRecord,
    /// Keys of the patch that were not applied.
    pub dropped: Vec<DroppedKey>,
    pub partial: bool,
}

impl From<SettingsSubmission> for SubmitSettingsResponse {
    fn from(s: SettingsSubmission) -> Self {
        let partial = s.is_partial();
        Self {
            settings: s.settings,
            dropped: s.dropped,
            partial,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CapabilitiesResponse {
    pub capabilities: Vec<Capability>,
}

/// Registration body. The new account's id is the authenticated subject.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterIdentityRequest {
    pub username: String,
    pub email: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChangeRoleRequest {
    /// Unknown names deserialize to `Role::Unrecognized` and are refused by
    /// the service.
    pub role: Role,
}
