//! Public models for the user-preferences module.
//!
//! Settings are a closed schema: every field a caller can influence is
//! declared here, and nothing else exists to be written to.

use std::fmt;

use agora_security::{Capability, Role, RoleHolder};
use serde::Serialize;
use uuid::Uuid;

/// An account as owned by the account subsystem.
///
/// `role` is written only through the role-change operation; the settings
/// path persists `settings` alone.
#[derive(Clone, PartialEq, Eq)]
pub struct Identity {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub role: Role,
    pub settings: SettingsRecord,
}

impl Identity {
    /// New account with role `user` and default settings.
    #[must_use]
    pub fn new(id: Uuid, username: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id,
            username: username.into(),
            email: email.into(),
            role: Role::User,
            settings: SettingsRecord::default(),
        }
    }

    #[must_use]
    pub fn profile(&self) -> IdentityProfile {
        IdentityProfile {
            id: self.id,
            username: self.username.clone(),
        }
    }
}

// Role, email and settings stay out of logs.
impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Identity")
            .field("id", &self.id)
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

impl RoleHolder for Identity {
    fn role(&self) -> Role {
        self.role
    }
}

/// Data for registering a new account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewIdentity {
    pub id: Option<Uuid>,
    pub username: String,
    pub email: String,
}

/// Public view of an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IdentityProfile {
    pub id: Uuid,
    pub username: String,
}

/// Result of a role change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoleAssignment {
    pub id: Uuid,
    pub role: Role,
}

/// Result of a capability check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CapabilityCheck {
    pub capability: Capability,
    pub allowed: bool,
}

// ============================================================================
// Settings schema
// ============================================================================

/// Per-owner preference tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SettingsRecord {
    pub theme: Theme,
    pub language: String,
    pub notifications: NotificationSettings,
    pub privacy: PrivacySettings,
}

impl SettingsRecord {
    pub const THEME: &'static str = "theme";
    pub const LANGUAGE: &'static str = "language";
    pub const NOTIFICATIONS: &'static str = "notifications";
    pub const PRIVACY: &'static str = "privacy";

    /// Recognized top-level keys.
    pub const FIELDS: [&'static str; 4] = [
        Self::THEME,
        Self::LANGUAGE,
        Self::NOTIFICATIONS,
        Self::PRIVACY,
    ];
}

impl Default for SettingsRecord {
    fn default() -> Self {
        Self {
            theme: Theme::default(),
            language: "en".to_owned(),
            notifications: NotificationSettings::default(),
            privacy: PrivacySettings::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NotificationSettings {
    pub email: bool,
    pub push: bool,
    pub mentions: bool,
    pub digest: DigestFrequency,
    pub muted_topics: Vec<String>,
}

impl NotificationSettings {
    pub const EMAIL: &'static str = "email";
    pub const PUSH: &'static str = "push";
    pub const MENTIONS: &'static str = "mentions";
    pub const DIGEST: &'static str = "digest";
    pub const MUTED_TOPICS: &'static str = "muted_topics";
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            email: true,
            push: false,
            mentions: true,
            digest: DigestFrequency::default(),
            muted_topics: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PrivacySettings {
    pub profile_visibility: ProfileVisibility,
    pub show_online_status: bool,
    pub allow_direct_messages: bool,
}

impl PrivacySettings {
    pub const PROFILE_VISIBILITY: &'static str = "profile_visibility";
    pub const SHOW_ONLINE_STATUS: &'static str = "show_online_status";
    pub const ALLOW_DIRECT_MESSAGES: &'static str = "allow_direct_messages";
}

impl Default for PrivacySettings {
    fn default() -> Self {
        Self {
            profile_visibility: ProfileVisibility::default(),
            show_online_status: true,
            allow_direct_messages: true,
        }
    }
}

macro_rules! settings_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $text:literal),+ $(,)? } default $default:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($variant,)+
        }

        impl $name {
            /// Exact, case-sensitive match on the wire name.
            #[must_use]
            pub fn parse(raw: &str) -> Option<Self> {
                match raw {
                    $($text => Some(Self::$variant),)+
                    _ => None,
                }
            }

            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $text,)+
                }
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::$default
            }
        }
    };
}

settings_enum!(
    /// Display theme.
    Theme { Light => "light", Dark => "dark", System => "system" } default System
);

settings_enum!(
    /// How often activity digests are emailed.
    DigestFrequency { Off => "off", Daily => "daily", Weekly => "weekly" } default Weekly
);

settings_enum!(
    /// Who can see the owner's profile.
    ProfileVisibility { Public => "public", Members => "members", Private => "private" } default Members
);

// ============================================================================
// Submission result
// ============================================================================

/// Why a patch key was not applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DropReason {
    /// Structural/meta key from the rejection set.
    Reserved,
    /// Not a declared field at this position.
    NotAllowed,
    /// Declared field, but the value has the wrong type or fails validation.
    InvalidValue,
}

impl DropReason {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Reserved => "reserved",
            Self::NotAllowed => "not_allowed",
            Self::InvalidValue => "invalid_value",
        }
    }
}

/// A patch key that was ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DroppedKey {
    /// Dotted path of the key within the patch, e.g. `notifications.digest`.
    pub path: String,
    pub reason: DropReason,
}

/// Accepted settings plus every key that was not applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SettingsSubmission {
    pub settings: SettingsRecord,
    pub dropped: Vec<DroppedKey>,
}

impl SettingsSubmission {
    #[must_use]
    pub fn is_partial(&self) -> bool {
        !self.dropped.is_empty()
    }

    pub fn dropped_paths(&self) -> impl Iterator<Item = &str> {
        self.dropped.iter().map(|d| d.path.as_str())
    }
}
