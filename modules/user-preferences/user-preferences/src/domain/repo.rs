use agora_security::Role;
use async_trait::async_trait;
use user_preferences_sdk::{Identity, IdentityProfile, SettingsRecord};
use uuid::Uuid;

/// Result of inserting a new identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    DuplicateId,
    DuplicateUsername,
    DuplicateEmail,
}

/// Identity storage port.
///
/// Settings and role have separate write paths; no method persists both.
#[async_trait]
pub trait IdentityRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<Identity>>;

    async fn insert(&self, identity: Identity) -> anyhow::Result<InsertOutcome>;

    /// Replace the settings of `id`. Returns the stored record, or `None`
    /// when the identity does not exist.
    async fn update_settings(
        &self,
        id: Uuid,
        settings: SettingsRecord,
    ) -> anyhow::Result<Option<SettingsRecord>>;

    /// Returns `false` when the identity does not exist.
    async fn update_role(&self, id: Uuid, role: Role) -> anyhow::Result<bool>;

    /// Returns `false` when the identity does not exist.
    async fn delete(&self, id: Uuid) -> anyhow::Result<bool>;

    /// Public profiles of all identities, ordered by username.
    async fn list(&self) -> anyhow::Result<Vec<IdentityProfile>>;
}
