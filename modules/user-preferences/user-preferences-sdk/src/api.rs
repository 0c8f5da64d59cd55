use agora_security::{Capability, Role, SecurityContext};
use async_trait::async_trait;
use uuid::Uuid;

use crate::document::MergePatch;
use crate::errors::PreferencesError;
use crate::models::{
    CapabilityCheck, IdentityProfile, NewIdentity, RoleAssignment, SettingsRecord,
    SettingsSubmission,
};

/// Public API trait for the user-preferences module.
///
/// Every call is scoped by the `SecurityContext`; the subject it names is the
/// only identity whose settings can be read or written.
#[async_trait]
pub trait UserPreferencesApi: Send + Sync {
    /// Settings of the calling identity.
    async fn get_settings(&self, ctx: &SecurityContext) -> Result<SettingsRecord, PreferencesError>;

    /// Merge `patch` into the caller's settings and persist the result.
    ///
    /// Keys that could not be applied are reported in
    /// [`SettingsSubmission::dropped`].
    async fn submit_settings(
        &self,
        ctx: &SecurityContext,
        patch: MergePatch,
    ) -> Result<SettingsSubmission, PreferencesError>;

    async fn check_capability(
        &self,
        ctx: &SecurityContext,
        capability: Capability,
    ) -> Result<CapabilityCheck, PreferencesError>;

    async fn capabilities(&self, ctx: &SecurityContext) -> Result<Vec<Capability>, PreferencesError>;

    /// Create an account with role `user` and default settings.
    async fn register_identity(&self, new: NewIdentity) -> Result<IdentityProfile, PreferencesError>;

    /// Requires `administer`.
    async fn change_role(
        &self,
        ctx: &SecurityContext,
        target: Uuid,
        role: Role,
    ) -> Result<RoleAssignment, PreferencesError>;

    /// Requires `administer`, unless the caller deletes their own account.
    async fn delete_identity(&self, ctx: &SecurityContext, target: Uuid) -> Result<(), PreferencesError>;

    /// Requires `moderate`.
    async fn list_identities(
        &self,
        ctx: &SecurityContext,
    ) -> Result<Vec<IdentityProfile>, PreferencesError>;
}
