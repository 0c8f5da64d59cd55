//! Local client implementing the `UserPreferencesApi` trait.

use std::sync::Arc;

use agora_security::{Capability, Role, SecurityContext};
use async_trait::async_trait;
use user_preferences_sdk::{
    CapabilityCheck, IdentityProfile, MergePatch, NewIdentity, PreferencesError, RoleAssignment,
    SettingsRecord, SettingsSubmission, UserPreferencesApi,
};
use uuid::Uuid;

use crate::domain::service::Service;

/// In-process client that delegates to the domain service.
pub struct UserPreferencesLocalClient {
    service: Arc<Service>,
}

impl UserPreferencesLocalClient {
    #[must_use]
    pub fn new(service: Arc<Service>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl UserPreferencesApi for UserPreferencesLocalClient {
    async fn get_settings(&self, ctx: &SecurityContext) -> Result<SettingsRecord, PreferencesError> {
        self.service.get_settings(ctx).await.map_err(Into::into)
    }

    async fn submit_settings(
        &self,
        ctx: &SecurityContext,
        patch: MergePatch,
    ) -> Result<SettingsSubmission, PreferencesError> {
        self.service
            .submit_settings(ctx, &patch)
            .await
            .map_err(Into::into)
    }

    async fn check_capability(
        &self,
        ctx: &SecurityContext,
        capability: Capability,
    ) -> Result<CapabilityCheck, PreferencesError> {
        self.service
            .check_capability(ctx, capability)
            .await
            .map_err(Into::into)
    }

    async fn capabilities(&self, ctx: &SecurityContext) -> Result<Vec<Capability>, PreferencesError> {
        self.service.capabilities(ctx).await.map_err(Into::into)
    }

    async fn register_identity(&self, new: NewIdentity) -> Result<IdentityProfile, PreferencesError> {
        self.service.register_identity(new).await.map_err(Into::into)
    }

    async fn change_role(
        &self,
        ctx: &SecurityContext,
        target: Uuid,
        role: Role,
    ) -> Result<RoleAssignment, PreferencesError> {
        self.service
            .change_role(ctx, target, role)
            .await
            .map_err(Into::into)
    }

    async fn delete_identity(&self, ctx: &SecurityContext, target: Uuid) -> Result<(), PreferencesError> {
        self.service
            .delete_identity(ctx, target)
            .await
            .map_err(Into::into)
    }

    async fn list_identities(
        &self,
        ctx: &SecurityContext,
    ) -> Result<Vec<IdentityProfile>, PreferencesError> {
        self.service.list_identities(ctx).await.map_err(Into::into)
    }
}
