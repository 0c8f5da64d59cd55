//! Domain service for the user-preferences module.

use std::sync::Arc;

use agora_security::{
    Capability, CapabilityToken, Role, SecurityContext, resolve_capabilities,
};
use user_preferences_sdk::{
    CapabilityCheck, DocumentLimits, DropReason, Identity, IdentityProfile, MergeError,
    MergePatch, NewIdentity, RoleAssignment, SettingsRecord, SettingsSubmission,
};
use uuid::Uuid;

use super::error::DomainError;
use super::merge::{self, MergeRules};
use super::repo::{IdentityRepository, InsertOutcome};

const USERNAME_MIN_LEN: usize = 3;
const USERNAME_MAX_LEN: usize = 32;
const EMAIL_MAX_LEN: usize = 254;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ServiceConfig {
    pub limits: DocumentLimits,
    pub rules: MergeRules,
    pub reject_dropped_keys: bool,
}

/// Settings submission and capability-gated account operations.
///
/// Capabilities are always resolved from the stored identity of the caller,
/// through one private resolution point, never from anything the caller sends.
pub struct Service {
    repo: Arc<dyn IdentityRepository>,
    config: ServiceConfig,
}

impl Service {
    #[must_use]
    pub fn new(repo: Arc<dyn IdentityRepository>, config: ServiceConfig) -> Self {
        Self { repo, config }
    }

    /// Bounds that callers must apply when building a `MergePatch`.
    #[must_use]
    pub fn limits(&self) -> DocumentLimits {
        self.config.limits
    }

    /// Settings of the calling identity.
    ///
    /// # Errors
    /// `NotFound` when the caller has no identity.
    pub async fn get_settings(&self, ctx: &SecurityContext) -> Result<SettingsRecord, DomainError> {
        let identity = self.caller(ctx).await?.ok_or(DomainError::NotFound)?;
        Ok(identity.settings)
    }

    /// Merge `patch` into the caller's settings and persist the result.
    ///
    /// Only the settings are written back; the stored role is untouched
    /// whatever the patch contains.
    ///
    /// # Errors
    /// `NotFound` when the caller has no identity, `Merge` when the patch is
    /// malformed or, in strict mode, when any key would be dropped.
    pub async fn submit_settings(
        &self,
        ctx: &SecurityContext,
        patch: &MergePatch,
    ) -> Result<SettingsSubmission, DomainError> {
        let identity = self.caller(ctx).await?.ok_or(DomainError::NotFound)?;
        let outcome = merge::merge(&identity.settings, patch, &self.config.rules)?;

        let reserved = outcome
            .dropped
            .iter()
            .filter(|d| d.reason == DropReason::Reserved)
            .count();
        if reserved > 0 {
            tracing::warn!(
                subject_id = %identity.id,
                reserved,
                "settings patch contained reserved keys"
            );
        }

        if self.config.reject_dropped_keys && !outcome.dropped.is_empty() {
            tracing::info!(
                subject_id = %identity.id,
                dropped = outcome.dropped.len(),
                "settings patch rejected in strict mode"
            );
            return Err(MergeError::KeyRejected {
                keys: outcome.dropped,
            }
            .into());
        }

        let settings = self
            .repo
            .update_settings(identity.id, outcome.settings)
            .await?
            .ok_or(DomainError::NotFound)?;

        tracing::info!(
            subject_id = %identity.id,
            dropped = outcome.dropped.len(),
            "settings updated"
        );

        Ok(SettingsSubmission {
            settings,
            dropped: outcome.dropped,
        })
    }

    /// Whether the caller holds `capability`. An unknown caller holds nothing.
    ///
    /// # Errors
    /// Storage failures only.
    pub async fn check_capability(
        &self,
        ctx: &SecurityContext,
        capability: Capability,
    ) -> Result<CapabilityCheck, DomainError> {
        let token = self.token(ctx).await?;
        let allowed = token.allows(capability);
        tracing::debug!(subject_id = %ctx.subject_id(), %capability, allowed, "capability check");
        Ok(CapabilityCheck {
            capability,
            allowed,
        })
    }

    /// All capabilities the caller holds.
    ///
    /// # Errors
    /// Storage failures only.
    pub async fn capabilities(&self, ctx: &SecurityContext) -> Result<Vec<Capability>, DomainError> {
        Ok(self.token(ctx).await?.capabilities().to_vec())
    }

    /// Create an account with role `user` and default settings.
    ///
    /// # Errors
    /// `Validation` for a bad username or email, `Conflict` when the id,
    /// username or email is taken.
    pub async fn register_identity(&self, new: NewIdentity) -> Result<IdentityProfile, DomainError> {
        let identity = Self::build_identity(new)?;
        self.insert(identity).await
    }

    /// Create an account with a preassigned role.
    ///
    /// Used only by trusted bootstrap code; there is no API route to it.
    ///
    /// # Errors
    /// Same as [`Service::register_identity`], plus `Validation` for an
    /// unrecognized role.
    pub async fn bootstrap_identity(
        &self,
        new: NewIdentity,
        role: Role,
    ) -> Result<IdentityProfile, DomainError> {
        if !role.is_recognized() {
            return Err(DomainError::validation("role", "unrecognized role"));
        }
        let mut identity = Self::build_identity(new)?;
        identity.role = role;
        self.insert(identity).await
    }

    /// Change the role of `target`. Requires `administer`.
    ///
    /// # Errors
    /// `Forbidden` without `administer`, `Validation` for an unrecognized
    /// role, `NotFound` when the target does not exist.
    pub async fn change_role(
        &self,
        ctx: &SecurityContext,
        target: Uuid,
        role: Role,
    ) -> Result<RoleAssignment, DomainError> {
        let token = self.token(ctx).await?;
        self.assign_role(token, target, role).await?;
        tracing::info!(subject_id = %ctx.subject_id(), target = %target, "role changed");
        Ok(RoleAssignment { id: target, role })
    }

    /// Delete `target`. Requires `administer` unless the caller deletes
    /// their own account.
    ///
    /// # Errors
    /// `Forbidden` without `administer`, `NotFound` when the target does not exist.
    pub async fn delete_identity(&self, ctx: &SecurityContext, target: Uuid) -> Result<(), DomainError> {
        let is_self = !ctx.is_anonymous() && ctx.subject_id() == target;
        if !is_self {
            self.token(ctx).await?.require(Capability::Administer)?;
        }
        if !self.repo.delete(target).await? {
            return Err(DomainError::NotFound);
        }
        tracing::info!(subject_id = %ctx.subject_id(), target = %target, "identity deleted");
        Ok(())
    }

    /// Public profiles of all identities. Requires `moderate`.
    ///
    /// # Errors
    /// `Forbidden` without `moderate`.
    pub async fn list_identities(
        &self,
        ctx: &SecurityContext,
    ) -> Result<Vec<IdentityProfile>, DomainError> {
        self.token(ctx).await?.require(Capability::Moderate)?;
        Ok(self.repo.list().await?)
    }

    async fn assign_role(
        &self,
        token: CapabilityToken,
        target: Uuid,
        role: Role,
    ) -> Result<(), DomainError> {
        token.require(Capability::Administer)?;
        if !role.is_recognized() {
            return Err(DomainError::validation("role", "unrecognized role"));
        }
        if !self.repo.update_role(target, role).await? {
            return Err(DomainError::NotFound);
        }
        Ok(())
    }

    async fn caller(&self, ctx: &SecurityContext) -> Result<Option<Identity>, DomainError> {
        if ctx.is_anonymous() {
            return Ok(None);
        }
        Ok(self.repo.find_by_id(ctx.subject_id()).await?)
    }

    async fn token(&self, ctx: &SecurityContext) -> Result<CapabilityToken, DomainError> {
        let caller = self.caller(ctx).await?;
        Ok(Self::capabilities_for(caller.as_ref()))
    }

    /// The single capability resolution point of the service.
    fn capabilities_for(identity: Option<&Identity>) -> CapabilityToken {
        identity.map_or_else(CapabilityToken::none, resolve_capabilities)
    }

    async fn insert(&self, identity: Identity) -> Result<IdentityProfile, DomainError> {
        let profile = identity.profile();
        match self.repo.insert(identity).await? {
            InsertOutcome::Inserted => {
                tracing::info!(subject_id = %profile.id, "identity registered");
                Ok(profile)
            }
            InsertOutcome::DuplicateId => Err(DomainError::conflict("identity already exists")),
            InsertOutcome::DuplicateUsername => Err(DomainError::conflict("username is taken")),
            InsertOutcome::DuplicateEmail => Err(DomainError::conflict("email is already registered")),
        }
    }

    fn build_identity(new: NewIdentity) -> Result<Identity, DomainError> {
        let username = new.username.trim();
        let email = new.email.trim();
        Self::validate_username(username)?;
        Self::validate_email(email)?;
        let id = new.id.unwrap_or_else(Uuid::new_v4);
        if id.is_nil() {
            return Err(DomainError::validation("id", "must not be nil"));
        }
        Ok(Identity::new(id, username, email))
    }

    fn validate_username(username: &str) -> Result<(), DomainError> {
        if !(USERNAME_MIN_LEN..=USERNAME_MAX_LEN).contains(&username.len()) {
            return Err(DomainError::validation(
                "username",
                format!("must be {USERNAME_MIN_LEN}-{USERNAME_MAX_LEN} characters"),
            ));
        }
        if !username
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return Err(DomainError::validation(
                "username",
                "may contain only letters, digits, '_' and '-'",
            ));
        }
        Ok(())
    }

    fn validate_email(email: &str) -> Result<(), DomainError> {
        let well_formed = email.len() <= EMAIL_MAX_LEN
            && email
                .split_once('@')
                .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.'));
        if well_formed {
            Ok(())
        } else {
            Err(DomainError::validation("email", "not a valid address"))
        }
    }
}
