//! Composition of the user-preferences module.

use std::sync::Arc;

use agora_security::Role;
use axum::Router;
use user_preferences_sdk::{IdentityProfile, NewIdentity, UserPreferencesApi};

use crate::api::rest::routes;
use crate::config::UserPreferencesConfig;
use crate::domain::error::DomainError;
use crate::domain::repo::IdentityRepository;
use crate::domain::service::Service;
use crate::infra::InMemoryIdentityRepository;
use crate::local_client::UserPreferencesLocalClient;

/// The wired module: one service shared by the REST routes and the local client.
pub struct UserPreferencesModule {
    service: Arc<Service>,
}

impl UserPreferencesModule {
    /// Wire the module over the given repository.
    ///
    /// # Errors
    /// Returns an error when the configuration is invalid.
    pub fn new(config: &UserPreferencesConfig, repo: Arc<dyn IdentityRepository>) -> anyhow::Result<Self> {
        config.validate()?;
        let service = Arc::new(Service::new(repo, config.service_config()));
        tracing::debug!(
            max_depth = config.max_depth,
            max_keys_per_level = config.max_keys_per_level,
            max_document_bytes = config.max_document_bytes,
            strict = config.reject_dropped_keys,
            "user_preferences module initialized"
        );
        Ok(Self { service })
    }

    /// Wire the module over a fresh in-memory store.
    ///
    /// # Errors
    /// Returns an error when the configuration is invalid.
    pub fn in_memory(config: &UserPreferencesConfig) -> anyhow::Result<Self> {
        Self::new(config, Arc::new(InMemoryIdentityRepository::new()))
    }

    #[must_use]
    pub fn client(&self) -> Arc<dyn UserPreferencesApi> {
        Arc::new(UserPreferencesLocalClient::new(Arc::clone(&self.service)))
    }

    /// REST routes; the caller adds the authentication layer.
    #[must_use]
    pub fn router(&self) -> Router {
        routes::router(Arc::clone(&self.service))
    }

    /// Create an account with a preassigned role from trusted configuration.
    ///
    /// # Errors
    /// Fails on invalid data, an unrecognized role or a duplicate account.
    pub async fn seed_identity(&self, new: NewIdentity, role: Role) -> Result<IdentityProfile, DomainError> {
        self.service.bootstrap_identity(new, role).await
    }
}
