//! In-memory identity store.

use agora_security::Role;
use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use user_preferences_sdk::{Identity, IdentityProfile, SettingsRecord};
use uuid::Uuid;

use crate::domain::repo::{IdentityRepository, InsertOutcome};

/// Identity store backed by concurrent hash maps.
///
/// Every write touches a single identity entry, so concurrent writers for
/// different identities never contend and the last writer for the same
/// identity wins. Usernames and emails are unique case-insensitively.
#[derive(Default)]
pub struct InMemoryIdentityRepository {
    identities: DashMap<Uuid, Identity>,
    usernames: DashMap<String, Uuid>,
    emails: DashMap<String, Uuid>,
}

impl InMemoryIdentityRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn index_key(value: &str) -> String {
        value.to_lowercase()
    }
}

#[async_trait]
impl IdentityRepository for InMemoryIdentityRepository {
    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<Identity>> {
        Ok(self.identities.get(&id).map(|entry| entry.value().clone()))
    }

    async fn insert(&self, identity: Identity) -> anyhow::Result<InsertOutcome> {
        let Entry::Vacant(slot) = self.identities.entry(identity.id) else {
            return Ok(InsertOutcome::DuplicateId);
        };

        let username_key = Self::index_key(&identity.username);
        match self.usernames.entry(username_key.clone()) {
            Entry::Occupied(_) => return Ok(InsertOutcome::DuplicateUsername),
            Entry::Vacant(v) => {
                v.insert(identity.id);
            }
        }

        match self.emails.entry(Self::index_key(&identity.email)) {
            Entry::Occupied(_) => {
                self.usernames.remove(&username_key);
                return Ok(InsertOutcome::DuplicateEmail);
            }
            Entry::Vacant(v) => {
                v.insert(identity.id);
            }
        }

        slot.insert(identity);
        Ok(InsertOutcome::Inserted)
    }

    async fn update_settings(
        &self,
        id: Uuid,
        settings: SettingsRecord,
    ) -> anyhow::Result<Option<SettingsRecord>> {
        Ok(self.identities.get_mut(&id).map(|mut entry| {
            entry.settings = settings;
            entry.settings.clone()
        }))
    }

    async fn update_role(&self, id: Uuid, role: Role) -> anyhow::Result<bool> {
        let Some(mut entry) = self.identities.get_mut(&id) else {
            return Ok(false);
        };
        entry.role = role;
        Ok(true)
    }

    async fn delete(&self, id: Uuid) -> anyhow::Result<bool> {
        let Some((_, identity)) = self.identities.remove(&id) else {
            return Ok(false);
        };
        self.usernames.remove(&Self::index_key(&identity.username));
        self.emails.remove(&Self::index_key(&identity.email));
        Ok(true)
    }

    async fn list(&self) -> anyhow::Result<Vec<IdentityProfile>> {
        let mut profiles: Vec<IdentityProfile> = self
            .identities
            .iter()
            .map(|entry| entry.value().profile())
            .collect();
        profiles.sort_by(|a, b| a.username.cmp(&b.username));
        Ok(profiles)
    }
}
