//! In-memory identity store for dev mode and tests

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use crate::auth::Role;
use crate::identity::{normalize_name, Identity, IdentityStore, NewIdentity};
use crate::types::{GalleryError, Result};

/// Identities keyed by (normalized name, role)
#[derive(Default)]
pub struct MemoryIdentityStore {
    identities: DashMap<(String, Role), Identity>,
}

impl MemoryIdentityStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.identities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.identities.is_empty()
    }
}

#[async_trait::async_trait]
impl IdentityStore for MemoryIdentityStore {
    async fn find_by_key(&self, name_key: &str, role: Role) -> Result<Option<Identity>> {
        Ok(self
            .identities
            .get(&(name_key.to_string(), role))
            .map(|entry| entry.value().clone()))
    }

    async fn insert(&self, identity: NewIdentity) -> Result<Identity> {
        match self.identities.entry((identity.name_key, identity.role)) {
            Entry::Occupied(_) => Err(GalleryError::AlreadyExists(
                "User already exists. Please log in.".into(),
            )),
            Entry::Vacant(slot) => {
                let stored = Identity {
                    name: identity.name,
                    role: identity.role,
                    pin_hash: identity.pin_hash,
                };
                slot.insert(stored.clone());
                Ok(stored)
            }
        }
    }

    async fn search_students(&self, fragment: &str, limit: usize) -> Result<Vec<String>> {
        let needle = normalize_name(fragment);
        let mut names: Vec<String> = self
            .identities
            .iter()
            .filter(|entry| entry.key().1 == Role::Student && entry.key().0.contains(&needle))
            .map(|entry| entry.value().name.clone())
            .collect();
        names.sort();
        names.truncate(limit);
        Ok(names)
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}
