//! Identity resolution on top of an [`IdentityStore`]
//!
//! Uniqueness is checked before insert, but the store's own constraint is
//! what settles two concurrent signups for the same name and role.

use std::sync::Arc;
use tracing::debug;

use crate::auth::{hash_pin_blocking, verify_pin_blocking, Role};
use crate::identity::{display_name, normalize_name, Identity, IdentityStore, NewIdentity};
use crate::types::{GalleryError, Result};

#[derive(Clone)]
pub struct IdentityResolver {
    store: Arc<dyn IdentityStore>,
}

impl IdentityResolver {
    pub fn new(store: Arc<dyn IdentityStore>) -> Self {
        Self { store }
    }

    /// Find the identity registered as `name` under `role`, ignoring case
    pub async fn find_by_name_role(&self, name: &str, role: Role) -> Result<Option<Identity>> {
        self.store.find_by_key(&normalize_name(name), role).await
    }

    /// Register `name` under `role` with a salted hash of `pin`
    pub async fn create(&self, name: &str, role: Role, pin: &str) -> Result<Identity> {
        let name_key = normalize_name(name);

        if self.store.find_by_key(&name_key, role).await?.is_some() {
            return Err(GalleryError::AlreadyExists(
                "User already exists. Please log in.".into(),
            ));
        }

        let pin_hash = hash_pin_blocking(pin.to_string()).await?;

        self.store
            .insert(NewIdentity {
                name: display_name(name),
                name_key,
                role,
                pin_hash,
            })
            .await
    }

    /// Check `pin` for `name` under `role`.
    ///
    /// Unknown names and wrong PINs both return `Ok(None)`.
    pub async fn verify(&self, name: &str, role: Role, pin: &str) -> Result<Option<Identity>> {
        let Some(identity) = self.find_by_name_role(name, role).await? else {
            debug!(role = %role, "Verification for unknown identity");
            return Ok(None);
        };

        if verify_pin_blocking(pin.to_string(), identity.pin_hash.clone()).await? {
            Ok(Some(identity))
        } else {
            Ok(None)
        }
    }

    /// Student names containing `fragment`
    pub async fn search_students(&self, fragment: &str, limit: usize) -> Result<Vec<String>> {
        self.store.search_students(fragment, limit).await
    }

    pub async fn ping(&self) -> Result<()> {
        self.store.ping().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::MemoryIdentityStore;

    fn resolver() -> IdentityResolver {
        IdentityResolver::new(Arc::new(MemoryIdentityStore::new()))
    }

    #[tokio::test]
    async fn test_uniqueness_is_case_insensitive_per_role() {
        let resolver = resolver();

        resolver.create("ayşe yılmaz", Role::Student, "1234").await.unwrap();

        let err = resolver
            .create("Ayşe Yılmaz", Role::Student, "5678")
            .await
            .unwrap_err();
        assert!(matches!(err, GalleryError::AlreadyExists(_)));

        let teacher = resolver.create("ayşe yılmaz", Role::Teacher, "1234").await.unwrap();
        assert_eq!(teacher.role, Role::Teacher);
    }

    #[tokio::test]
    async fn test_dotless_i_is_a_distinct_letter() {
        let resolver = resolver();

        resolver.create("Ayşe Yılmaz", Role::Student, "1234").await.unwrap();
        let other = resolver.create("Ayşe Yilmaz", Role::Student, "5678").await.unwrap();
        assert_eq!(other.name, "Ayşe Yilmaz");

        let found = resolver
            .verify("ayşe yılmaz", Role::Student, "1234")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.name, "Ayşe Yılmaz");
        assert!(resolver
            .verify("Ayşe Yilmaz", Role::Student, "1234")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_display_case_is_preserved() {
        let resolver = resolver();
        let created = resolver.create("  Ada Lovelace ", Role::Student, "1234").await.unwrap();
        assert_eq!(created.name, "Ada Lovelace");

        let found = resolver
            .find_by_name_role("ADA LOVELACE", Role::Student)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.name, "Ada Lovelace");
        assert!(resolver
            .find_by_name_role("Ada Lovelace", Role::Teacher)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_pin_is_never_stored_plain() {
        let resolver = resolver();
        let created = resolver.create("Ada Lovelace", Role::Student, "1234").await.unwrap();
        assert_ne!(created.pin_hash, "1234");
        assert!(created.pin_hash.starts_with("$argon2"));
    }

    #[tokio::test]
    async fn test_verify_does_not_distinguish_failures() {
        let resolver = resolver();
        resolver.create("John Smith", Role::Student, "1234").await.unwrap();

        let ok = resolver.verify("john smith", Role::Student, "1234").await.unwrap();
        assert_eq!(ok.unwrap().name, "John Smith");

        let wrong_pin = resolver.verify("John Smith", Role::Student, "0000").await.unwrap();
        let unknown = resolver.verify("Jane Smith", Role::Student, "1234").await.unwrap();
        let wrong_role = resolver.verify("John Smith", Role::Teacher, "1234").await.unwrap();
        assert!(wrong_pin.is_none());
        assert!(unknown.is_none());
        assert!(wrong_role.is_none());
    }

    #[tokio::test]
    async fn test_concurrent_signups_yield_one_identity() {
        let store = Arc::new(MemoryIdentityStore::new());
        let resolver = IdentityResolver::new(store.clone());

        let a = resolver.clone();
        let b = resolver.clone();
        let (first, second) = tokio::join!(
            a.create("Grace Hopper", Role::Student, "1111"),
            b.create("grace hopper", Role::Student, "2222"),
        );

        let outcomes = [first.is_ok(), second.is_ok()];
        assert_eq!(outcomes.iter().filter(|ok| **ok).count(), 1);
        let loser = if first.is_ok() { second } else { first };
        assert!(matches!(loser.unwrap_err(), GalleryError::AlreadyExists(_)));
        assert_eq!(store.len(), 1);
    }
}
