//! Named identities
//!
//! People are identified by their full name within a role. The
//! [`IdentityResolver`] enforces the name rules and PIN handling on top of
//! an [`IdentityStore`], which is either MongoDB
//! ([`crate::db::MongoIdentityStore`]) or the in-memory
//! [`MemoryIdentityStore`] used in dev mode and tests.

pub mod memory;
pub mod name;
pub mod resolver;

pub use memory::MemoryIdentityStore;
pub use name::{display_name, is_valid_full_name, normalize_name, INVALID_NAME_MESSAGE};
pub use resolver::IdentityResolver;

use crate::auth::Role;
use crate::types::Result;

/// Maximum names returned by a student search
pub const SEARCH_LIMIT: usize = 10;

/// A person registered under one role
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    /// Display name, trimmed, casing as typed at signup
    pub name: String,
    pub role: Role,
    /// Argon2 PHC string
    pub pin_hash: String,
}

/// Identity as handed to a store for insertion
#[derive(Debug, Clone)]
pub struct NewIdentity {
    pub name: String,
    /// Output of [`normalize_name`] for `name`
    pub name_key: String,
    pub role: Role,
    pub pin_hash: String,
}

/// Persistence seam for identities
///
/// Stores must reject a second insert for the same (`name_key`, `role`)
/// with [`crate::GalleryError::AlreadyExists`], even under concurrent inserts.
#[async_trait::async_trait]
pub trait IdentityStore: Send + Sync {
    /// Look up by normalized name and role
    async fn find_by_key(&self, name_key: &str, role: Role) -> Result<Option<Identity>>;

    /// Persist a new identity
    async fn insert(&self, identity: NewIdentity) -> Result<Identity>;

    /// Student display names containing `fragment`, case-insensitively
    async fn search_students(&self, fragment: &str, limit: usize) -> Result<Vec<String>>;

    /// Connectivity check for readiness probes
    async fn ping(&self) -> Result<()>;
}
