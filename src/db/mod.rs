//! Database layer for Showcase
//!
//! Provides the MongoDB-backed identity store.

pub mod identities;
pub mod mongo;
pub mod schemas;

pub use identities::MongoIdentityStore;
pub use mongo::{is_duplicate_key, MongoClient, MongoCollection};
pub use schemas::{Metadata, UserDoc, USER_COLLECTION};
