//! Database schemas for Showcase
//!
//! Defines MongoDB document structures for registered identities.

mod metadata;
mod user;

pub use metadata::Metadata;
pub use user::{UserDoc, USER_COLLECTION};
