//! User document schema
//!
//! One document per (name, role) identity.

use bson::{doc, oid::ObjectId, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::auth::Role;
use crate::db::mongo::{IntoIndexes, MutMetadata};
use crate::db::schemas::Metadata;
use crate::identity::{Identity, NewIdentity};

/// Collection name for users
pub const USER_COLLECTION: &str = "users";

/// User document stored in MongoDB
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct UserDoc {
    /// MongoDB document ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,

    /// Common metadata (created_at, updated_at, is_deleted)
    #[serde(default)]
    pub metadata: Metadata,

    /// Display name as typed at signup
    pub name: String,

    /// Normalized lookup key for `name`
    pub name_key: String,

    pub role: Role,

    /// Argon2 PIN hash
    pub pin_hash: String,
}

impl UserDoc {
    /// Create a new user document
    pub fn new(identity: NewIdentity) -> Self {
        Self {
            _id: None,
            metadata: Metadata::default(),
            name: identity.name,
            name_key: identity.name_key,
            role: identity.role,
            pin_hash: identity.pin_hash,
        }
    }

    pub fn into_identity(self) -> Identity {
        Identity {
            name: self.name,
            role: self.role,
            pin_hash: self.pin_hash,
        }
    }
}

impl IntoIndexes for UserDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![
            // One identity per normalized name within a role
            (
                doc! { "name_key": 1, "role": 1 },
                Some(
                    IndexOptions::builder()
                        .unique(true)
                        .name("name_key_role_unique".to_string())
                        .build(),
                ),
            ),
            // Student search by display name
            (
                doc! { "role": 1, "name": 1 },
                Some(
                    IndexOptions::builder()
                        .name("role_name_index".to_string())
                        .build(),
                ),
            ),
        ]
    }
}

impl MutMetadata for UserDoc {
    fn mut_metadata(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::normalize_name;

    #[test]
    fn test_round_trip_through_bson() {
        let doc = UserDoc::new(NewIdentity {
            name: "Ayşe Yılmaz".into(),
            name_key: normalize_name("Ayşe Yılmaz"),
            role: Role::Teacher,
            pin_hash: "$argon2id$v=19$stub".into(),
        });

        let encoded = bson::to_document(&doc).unwrap();
        assert_eq!(encoded.get_str("role").unwrap(), "teacher");
        assert_eq!(encoded.get_str("name").unwrap(), "Ayşe Yılmaz");
        assert!(encoded.get("_id").is_none());

        let decoded: UserDoc = bson::from_document(encoded).unwrap();
        let identity = decoded.into_identity();
        assert_eq!(identity.name, "Ayşe Yılmaz");
        assert_eq!(identity.role, Role::Teacher);
    }

    #[test]
    fn test_unique_index_covers_key_and_role() {
        let indices = UserDoc::into_indices();
        let (keys, options) = &indices[0];
        assert!(keys.contains_key("name_key"));
        assert!(keys.contains_key("role"));
        assert_eq!(options.as_ref().and_then(|o| o.unique), Some(true));
    }
}
