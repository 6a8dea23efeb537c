//! MongoDB-backed [`IdentityStore`]

use bson::doc;
use tracing::warn;

use crate::auth::Role;
use crate::db::mongo::{is_duplicate_key, MongoClient, MongoCollection};
use crate::db::schemas::{UserDoc, USER_COLLECTION};
use crate::identity::{Identity, IdentityStore, NewIdentity};
use crate::types::{GalleryError, Result};

/// Identity store over the `users` collection
pub struct MongoIdentityStore {
    mongo: MongoClient,
    users: MongoCollection<UserDoc>,
}

impl MongoIdentityStore {
    /// Open the users collection, creating its indexes
    pub async fn new(mongo: MongoClient) -> Result<Self> {
        let users = mongo.collection::<UserDoc>(USER_COLLECTION).await?;
        Ok(Self { mongo, users })
    }
}

#[async_trait::async_trait]
impl IdentityStore for MongoIdentityStore {
    async fn find_by_key(&self, name_key: &str, role: Role) -> Result<Option<Identity>> {
        let found = self
            .users
            .find_one(doc! { "name_key": name_key, "role": role.as_str() })
            .await?;
        Ok(found.map(UserDoc::into_identity))
    }

    async fn insert(&self, identity: NewIdentity) -> Result<Identity> {
        let doc = UserDoc::new(identity);
        let stored = doc.clone().into_identity();

        match self.users.insert_one(doc).await {
            Ok(()) => Ok(stored),
            Err(e) if is_duplicate_key(&e) => {
                warn!(role = %stored.role, "Concurrent signup lost the unique-index race");
                Err(GalleryError::AlreadyExists(
                    "User already exists. Please log in.".into(),
                ))
            }
            Err(e) => Err(GalleryError::UpstreamFailure(format!("Insert failed: {}", e))),
        }
    }

    async fn search_students(&self, fragment: &str, limit: usize) -> Result<Vec<String>> {
        let filter = doc! {
            "role": Role::Student.as_str(),
            "name": { "$regex": regex::escape(fragment), "$options": "i" },
        };

        let users = self
            .users
            .find_many(filter, doc! { "name": 1 }, limit as i64)
            .await?;

        Ok(users
            .into_iter()
            .map(|user| user.name)
            .filter(|name| !name.is_empty())
            .collect())
    }

    async fn ping(&self) -> Result<()> {
        self.mongo.ping().await
    }
}
