//! In-memory asset repository for dev mode and tests

use chrono::Utc;
use dashmap::DashMap;

use crate::assets::{AssetRecord, AssetRepository, DestroyOutcome, NewAsset, ResourceKind};
use crate::types::{GalleryError, Result};

/// Assets keyed by (public id, kind); file bytes are only counted
pub struct MemoryAssetRepository {
    folder: String,
    base_url: String,
    assets: DashMap<(String, ResourceKind), AssetRecord>,
}

impl MemoryAssetRepository {
    pub fn new(folder: impl Into<String>) -> Self {
        Self {
            folder: folder.into(),
            base_url: "http://localhost/assets".to_string(),
            assets: DashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    /// Put a record in place as-is, e.g. one carrying a legacy context
    pub fn insert_record(&self, record: AssetRecord) {
        self.assets
            .insert((record.public_id.clone(), record.resource_kind), record);
    }
}

impl Default for MemoryAssetRepository {
    fn default() -> Self {
        Self::new("steam4all")
    }
}

fn format_of(asset: &NewAsset) -> String {
    let from_name = asset
        .file_name
        .as_deref()
        .and_then(|name| name.rsplit_once('.'))
        .map(|(_, ext)| ext.to_ascii_lowercase());

    from_name
        .or_else(|| {
            asset
                .content_type
                .as_deref()
                .and_then(|ct| ct.split_once('/'))
                .map(|(_, sub)| sub.to_string())
        })
        .unwrap_or_else(|| "bin".to_string())
}

#[async_trait::async_trait]
impl AssetRepository for MemoryAssetRepository {
    async fn upload(&self, asset: NewAsset) -> Result<AssetRecord> {
        let kind = asset.resource_kind();
        let format = format_of(&asset);
        let public_id = format!("{}/{}", self.folder, uuid::Uuid::new_v4().simple());

        let record = AssetRecord {
            secure_url: format!("{}/{}/{}.{}", self.base_url, kind, public_id, format),
            public_id,
            resource_kind: kind,
            format,
            bytes: asset.data.len() as u64,
            created_at: Utc::now(),
            context: Some(asset.context),
        };

        self.insert_record(record.clone());
        Ok(record)
    }

    async fn fetch(&self, public_id: &str, kind: ResourceKind) -> Result<AssetRecord> {
        self.assets
            .get(&(public_id.to_string(), kind))
            .map(|entry| entry.value().clone())
            .ok_or_else(|| GalleryError::NotFound("Project not found".into()))
    }

    async fn update_context(
        &self,
        public_id: &str,
        kind: ResourceKind,
        context: &str,
    ) -> Result<()> {
        let mut entry = self
            .assets
            .get_mut(&(public_id.to_string(), kind))
            .ok_or_else(|| GalleryError::NotFound("Project not found".into()))?;
        entry.context = Some(context.to_string());
        Ok(())
    }

    async fn destroy(&self, public_id: &str, kind: ResourceKind) -> Result<DestroyOutcome> {
        let result = match self.assets.remove(&(public_id.to_string(), kind)) {
            Some(_) => "ok",
            None => "not found",
        };
        Ok(DestroyOutcome {
            result: result.to_string(),
        })
    }

    async fn list(&self, kind: ResourceKind) -> Result<Vec<AssetRecord>> {
        Ok(self
            .assets
            .iter()
            .filter(|entry| entry.key().1 == kind)
            .map(|entry| entry.value().clone())
            .collect())
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use tokio_test::{assert_err, assert_ok};

    fn new_asset(name: &str, content_type: &str) -> NewAsset {
        NewAsset {
            file_name: Some(name.into()),
            content_type: Some(content_type.into()),
            data: Bytes::from_static(b"payload"),
            context: "studentName=Ada Lovelace".into(),
        }
    }

    #[tokio::test]
    async fn test_upload_then_fetch() {
        let repo = MemoryAssetRepository::default();
        let record = assert_ok!(repo.upload(new_asset("Robot.PNG", "image/png")).await);

        assert!(record.public_id.starts_with("steam4all/"));
        assert_eq!(record.format, "png");
        assert_eq!(record.bytes, 7);

        let fetched = repo.fetch(&record.public_id, ResourceKind::Image).await.unwrap();
        assert_eq!(fetched, record);

        let wrong_kind = assert_err!(repo.fetch(&record.public_id, ResourceKind::Video).await);
        assert!(matches!(wrong_kind, GalleryError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_kind_follows_content_type() {
        let repo = MemoryAssetRepository::default();
        repo.upload(new_asset("clip.mp4", "video/mp4")).await.unwrap();
        repo.upload(new_asset("still.jpg", "image/jpeg")).await.unwrap();

        assert_eq!(repo.list(ResourceKind::Video).await.unwrap().len(), 1);
        assert_eq!(repo.list(ResourceKind::Image).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_update_and_destroy() {
        let repo = MemoryAssetRepository::default();
        let record = repo.upload(new_asset("a.png", "image/png")).await.unwrap();

        repo.update_context(&record.public_id, ResourceKind::Image, "title=New")
            .await
            .unwrap();
        let fetched = repo.fetch(&record.public_id, ResourceKind::Image).await.unwrap();
        assert_eq!(fetched.context.as_deref(), Some("title=New"));

        let gone = repo.destroy(&record.public_id, ResourceKind::Image).await.unwrap();
        assert_eq!(gone.result, "ok");
        let again = repo.destroy(&record.public_id, ResourceKind::Image).await.unwrap();
        assert_eq!(again.result, "not found");
        assert!(repo.is_empty());
    }
}
