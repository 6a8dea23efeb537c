//! Binary assets and the facts attached to them
//!
//! Files live in an external repository that only knows ids, URLs, a
//! resource kind and one free-form context string per asset. The
//! [`codec`] packs uploader, title and makers into that string and
//! [`visibility`] decides who may see the result.

pub mod cloudinary;
pub mod codec;
pub mod memory;
pub mod visibility;

pub use cloudinary::{CloudinaryConfig, CloudinaryRepository};
pub use codec::AssetMetadata;
pub use memory::MemoryAssetRepository;
pub use visibility::{can_view, filter_visible};

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::Result;

/// Kind of asset as the repository partitions them
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    #[default]
    Image,
    Video,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 2] = [ResourceKind::Image, ResourceKind::Video];

    /// Only the exact string `video` selects video; anything else is an image
    pub fn from_request(raw: Option<&str>) -> Self {
        match raw {
            Some("video") => ResourceKind::Video,
            _ => ResourceKind::Image,
        }
    }

    /// Whether an upload with this MIME type can be stored as image or video.
    /// A missing type is left to the repository to sniff as an image.
    pub fn accepts(content_type: Option<&str>) -> bool {
        match content_type.map(str::trim) {
            None | Some("") => true,
            Some(ct) => ct.starts_with("image/") || ct.starts_with("video/"),
        }
    }

    /// Guess the kind from an upload's MIME type
    pub fn from_content_type(content_type: Option<&str>) -> Self {
        match content_type {
            Some(ct) if ct.starts_with("video/") => ResourceKind::Video,
            _ => ResourceKind::Image,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Image => "image",
            ResourceKind::Video => "video",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An asset as the repository reports it
#[derive(Debug, Clone, PartialEq)]
pub struct AssetRecord {
    pub public_id: String,
    pub secure_url: String,
    pub resource_kind: ResourceKind,
    pub format: String,
    pub bytes: u64,
    pub created_at: DateTime<Utc>,
    /// Encoded [`AssetMetadata`], if the repository holds one
    pub context: Option<String>,
}

impl AssetRecord {
    /// Decode the context string, degrading to empty facts
    pub fn metadata(&self) -> AssetMetadata {
        self.context
            .as_deref()
            .map(AssetMetadata::decode)
            .unwrap_or_default()
    }
}

/// A record with its context already decoded
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedAsset {
    pub record: AssetRecord,
    pub metadata: AssetMetadata,
}

impl From<AssetRecord> for DecodedAsset {
    fn from(record: AssetRecord) -> Self {
        let metadata = record.metadata();
        Self { record, metadata }
    }
}

/// File handed to the repository for storage
#[derive(Debug, Clone)]
pub struct NewAsset {
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub data: Bytes,
    /// Already-encoded context string
    pub context: String,
}

impl NewAsset {
    pub fn resource_kind(&self) -> ResourceKind {
        ResourceKind::from_content_type(self.content_type.as_deref())
    }
}

/// Repository's answer to a delete, e.g. `ok` or `not found`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DestroyOutcome {
    pub result: String,
}

/// Seam to the external binary asset repository
#[async_trait::async_trait]
pub trait AssetRepository: Send + Sync {
    /// Store a file with its context string
    async fn upload(&self, asset: NewAsset) -> Result<AssetRecord>;

    /// Read one asset; missing ids fail with `NotFound`
    async fn fetch(&self, public_id: &str, kind: ResourceKind) -> Result<AssetRecord>;

    /// Overwrite the context string of an existing asset
    async fn update_context(&self, public_id: &str, kind: ResourceKind, context: &str)
        -> Result<()>;

    /// Delete by id
    async fn destroy(&self, public_id: &str, kind: ResourceKind) -> Result<DestroyOutcome>;

    /// Every asset of one kind
    async fn list(&self, kind: ResourceKind) -> Result<Vec<AssetRecord>>;

    /// Connectivity check for readiness probes
    async fn ping(&self) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_kind_from_request() {
        assert_eq!(ResourceKind::from_request(Some("video")), ResourceKind::Video);
        assert_eq!(ResourceKind::from_request(Some("image")), ResourceKind::Image);
        assert_eq!(ResourceKind::from_request(Some("raw")), ResourceKind::Image);
        assert_eq!(ResourceKind::from_request(None), ResourceKind::Image);
    }

    #[test]
    fn test_resource_kind_from_content_type() {
        assert_eq!(ResourceKind::from_content_type(Some("video/mp4")), ResourceKind::Video);
        assert_eq!(ResourceKind::from_content_type(Some("image/png")), ResourceKind::Image);
        assert_eq!(ResourceKind::from_content_type(None), ResourceKind::Image);
    }

    #[test]
    fn test_only_media_types_are_accepted() {
        assert!(ResourceKind::accepts(Some("image/png")));
        assert!(ResourceKind::accepts(Some("video/quicktime")));
        assert!(ResourceKind::accepts(None));
        assert!(!ResourceKind::accepts(Some("application/pdf")));
        assert!(!ResourceKind::accepts(Some("application/zip")));
    }

    #[test]
    fn test_record_without_context_decodes_empty() {
        let record = AssetRecord {
            public_id: "steam4all/a".into(),
            secure_url: "https://example.test/a.png".into(),
            resource_kind: ResourceKind::Image,
            format: "png".into(),
            bytes: 10,
            created_at: Utc::now(),
            context: None,
        };
        let decoded = DecodedAsset::from(record);
        assert_eq!(decoded.metadata, AssetMetadata::default());
    }
}
