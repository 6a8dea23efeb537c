//! Project gallery operations over an [`AssetRepository`]

use bytes::Bytes;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::assets::{
    codec, filter_visible, AssetMetadata, AssetRecord, AssetRepository, DecodedAsset,
    DestroyOutcome, NewAsset, ResourceKind,
};
use crate::auth::{Caller, Role};
use crate::identity::{is_valid_full_name, IdentityResolver, SEARCH_LIMIT};
use crate::types::{GalleryError, Result};

/// Shortest trimmed query that triggers a student search
pub const MIN_SEARCH_CHARS: usize = 2;

pub const UNSUPPORTED_FILE_MESSAGE: &str = "Only image and video files can be uploaded.";

/// File part of an upload form
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub data: Bytes,
}

#[derive(Debug, Clone)]
pub struct UploadInput {
    pub title: Option<String>,
    /// Comma-separated maker names as typed
    pub makers: Option<String>,
    pub file: UploadFile,
}

/// A stored upload with the facts that were attached to it
#[derive(Debug, Clone)]
pub struct UploadedProject {
    pub record: AssetRecord,
    pub metadata: AssetMetadata,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetitleOutcome {
    pub public_id: String,
    /// Title as read back after the write
    pub title: Option<String>,
}

#[derive(Clone)]
pub struct GalleryService {
    assets: Arc<dyn AssetRepository>,
    identities: IdentityResolver,
}

impl GalleryService {
    pub fn new(assets: Arc<dyn AssetRepository>, identities: IdentityResolver) -> Self {
        Self { assets, identities }
    }

    /// Projects `caller` may see, newest first across images and videos
    pub async fn list_visible(&self, caller: Option<&Caller>) -> Result<Vec<DecodedAsset>> {
        let Some(caller) = caller else {
            debug!("Anonymous listing");
            return Ok(Vec::new());
        };

        let (images, videos) = tokio::try_join!(
            self.assets.list(ResourceKind::Image),
            self.assets.list(ResourceKind::Video),
        )?;

        let mut records: Vec<AssetRecord> = images.into_iter().chain(videos).collect();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let decoded = records.into_iter().map(decode_record).collect();
        Ok(filter_visible(decoded, Some(caller)))
    }

    /// Store a file attributed to `caller`.
    ///
    /// Each requested maker must be a valid full name of an existing
    /// student; it is stored as that student's display name. Anything else
    /// is dropped.
    pub async fn upload(&self, caller: &Caller, input: UploadInput) -> Result<UploadedProject> {
        if caller.role != Role::Student {
            return Err(GalleryError::Unauthorized(
                "Please sign in as a student to upload.".into(),
            ));
        }

        if !ResourceKind::accepts(input.file.content_type.as_deref()) {
            return Err(GalleryError::BadRequest(UNSUPPORTED_FILE_MESSAGE.into()));
        }

        let makers = self
            .resolve_makers(input.makers.as_deref().unwrap_or(""))
            .await?;
        let title = input
            .title
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());

        let context = AssetMetadata::new(caller.name.clone(), title, makers).encode();
        let record = self
            .assets
            .upload(NewAsset {
                file_name: input.file.file_name,
                content_type: input.file.content_type,
                data: input.file.data,
                context: context.clone(),
            })
            .await?;

        info!(
            public_id = %record.public_id,
            kind = %record.resource_kind,
            uploader = %caller.name,
            "Project uploaded"
        );

        Ok(UploadedProject {
            record,
            metadata: codec::decode(&context),
        })
    }

    async fn resolve_makers(&self, raw: &str) -> Result<Vec<String>> {
        let mut makers = Vec::new();

        for requested in raw.split(',').map(str::trim).filter(|m| !m.is_empty()) {
            if !is_valid_full_name(requested) {
                warn!(maker = %requested, "Dropping maker with invalid name");
                continue;
            }
            match self
                .identities
                .find_by_name_role(requested, Role::Student)
                .await?
            {
                Some(student) => makers.push(student.name),
                None => warn!(maker = %requested, "Dropping unknown maker"),
            }
        }

        Ok(makers)
    }

    /// Replace the title of a project, keeping uploader and makers
    pub async fn retitle(
        &self,
        public_id: &str,
        kind: ResourceKind,
        title: &str,
    ) -> Result<RetitleOutcome> {
        let public_id = public_id.trim();
        let title = title.trim();
        if public_id.is_empty() || title.is_empty() {
            return Err(GalleryError::BadRequest(
                "public_id and title are required".into(),
            ));
        }
        if codec::sanitize_value(title).is_empty() {
            return Err(GalleryError::BadRequest(
                "Title must contain more than | and =".into(),
            ));
        }

        let current = self.assets.fetch(public_id, kind).await?;
        let context = codec::retitle(current.context.as_deref().unwrap_or(""), title);
        self.assets.update_context(public_id, kind, &context).await?;

        let fresh = self.assets.fetch(public_id, kind).await?;
        Ok(RetitleOutcome {
            public_id: public_id.to_string(),
            title: fresh.metadata().title,
        })
    }

    pub async fn delete(&self, public_id: &str, kind: ResourceKind) -> Result<DestroyOutcome> {
        let public_id = public_id.trim();
        if public_id.is_empty() {
            return Err(GalleryError::BadRequest("public_id is required".into()));
        }

        let outcome = self.assets.destroy(public_id, kind).await?;
        info!(public_id, result = %outcome.result, "Project delete");
        Ok(outcome)
    }

    /// Student names matching `query`; short queries return nothing
    pub async fn search_students(&self, query: &str) -> Result<Vec<String>> {
        let query = query.trim();
        if query.chars().count() < MIN_SEARCH_CHARS {
            return Ok(Vec::new());
        }
        self.identities.search_students(query, SEARCH_LIMIT).await
    }
}

fn decode_record(record: AssetRecord) -> DecodedAsset {
    let metadata = match record.context.as_deref() {
        None => AssetMetadata::default(),
        Some(context) => AssetMetadata::try_decode(context).unwrap_or_else(|e| {
            warn!(public_id = %record.public_id, "Degraded metadata: {}", e);
            AssetMetadata::decode(context)
        }),
    };
    DecodedAsset { record, metadata }
}
