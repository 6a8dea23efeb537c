//! HTTP Routes for the project gallery
//!
//! - GET    /projects - Projects visible to the caller, newest first
//! - POST   /upload   - Multipart upload attributed to the calling student
//! - POST   /retitle  - Replace a project's title
//! - DELETE /delete   - Remove a project (POST also accepted)

use bytes::Bytes;
use chrono::{DateTime, Utc};
use hyper::body::Body;
use hyper::{Request, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::sync::Arc;
use tracing::debug;

use crate::assets::{DecodedAsset, DestroyOutcome, ResourceKind};
use crate::auth::Caller;
use crate::routes::{json_response, lenient_string, parse_json_body, read_body, BodyError, BoxBody};
use crate::server::AppState;
use crate::services::{UploadFile, UploadInput};
use crate::types::{GalleryError, Result};

/// Form fields accepted for the uploaded file, in order of preference
pub const FILE_FIELDS: [&str; 3] = ["projectFile", "file", "upload"];

#[derive(Debug, Serialize)]
pub struct ProjectItem {
    pub public_id: String,
    pub url: String,
    pub format: String,
    pub resource_type: ResourceKind,
    pub bytes: u64,
    pub created_at: DateTime<Utc>,
    #[serde(rename = "studentName")]
    pub student_name: Option<String>,
    pub title: Option<String>,
    pub makers: Vec<String>,
}

impl From<DecodedAsset> for ProjectItem {
    fn from(asset: DecodedAsset) -> Self {
        let DecodedAsset { record, metadata } = asset;
        Self {
            public_id: record.public_id,
            url: record.secure_url,
            format: record.format,
            resource_type: record.resource_kind,
            bytes: record.bytes,
            created_at: record.created_at,
            student_name: Some(metadata.uploader_name).filter(|n| !n.is_empty()),
            title: metadata.title,
            makers: metadata.makers,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ProjectsResponse {
    pub success: bool,
    pub count: usize,
    pub items: Vec<ProjectItem>,
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub success: bool,
    pub url: String,
    pub public_id: String,
    pub resource_type: ResourceKind,
    #[serde(rename = "studentName")]
    pub student_name: String,
    pub title: Option<String>,
    pub makers: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct RetitleRequest {
    #[serde(default, deserialize_with = "lenient_string")]
    pub public_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub resource_type: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub title: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RetitleResponse {
    pub success: bool,
    pub public_id: String,
    pub title: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DeleteRequest {
    #[serde(default, deserialize_with = "lenient_string")]
    pub public_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub resource_type: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub success: bool,
    pub result: DestroyOutcome,
}

/// GET /projects
pub async fn handle_projects(
    state: Arc<AppState>,
    caller: Option<&Caller>,
) -> Result<Response<BoxBody>> {
    let items: Vec<ProjectItem> = state
        .gallery
        .list_visible(caller)
        .await?
        .into_iter()
        .map(ProjectItem::from)
        .collect();

    Ok(json_response(
        StatusCode::OK,
        &ProjectsResponse {
            success: true,
            count: items.len(),
            items,
        },
    ))
}

/// POST /upload
pub async fn handle_upload<B>(
    req: Request<B>,
    state: Arc<AppState>,
    caller: Option<&Caller>,
) -> Result<Response<BoxBody>>
where
    B: Body<Data = Bytes> + Send,
    B::Error: Into<BodyError>,
{
    let caller = caller.ok_or_else(|| {
        GalleryError::Unauthorized("Please sign in as a student to upload.".into())
    })?;

    let boundary = req
        .headers()
        .get(hyper::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|ct| multer::parse_boundary(ct).ok())
        .ok_or_else(|| GalleryError::BadRequest("Expected a multipart/form-data upload".into()))?;

    let body = read_body(req.into_body(), state.args.max_upload_bytes).await?;
    let input = read_upload_form(body, boundary).await?;

    let uploaded = state.gallery.upload(caller, input).await?;

    Ok(json_response(
        StatusCode::OK,
        &UploadResponse {
            success: true,
            url: uploaded.record.secure_url,
            public_id: uploaded.record.public_id,
            resource_type: uploaded.record.resource_kind,
            student_name: uploaded.metadata.uploader_name,
            title: uploaded.metadata.title,
            makers: uploaded.metadata.makers,
        },
    ))
}

async fn read_upload_form(body: Bytes, boundary: String) -> Result<UploadInput> {
    let stream = futures_util::stream::once(async move { Ok::<Bytes, Infallible>(body) });
    let mut multipart = multer::Multipart::new(stream, boundary);

    let mut title = None;
    let mut makers = None;
    let mut file: Option<(usize, UploadFile)> = None;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "title" => title = Some(field.text().await?),
            "makers" | "makers[]" => {
                let value = field.text().await?;
                makers = Some(match makers.take() {
                    Some(earlier) => format!("{},{}", earlier, value),
                    None => value,
                });
            }
            other => {
                let Some(rank) = FILE_FIELDS.iter().position(|f| *f == other) else {
                    debug!(field = %other, "Ignoring upload form field");
                    continue;
                };
                if file.as_ref().is_some_and(|(best, _)| *best <= rank) {
                    continue;
                }
                let file_name = field.file_name().map(str::to_string);
                let content_type = field.content_type().map(|m| m.to_string());
                let data = field.bytes().await?;
                file = Some((
                    rank,
                    UploadFile {
                        file_name,
                        content_type,
                        data,
                    },
                ));
            }
        }
    }

    let (_, file) = file.ok_or_else(|| {
        GalleryError::BadRequest("No file uploaded (field \"projectFile\")".into())
    })?;

    Ok(UploadInput {
        title,
        makers,
        file,
    })
}

/// POST /retitle
pub async fn handle_retitle<B>(req: Request<B>, state: Arc<AppState>) -> Result<Response<BoxBody>>
where
    B: Body<Data = Bytes> + Send,
    B::Error: Into<BodyError>,
{
    let body: RetitleRequest = parse_json_body(req).await?;
    let kind = ResourceKind::from_request(body.resource_type.as_deref());

    let outcome = state
        .gallery
        .retitle(
            body.public_id.as_deref().unwrap_or(""),
            kind,
            body.title.as_deref().unwrap_or(""),
        )
        .await?;

    Ok(json_response(
        StatusCode::OK,
        &RetitleResponse {
            success: outcome.title.is_some(),
            public_id: outcome.public_id,
            title: outcome.title,
        },
    ))
}

/// DELETE /delete
pub async fn handle_delete<B>(req: Request<B>, state: Arc<AppState>) -> Result<Response<BoxBody>>
where
    B: Body<Data = Bytes> + Send,
    B::Error: Into<BodyError>,
{
    let body: DeleteRequest = parse_json_body(req).await?;
    let kind = ResourceKind::from_request(body.resource_type.as_deref());

    let result = state
        .gallery
        .delete(body.public_id.as_deref().unwrap_or(""), kind)
        .await?;

    Ok(json_response(
        StatusCode::OK,
        &DeleteResponse {
            success: result.result == "ok",
            result,
        },
    ))
}
