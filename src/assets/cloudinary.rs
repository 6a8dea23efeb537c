//! Cloudinary-backed [`AssetRepository`]
//!
//! Uploads and deletes go through the signed Upload API; reads, listing
//! and context updates use the Admin API with basic auth.
//!
//! Cloudinary splits a context string on `|` and `=` into a key/value map,
//! which would tear the `makers` list apart. The encoded string is therefore
//! stored whole under one custom key ([`CONTEXT_KEY`]) with both characters
//! backslash-escaped. Assets written before that key existed carry the facts
//! as separate `studentName`/`title`/`makers` entries and are re-encoded on
//! read.

use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use tracing::{debug, error, info};

use crate::assets::codec::{self, KEY_MAKERS, KEY_TITLE, KEY_UPLOADER};
use crate::assets::{AssetRecord, AssetRepository, DestroyOutcome, NewAsset, ResourceKind};
use crate::types::{GalleryError, Result};

/// Custom context key holding the encoded metadata string
pub const CONTEXT_KEY: &str = "meta";

/// Largest page the Admin API serves
const PAGE_SIZE: u32 = 100;

/// Stop following cursors after this many pages
const MAX_PAGES: usize = 20;

/// Connection settings for one Cloudinary account
#[derive(Debug, Clone)]
pub struct CloudinaryConfig {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: String,
    /// Folder every upload lands in and listing is scoped to
    pub folder: String,
    pub api_base: String,
    pub request_timeout: Duration,
}

impl Default for CloudinaryConfig {
    fn default() -> Self {
        Self {
            cloud_name: String::new(),
            api_key: String::new(),
            api_secret: String::new(),
            folder: "steam4all".to_string(),
            api_base: "https://api.cloudinary.com/v1_1".to_string(),
            request_timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ResourceContext {
    #[serde(default)]
    custom: HashMap<String, String>,
}

/// Resource as returned by both APIs
#[derive(Debug, Deserialize)]
struct ResourceResponse {
    public_id: String,
    secure_url: String,
    resource_type: ResourceKind,
    #[serde(default)]
    format: Option<String>,
    #[serde(default)]
    bytes: u64,
    created_at: DateTime<Utc>,
    #[serde(default)]
    context: Option<ResourceContext>,
}

impl ResourceResponse {
    fn into_record(self) -> AssetRecord {
        let context = self.context.and_then(|c| context_from_custom(&c.custom));
        AssetRecord {
            public_id: self.public_id,
            secure_url: self.secure_url,
            resource_kind: self.resource_type,
            format: self.format.unwrap_or_default(),
            bytes: self.bytes,
            created_at: self.created_at,
            context,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ResourceList {
    #[serde(default)]
    resources: Vec<ResourceResponse>,
    #[serde(default)]
    next_cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

/// Asset repository talking to the Cloudinary REST APIs
pub struct CloudinaryRepository {
    config: CloudinaryConfig,
    http_client: reqwest::Client,
}

impl CloudinaryRepository {
    pub fn new(config: CloudinaryConfig) -> Result<Self> {
        if config.cloud_name.is_empty() || config.api_key.is_empty() || config.api_secret.is_empty()
        {
            return Err(GalleryError::Config(
                "Cloudinary cloud name, API key and API secret are required".into(),
            ));
        }

        let http_client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .user_agent(concat!("showcase/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| GalleryError::Config(format!("HTTP client: {}", e)))?;

        info!(
            cloud = %config.cloud_name,
            folder = %config.folder,
            "Cloudinary asset repository configured"
        );

        Ok(Self {
            config,
            http_client,
        })
    }

    fn api_url(&self, path: &str) -> String {
        format!(
            "{}/{}/{}",
            self.config.api_base.trim_end_matches('/'),
            self.config.cloud_name,
            path
        )
    }

    fn resource_url(&self, public_id: &str, kind: ResourceKind) -> String {
        self.api_url(&format!("resources/{}/upload/{}", kind, public_id))
    }

    /// Parameters plus their signature, ready for a signed Upload API call
    fn signed_params(&self, params: BTreeMap<&'static str, String>) -> Vec<(String, String)> {
        let timestamp = Utc::now().timestamp().to_string();
        let mut params = params;
        params.insert("timestamp", timestamp);

        let signature = sign(&params, &self.config.api_secret);

        let mut out: Vec<(String, String)> = params
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect();
        out.push(("api_key".into(), self.config.api_key.clone()));
        out.push(("signature".into(), signature));
        out.push(("signature_algorithm".into(), "sha256".into()));
        out
    }

    async fn read_json<T: serde::de::DeserializeOwned>(
        &self,
        operation: &str,
        response: reqwest::Response,
    ) -> Result<T> {
        let status = response.status();
        if status.is_success() {
            return Ok(response.json::<T>().await?);
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ApiErrorBody>(&body)
            .map(|b| b.error.message)
            .unwrap_or(body);

        if status == reqwest::StatusCode::NOT_FOUND {
            debug!(operation, "Cloudinary reported missing resource: {}", message);
            return Err(GalleryError::NotFound("Project not found".into()));
        }

        error!(operation, status = %status, "Cloudinary request failed: {}", message);
        Err(GalleryError::UpstreamFailure(format!(
            "{} failed with HTTP {}: {}",
            operation, status, message
        )))
    }
}

#[async_trait::async_trait]
impl AssetRepository for CloudinaryRepository {
    async fn upload(&self, asset: NewAsset) -> Result<AssetRecord> {
        let mut params = BTreeMap::new();
        params.insert("folder", self.config.folder.clone());
        params.insert("context", stored_context(&asset.context));

        let mut form = Form::new();
        for (key, value) in self.signed_params(params) {
            form = form.text(key, value);
        }

        let kind = asset.resource_kind();
        let size = asset.data.len();
        let mut part = Part::bytes(asset.data.to_vec())
            .file_name(asset.file_name.unwrap_or_else(|| "upload".to_string()));
        if let Some(content_type) = asset.content_type.as_deref() {
            part = part.mime_str(content_type)?;
        }
        form = form.part("file", part);

        debug!(bytes = size, kind = %kind, "Uploading asset to Cloudinary");

        let response = self
            .http_client
            .post(self.api_url(&format!("{}/upload", kind)))
            .multipart(form)
            .send()
            .await?;

        let resource: ResourceResponse = self.read_json("upload", response).await?;
        Ok(resource.into_record())
    }

    async fn fetch(&self, public_id: &str, kind: ResourceKind) -> Result<AssetRecord> {
        let response = self
            .http_client
            .get(self.resource_url(public_id, kind))
            .basic_auth(&self.config.api_key, Some(&self.config.api_secret))
            .send()
            .await?;

        let resource: ResourceResponse = self.read_json("resource", response).await?;
        Ok(resource.into_record())
    }

    async fn update_context(
        &self,
        public_id: &str,
        kind: ResourceKind,
        context: &str,
    ) -> Result<()> {
        let response = self
            .http_client
            .post(self.resource_url(public_id, kind))
            .basic_auth(&self.config.api_key, Some(&self.config.api_secret))
            .form(&[("context", stored_context(context))])
            .send()
            .await?;

        let _: ResourceResponse = self.read_json("update", response).await?;
        Ok(())
    }

    async fn destroy(&self, public_id: &str, kind: ResourceKind) -> Result<DestroyOutcome> {
        let mut params = BTreeMap::new();
        params.insert("public_id", public_id.to_string());

        let response = self
            .http_client
            .post(self.api_url(&format!("{}/destroy", kind)))
            .form(&self.signed_params(params))
            .send()
            .await?;

        self.read_json("destroy", response).await
    }

    async fn list(&self, kind: ResourceKind) -> Result<Vec<AssetRecord>> {
        let prefix = format!("{}/", self.config.folder);
        let mut records = Vec::new();
        let mut cursor: Option<String> = None;

        for _ in 0..MAX_PAGES {
            let mut query = vec![
                ("prefix", prefix.clone()),
                ("max_results", PAGE_SIZE.to_string()),
                ("context", "true".to_string()),
            ];
            if let Some(next) = cursor.take() {
                query.push(("next_cursor", next));
            }

            let response = self
                .http_client
                .get(self.api_url(&format!("resources/{}/upload", kind)))
                .basic_auth(&self.config.api_key, Some(&self.config.api_secret))
                .query(&query)
                .send()
                .await?;

            let page: ResourceList = self.read_json("list", response).await?;
            records.extend(page.resources.into_iter().map(ResourceResponse::into_record));

            match page.next_cursor {
                Some(next) => cursor = Some(next),
                None => break,
            }
        }

        Ok(records)
    }

    async fn ping(&self) -> Result<()> {
        let response = self
            .http_client
            .get(self.api_url("ping"))
            .basic_auth(&self.config.api_key, Some(&self.config.api_secret))
            .send()
            .await?;

        let _: serde_json::Value = self.read_json("ping", response).await?;
        Ok(())
    }
}

/// Signature over sorted `key=value` pairs followed by the API secret
pub fn sign(params: &BTreeMap<&str, String>, api_secret: &str) -> String {
    let to_sign = params
        .iter()
        .filter(|(_, v)| !v.is_empty())
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&");

    let mut hasher = Sha256::new();
    hasher.update(to_sign.as_bytes());
    hasher.update(api_secret.as_bytes());
    hex::encode(hasher.finalize())
}

/// Escape the characters Cloudinary treats as context separators
fn escape_context_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '|' | '=' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Context parameter that stores `encoded` under [`CONTEXT_KEY`]
fn stored_context(encoded: &str) -> String {
    format!("{}={}", CONTEXT_KEY, escape_context_value(encoded))
}

/// Recover the encoded string from Cloudinary's custom context map
fn context_from_custom(custom: &HashMap<String, String>) -> Option<String> {
    if let Some(encoded) = custom.get(CONTEXT_KEY) {
        return Some(encoded.clone());
    }

    let uploader = custom.get(KEY_UPLOADER).map(String::as_str).unwrap_or("");
    let title = custom.get(KEY_TITLE).map(String::as_str);
    let makers: Vec<String> = custom
        .get(KEY_MAKERS)
        .map(|m| {
            m.split('|')
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    if uploader.is_empty() && title.is_none() && makers.is_empty() {
        return None;
    }

    Some(codec::encode(uploader, title, &makers))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signature_sorts_and_skips_empty() {
        let mut params = BTreeMap::new();
        params.insert("timestamp", "1315060510".to_string());
        params.insert("public_id", "sample_image".to_string());
        params.insert("eager", String::new());

        let mut expected = Sha256::new();
        expected.update(b"public_id=sample_image&timestamp=1315060510abcd");
        assert_eq!(sign(&params, "abcd"), hex::encode(expected.finalize()));
    }

    #[test]
    fn test_stored_context_escapes_separators() {
        assert_eq!(
            stored_context("studentName=Ada Lovelace|makers=Grace Hopper|Alan Turing"),
            r"meta=studentName\=Ada Lovelace\|makers\=Grace Hopper\|Alan Turing"
        );
    }

    #[test]
    fn test_context_from_meta_key() {
        let mut custom = HashMap::new();
        custom.insert(
            CONTEXT_KEY.to_string(),
            "studentName=Ada Lovelace|makers=Grace Hopper|Alan Turing".to_string(),
        );
        let context = context_from_custom(&custom).unwrap();
        let meta = codec::decode(&context);
        assert_eq!(meta.makers, vec!["Grace Hopper", "Alan Turing"]);
    }

    #[test]
    fn test_context_from_legacy_keys() {
        let mut custom = HashMap::new();
        custom.insert("studentName".to_string(), "Ada Lovelace".to_string());
        custom.insert("title".to_string(), "Engine".to_string());
        custom.insert("makers".to_string(), "Grace Hopper".to_string());

        let context = context_from_custom(&custom).unwrap();
        assert_eq!(context, "studentName=Ada Lovelace|title=Engine|makers=Grace Hopper");

        assert!(context_from_custom(&HashMap::new()).is_none());
    }

    #[test]
    fn test_resource_response_parses() {
        let body = r#"{
            "public_id": "steam4all/abc",
            "secure_url": "https://res.cloudinary.com/demo/video/upload/steam4all/abc.mp4",
            "resource_type": "video",
            "format": "mp4",
            "bytes": 2048,
            "created_at": "2024-03-01T10:00:00Z",
            "context": { "custom": { "meta": "studentName=Ada Lovelace" } }
        }"#;

        let record = serde_json::from_str::<ResourceResponse>(body)
            .unwrap()
            .into_record();
        assert_eq!(record.resource_kind, ResourceKind::Video);
        assert_eq!(record.bytes, 2048);
        assert_eq!(record.context.as_deref(), Some("studentName=Ada Lovelace"));
    }

    #[test]
    fn test_new_requires_credentials() {
        let result = CloudinaryRepository::new(CloudinaryConfig::default());
        assert!(matches!(result, Err(GalleryError::Config(_))));
    }
}
