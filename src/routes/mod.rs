//! HTTP routes for Showcase
//!
//! Every handler answers with the same JSON envelope: `success: true` plus
//! the payload, or `success: false` plus a `message` safe to show a person.
//! Handlers are generic over the request body so they can be driven with an
//! in-memory body in tests.

pub mod auth_routes;
pub mod health;
pub mod projects;
pub mod students;

pub use auth_routes::{handle_login, handle_signup};
pub use health::{health_check, readiness_check, version_info};
pub use projects::{handle_delete, handle_projects, handle_retitle, handle_upload};
pub use students::handle_search_students;

use bytes::Bytes;
use http_body_util::{BodyExt, Full, Limited};
use hyper::body::Body;
use hyper::{Method, Request, Response, StatusCode};
use serde::{Deserialize, Deserializer, Serialize};
use tracing::error;

use crate::types::{GalleryError, Result};

pub type BoxBody = http_body_util::combinators::BoxBody<Bytes, hyper::Error>;

/// Error type a request body may produce
pub type BodyError = Box<dyn std::error::Error + Send + Sync>;

/// Largest JSON body accepted
pub const MAX_JSON_BYTES: usize = 10240;

/// Prefix the routes are also served under
pub const API_PREFIX: &str = "/api";

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub message: String,
}

/// Route path with any `/api` prefix removed
pub fn strip_api_prefix(path: &str) -> &str {
    match path.strip_prefix(API_PREFIX) {
        Some("") => "/",
        Some(rest) if rest.starts_with('/') => rest,
        _ => path,
    }
}

/// Whether a known route answers to `method`
pub fn is_method_allowed(route: &str, method: &Method) -> bool {
    match route {
        "/login" | "/signup" | "/upload" | "/retitle" => method == Method::POST,
        "/delete" => method == Method::DELETE || method == Method::POST,
        _ => method == Method::GET,
    }
}

pub fn json_response<T: Serialize>(status: StatusCode, body: &T) -> Response<BoxBody> {
    let json = serde_json::to_string(body).unwrap_or_else(|_| "{}".to_string());

    Response::builder()
        .status(status)
        .header("Content-Type", "application/json")
        .header("Access-Control-Allow-Origin", "*")
        .header("Access-Control-Allow-Methods", "GET, POST, DELETE, OPTIONS")
        .header("Access-Control-Allow-Headers", "Content-Type, Authorization")
        .body(full_body(json))
        .unwrap()
}

/// Failure envelope for `err`; internal detail is logged, never returned
pub fn error_response(err: &GalleryError) -> Response<BoxBody> {
    if err.is_internal() {
        error!("Request failed: {}", err);
    }

    json_response(
        err.status_code(),
        &ErrorResponse {
            success: false,
            message: err.public_message(),
        },
    )
}

pub fn cors_preflight() -> Response<BoxBody> {
    Response::builder()
        .status(StatusCode::NO_CONTENT)
        .header("Access-Control-Allow-Origin", "*")
        .header("Access-Control-Allow-Methods", "GET, POST, DELETE, OPTIONS")
        .header("Access-Control-Allow-Headers", "Content-Type, Authorization")
        .header("Access-Control-Max-Age", "86400")
        .body(empty_body())
        .unwrap()
}

pub fn full_body(data: impl Into<Bytes>) -> BoxBody {
    Full::new(data.into())
        .map_err(|never| match never {})
        .boxed()
}

pub fn empty_body() -> BoxBody {
    Full::new(Bytes::new())
        .map_err(|never| match never {})
        .boxed()
}

/// Read the whole body, refusing anything over `limit` bytes
pub async fn read_body<B>(body: B, limit: usize) -> Result<Bytes>
where
    B: Body<Data = Bytes> + Send,
    B::Error: Into<BodyError>,
{
    let collected = Limited::new(body, limit)
        .collect()
        .await
        .map_err(|e| GalleryError::BadRequest(format!("Failed to read body: {}", e)))?;
    Ok(collected.to_bytes())
}

/// Parse a JSON body; an empty body reads as `{}`
pub async fn parse_json_body<T, B>(req: Request<B>) -> Result<T>
where
    T: for<'de> Deserialize<'de>,
    B: Body<Data = Bytes> + Send,
    B::Error: Into<BodyError>,
{
    let bytes = read_body(req.into_body(), MAX_JSON_BYTES).await?;
    let raw: &[u8] = if bytes.iter().all(u8::is_ascii_whitespace) {
        b"{}"
    } else {
        &bytes
    };
    Ok(serde_json::from_slice(raw)?)
}

pub fn get_auth_header<B>(req: &Request<B>) -> Option<&str> {
    req.headers()
        .get(hyper::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
}

/// Accept a string, number or bool where a string is expected
pub fn lenient_string<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde_json::Value;

    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(Value::Bool(b)) => Some(b.to_string()),
        _ => None,
    })
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    pub fn json_request(method: Method, uri: &str, body: serde_json::Value) -> Request<Full<Bytes>> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("Content-Type", "application/json")
            .body(Full::new(Bytes::from(body.to_string())))
            .unwrap()
    }

    pub async fn read_json(response: Response<BoxBody>) -> (StatusCode, serde_json::Value) {
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }
}
