//! Error types for Showcase
//!
//! Every failure a request can hit maps onto one variant here. Variants that
//! describe the caller's own mistake carry a message safe to show them;
//! upstream variants carry internal detail that is logged and never returned.

use hyper::StatusCode;

/// Generic message returned for any failure the caller cannot act on
pub const GENERIC_FAILURE: &str = "Server error";

/// Main error type for Showcase operations
#[derive(Debug, thiserror::Error)]
pub enum GalleryError {
    #[error("Invalid name: {0}")]
    InvalidName(String),

    #[error("Missing secret: {0}")]
    MissingSecret(String),

    #[error("Already exists: {0}")]
    AlreadyExists(String),

    #[error("Invalid credential: {0}")]
    InvalidCredential(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Upstream failure: {0}")]
    UpstreamFailure(String),

    #[error("Malformed metadata: {0}")]
    MalformedMetadata(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Method not allowed")]
    MethodNotAllowed,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl GalleryError {
    /// Convert error to HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidName(_) => StatusCode::BAD_REQUEST,
            Self::MissingSecret(_) => StatusCode::BAD_REQUEST,
            Self::AlreadyExists(_) => StatusCode::CONFLICT,
            Self::InvalidCredential(_) => StatusCode::UNAUTHORIZED,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::UpstreamFailure(_) => StatusCode::BAD_GATEWAY,
            Self::MalformedMetadata(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message that may be shown to the caller.
    ///
    /// Upstream, configuration and internal errors collapse to
    /// [`GENERIC_FAILURE`] so store or repository text never leaks.
    pub fn public_message(&self) -> String {
        match self {
            Self::InvalidName(msg)
            | Self::MissingSecret(msg)
            | Self::AlreadyExists(msg)
            | Self::InvalidCredential(msg)
            | Self::Unauthorized(msg)
            | Self::NotFound(msg)
            | Self::MalformedMetadata(msg)
            | Self::BadRequest(msg) => msg.clone(),
            Self::MethodNotAllowed => "Method not allowed".to_string(),
            Self::UpstreamFailure(_) | Self::Config(_) | Self::Internal(_) => {
                GENERIC_FAILURE.to_string()
            }
        }
    }

    /// Whether the detail of this error must stay server-side
    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            Self::UpstreamFailure(_) | Self::Config(_) | Self::Internal(_)
        )
    }
}

// Implement From conversions for common error types

impl From<std::io::Error> for GalleryError {
    fn from(err: std::io::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

impl From<serde_json::Error> for GalleryError {
    fn from(err: serde_json::Error) -> Self {
        Self::BadRequest(format!("Invalid JSON: {}", err))
    }
}

impl From<hyper::Error> for GalleryError {
    fn from(err: hyper::Error) -> Self {
        Self::Internal(format!("HTTP error: {}", err))
    }
}

impl From<mongodb::error::Error> for GalleryError {
    fn from(err: mongodb::error::Error) -> Self {
        Self::UpstreamFailure(format!("Identity store: {}", err))
    }
}

impl From<reqwest::Error> for GalleryError {
    fn from(err: reqwest::Error) -> Self {
        Self::UpstreamFailure(format!("Asset repository: {}", err))
    }
}

impl From<multer::Error> for GalleryError {
    fn from(err: multer::Error) -> Self {
        Self::BadRequest(format!("Invalid upload form: {}", err))
    }
}

impl From<tokio::task::JoinError> for GalleryError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::Internal(format!("Background task failed: {}", err))
    }
}

/// Result type alias for Showcase operations
pub type Result<T> = std::result::Result<T, GalleryError>;
