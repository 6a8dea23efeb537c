//! HTTP server implementation
//!
//! Uses hyper http1 with TokioIo for async handling, one task per
//! connection. All state is built once at startup and shared read-only.

use bytes::Bytes;
use hyper::body::{Body, Incoming};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response};
use hyper_util::rt::TokioIo;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use tracing::{debug, error, info, warn};

use crate::assets::{AssetRepository, CloudinaryRepository, MemoryAssetRepository};
use crate::auth::{
    access_denied_message, extract_token_from_header, get_required_access, is_route_allowed,
    CredentialService,
};
use crate::config::Args;
use crate::db::{MongoClient, MongoIdentityStore};
use crate::identity::{IdentityResolver, IdentityStore, MemoryIdentityStore};
use crate::routes::{self, BodyError, BoxBody};
use crate::services::{AccountService, GalleryService};
use crate::types::{GalleryError, Result};

/// Which backend each store runs on, for probes and startup logs
#[derive(Debug, Clone, Copy)]
pub struct StoreKinds {
    pub identities: &'static str,
    pub assets: &'static str,
}

/// Shared application state
pub struct AppState {
    pub args: Args,
    pub credentials: Arc<CredentialService>,
    pub identities: IdentityResolver,
    pub assets: Arc<dyn AssetRepository>,
    pub accounts: AccountService,
    pub gallery: GalleryService,
    pub store_kinds: StoreKinds,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(
        args: Args,
        credentials: CredentialService,
        identity_store: Arc<dyn IdentityStore>,
        assets: Arc<dyn AssetRepository>,
        store_kinds: StoreKinds,
    ) -> Self {
        let credentials = Arc::new(credentials);
        let identities = IdentityResolver::new(identity_store);
        let accounts =
            AccountService::new(identities.clone(), credentials.clone(), args.teacher_code());
        let gallery = GalleryService::new(assets.clone(), identities.clone());

        Self {
            args,
            credentials,
            identities,
            assets,
            accounts,
            gallery,
            store_kinds,
            started_at: Instant::now(),
        }
    }
}

/// Build the application state from configuration.
///
/// In dev mode a missing secret, identity store or asset repository is
/// replaced by its development stand-in.
pub async fn build_state(args: Args) -> Result<AppState> {
    let credentials = match args.auth_secret.as_deref().filter(|s| !s.is_empty()) {
        Some(secret) => CredentialService::new(secret.to_string(), args.credential_ttl_seconds)?,
        None if args.dev_mode => {
            warn!("No AUTH_SECRET set - using the publicly known dev signing secret");
            CredentialService::new_dev()
        }
        None => {
            return Err(GalleryError::Config(
                "AUTH_SECRET is required in production mode".into(),
            ))
        }
    };

    let (identity_store, identities_kind): (Arc<dyn IdentityStore>, &'static str) =
        match args.mongodb_uri.as_deref() {
            Some(uri) => match MongoClient::new(uri, &args.mongodb_db).await {
                Ok(mongo) => (Arc::new(MongoIdentityStore::new(mongo).await?), "mongodb"),
                Err(e) if args.dev_mode => {
                    warn!("MongoDB unavailable in dev mode, using in-memory identities: {}", e);
                    (Arc::new(MemoryIdentityStore::new()), "memory")
                }
                Err(e) => return Err(e),
            },
            None if args.dev_mode => {
                info!("No MONGODB_URI set - identities are kept in memory");
                (Arc::new(MemoryIdentityStore::new()), "memory")
            }
            None => {
                return Err(GalleryError::Config(
                    "MONGODB_URI is required in production mode".into(),
                ))
            }
        };

    let (assets, assets_kind): (Arc<dyn AssetRepository>, &'static str) =
        match args.cloudinary_config() {
            Some(config) => (Arc::new(CloudinaryRepository::new(config)?), "cloudinary"),
            None if args.dev_mode => {
                info!("No Cloudinary credentials set - assets are kept in memory");
                (
                    Arc::new(MemoryAssetRepository::new(args.cloudinary.folder.clone())),
                    "memory",
                )
            }
            None => {
                return Err(GalleryError::Config(
                    "Cloudinary credentials are required in production mode".into(),
                ))
            }
        };

    Ok(AppState::new(
        args,
        credentials,
        identity_store,
        assets,
        StoreKinds {
            identities: identities_kind,
            assets: assets_kind,
        },
    ))
}

/// Start the HTTP server
pub async fn run(state: Arc<AppState>) -> Result<()> {
    let listener = TcpListener::bind(state.args.listen).await?;

    info!(
        identities = state.store_kinds.identities,
        assets = state.store_kinds.assets,
        "Showcase listening on {}",
        state.args.listen
    );

    if state.args.dev_mode {
        warn!("Development mode enabled - do not expose this instance");
    }

    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                let state = Arc::clone(&state);
                tokio::spawn(async move {
                    let io = TokioIo::new(stream);

                    let service = service_fn(move |req| {
                        let state = Arc::clone(&state);
                        async move { handle_request(state, addr, req).await }
                    });

                    if let Err(err) = http1::Builder::new()
                        .preserve_header_case(true)
                        .title_case_headers(true)
                        .serve_connection(io, service)
                        .await
                    {
                        error!("Error serving connection from {}: {:?}", addr, err);
                    }
                });
            }
            Err(e) => {
                error!("Error accepting connection: {:?}", e);
            }
        }
    }
}

async fn handle_request(
    state: Arc<AppState>,
    addr: SocketAddr,
    req: Request<Incoming>,
) -> std::result::Result<Response<BoxBody>, hyper::Error> {
    debug!("[{}] {} {}", addr, req.method(), req.uri().path());
    Ok(route(state, req).await)
}

/// Route a request to its handler.
///
/// Unknown paths get 404, a wrong method 405, and a caller lacking the
/// route's access 401. Every path is also served under `/api`.
pub async fn route<B>(state: Arc<AppState>, req: Request<B>) -> Response<BoxBody>
where
    B: Body<Data = Bytes> + Send,
    B::Error: Into<BodyError>,
{
    if req.method() == Method::OPTIONS {
        return routes::cors_preflight();
    }

    let path = routes::strip_api_prefix(req.uri().path()).to_string();

    let Some(access) = get_required_access(&path) else {
        return routes::error_response(&GalleryError::NotFound("Not found".into()));
    };

    if !routes::is_method_allowed(&path, req.method()) {
        return routes::error_response(&GalleryError::MethodNotAllowed);
    }

    let caller = extract_token_from_header(routes::get_auth_header(&req))
        .and_then(|token| state.credentials.verify(token));

    if !is_route_allowed(&path, caller.as_ref().map(|c| c.role)) {
        return routes::error_response(&GalleryError::Unauthorized(
            access_denied_message(access).into(),
        ));
    }

    let result = match path.as_str() {
        "/login" => routes::handle_login(req, state).await,
        "/signup" => routes::handle_signup(req, state).await,
        "/projects" => routes::handle_projects(state, caller.as_ref()).await,
        "/upload" => routes::handle_upload(req, state, caller.as_ref()).await,
        "/retitle" => routes::handle_retitle(req, state).await,
        "/delete" => routes::handle_delete(req, state).await,
        "/search-students" => routes::handle_search_students(req.uri(), state).await,
        "/health" | "/healthz" | "/health-open" => Ok(routes::health_check(state, &path)),
        "/ready" | "/readyz" | "/debug-store" => Ok(routes::readiness_check(state).await),
        "/version" => Ok(routes::version_info()),
        _ => Err(GalleryError::NotFound("Not found".into())),
    };

    result.unwrap_or_else(|e| routes::error_response(&e))
}

/// Dev-mode state over in-memory stores
#[cfg(test)]
pub(crate) fn test_state() -> Arc<AppState> {
    use clap::Parser;

    let args = Args::try_parse_from(["showcase", "--dev-mode"]).unwrap();
    let folder = args.cloudinary.folder.clone();
    Arc::new(AppState::new(
        args,
        CredentialService::new_dev(),
        Arc::new(MemoryIdentityStore::new()),
        Arc::new(MemoryAssetRepository::new(folder)),
        StoreKinds {
            identities: "memory",
            assets: "memory",
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::test_support::{json_request, read_json};
    use http_body_util::Full;
    use hyper::StatusCode;
    use serde_json::json;

    fn get(uri: &str, token: Option<&str>) -> Request<Full<Bytes>> {
        let mut builder = Request::builder().method(Method::GET).uri(uri);
        if let Some(token) = token {
            builder = builder.header("Authorization", format!("Bearer {token}"));
        }
        builder.body(Full::new(Bytes::new())).unwrap()
    }

    #[tokio::test]
    async fn test_unknown_path_is_404() {
        let (status, body) = read_json(route(test_state(), get("/admin", None)).await).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn test_wrong_method_is_405() {
        let (status, body) = read_json(route(test_state(), get("/api/login", None)).await).await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(body["message"], "Method not allowed");
    }

    #[tokio::test]
    async fn test_preflight() {
        let req = Request::builder()
            .method(Method::OPTIONS)
            .uri("/api/upload")
            .body(Full::new(Bytes::new()))
            .unwrap();
        let response = route(test_state(), req).await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert_eq!(
            response.headers().get("Access-Control-Allow-Origin").unwrap(),
            "*"
        );
    }

    #[tokio::test]
    async fn test_end_to_end_signup_login_listing() {
        let state = test_state();

        let signup = json_request(
            Method::POST,
            "/api/signup",
            json!({"name": "John Smith", "role": "student", "pin": "1234"}),
        );
        let (status, body) = read_json(route(state.clone(), signup).await).await;
        assert_eq!(status, StatusCode::OK);
        let token = body["token"].as_str().unwrap().to_string();

        let bad_login = json_request(
            Method::POST,
            "/login",
            json!({"name": "John Smith", "role": "student", "pin": "0000"}),
        );
        let (status, body) = read_json(route(state.clone(), bad_login).await).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["message"], "Invalid name or PIN");

        let login = json_request(
            Method::POST,
            "/login",
            json!({"name": "John Smith", "role": "student", "pin": "1234"}),
        );
        let (_, body) = read_json(route(state.clone(), login).await).await;
        assert_eq!(body["name"], "John Smith");
        assert_eq!(body["role"], "student");

        let listing = get("/projects", Some(token.as_str()));
        let (status, body) = read_json(route(state.clone(), listing).await).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["count"], 0);
    }

    #[tokio::test]
    async fn test_upload_requires_student_credential() {
        let state = test_state();
        let req = Request::builder()
            .method(Method::POST)
            .uri("/upload")
            .header("Authorization", "Bearer not-a-token")
            .body(Full::new(Bytes::new()))
            .unwrap();

        let (status, body) = read_json(route(state, req).await).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["message"], "Please sign in as a student to upload.");
    }

    #[tokio::test]
    async fn test_invalid_name_is_400() {
        let req = json_request(Method::POST, "/signup", json!({"name": "Ada", "pin": "1"}));
        let (status, body) = read_json(route(test_state(), req).await).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body["message"],
            "Please enter your full name (letters only, at least two words)."
        );
    }
}
