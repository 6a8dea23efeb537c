//! Health check endpoints
//!
//! - /health, /healthz, /health-open - Liveness probe (is the service running?)
//! - /ready, /readyz, /debug-store - Readiness probe (do both stores answer?)
//! - /version - Build information
//!
//! Readiness never reports store error text; failures are logged instead.

use hyper::{Response, StatusCode};
use serde::Serialize;
use std::sync::Arc;
use tracing::warn;

use crate::routes::{json_response, BoxBody};
use crate::server::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub ok: bool,
    /// Path the probe was requested on
    pub route: String,
    pub time: String,
    pub version: &'static str,
    /// `development` or `production`
    pub mode: &'static str,
    pub uptime: u64,
}

#[derive(Serialize)]
pub struct DependencyHealth {
    pub ok: bool,
    pub kind: &'static str,
}

#[derive(Serialize)]
pub struct ReadinessResponse {
    pub ok: bool,
    pub identity_store: DependencyHealth,
    pub asset_repository: DependencyHealth,
}

fn mode(state: &AppState) -> &'static str {
    if state.args.dev_mode {
        "development"
    } else {
        "production"
    }
}

/// Handle liveness probe
pub fn health_check(state: Arc<AppState>, route: &str) -> Response<BoxBody> {
    json_response(
        StatusCode::OK,
        &HealthResponse {
            ok: true,
            route: route.trim_start_matches('/').to_string(),
            time: chrono::Utc::now().to_rfc3339(),
            version: env!("CARGO_PKG_VERSION"),
            mode: mode(&state),
            uptime: state.started_at.elapsed().as_secs(),
        },
    )
}

/// Handle readiness probe
///
/// 200 only when the identity store and the asset repository both answer.
pub async fn readiness_check(state: Arc<AppState>) -> Response<BoxBody> {
    let (identities, assets) = tokio::join!(state.identities.ping(), state.assets.ping());

    if let Err(e) = &identities {
        warn!("Identity store not ready: {}", e);
    }
    if let Err(e) = &assets {
        warn!("Asset repository not ready: {}", e);
    }

    let response = ReadinessResponse {
        ok: identities.is_ok() && assets.is_ok(),
        identity_store: DependencyHealth {
            ok: identities.is_ok(),
            kind: state.store_kinds.identities,
        },
        asset_repository: DependencyHealth {
            ok: assets.is_ok(),
            kind: state.store_kinds.assets,
        },
    };

    let status = if response.ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    json_response(status, &response)
}

/// Version information for deployment verification
#[derive(Serialize)]
pub struct VersionResponse {
    /// Cargo package version
    pub version: &'static str,
    /// Git commit hash (short)
    pub commit: &'static str,
    /// Git commit hash (full)
    pub commit_full: &'static str,
    /// Build timestamp
    pub build_time: &'static str,
    /// Service name
    pub service: &'static str,
}

/// Handle version endpoint (/version)
pub fn version_info() -> Response<BoxBody> {
    json_response(
        StatusCode::OK,
        &VersionResponse {
            version: env!("CARGO_PKG_VERSION"),
            commit: option_env!("GIT_COMMIT_SHORT").unwrap_or("unknown"),
            commit_full: option_env!("GIT_COMMIT_FULL").unwrap_or("unknown"),
            build_time: option_env!("BUILD_TIMESTAMP").unwrap_or("unknown"),
            service: env!("CARGO_PKG_NAME"),
        },
    )
}
