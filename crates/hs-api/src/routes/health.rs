//! # Health Probes
//!
//! - GET /health/liveness — always `ok` while the process runs
//! - GET /health/readiness — `ready` once the schema directory is readable

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::Router;

use crate::hypermedia::HyperMedia;

/// Health probe router.
pub fn router() -> Router<HyperMedia> {
    Router::new()
        .route("/health/liveness", get(liveness))
        .route("/health/readiness", get(readiness))
}

/// Liveness probe.
async fn liveness() -> &'static str {
    "ok"
}

/// Readiness probe: 503 until the schema directory exists.
async fn readiness(State(hm): State<HyperMedia>) -> (StatusCode, &'static str) {
    if hm.registry().is_available() {
        (StatusCode::OK, "ready")
    } else {
        tracing::warn!(
            path = %hm.registry().schema_path().display(),
            "schema directory unavailable"
        );
        (StatusCode::SERVICE_UNAVAILABLE, "schema directory unavailable")
    }
}
