// src/routes/health.rs
//! Liveness endpoints for the AirLens backend.
//!
//! - `GET /health` is used by container orchestrators and CI pipelines to
//!   verify that the service is running.
//! - `GET /api/` is the API banner clients hit to confirm they reached the
//!   right service and version.
//!
//! Neither touches the store.

use axum::{routing::get, Json, Router};
use serde::Serialize;

/// JSON response body for the `/health` endpoint.
#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
}

/// JSON response body for the API root.
#[derive(Serialize)]
struct RootResponse {
    message: &'static str,
    version: &'static str,
    status: &'static str,
}

/// Handle `GET /health`.
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

/// Handle `GET /api/`.
async fn root() -> Json<RootResponse> {
    Json(RootResponse {
        message: "AirLens NO₂ Processing API",
        version: env!("CARGO_PKG_VERSION"),
        status: "active",
    })
}

/// Create a subrouter containing the liveness routes.
///
/// This router is generic over the application state so it can merge cleanly
/// with the gateway router, regardless of the state type.
///
/// # Type Parameters
/// - `S`: Application state type shared by all routes in the gateway.
pub fn router<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    Router::new()
        .route("/health", get(health))
        .route("/api", get(root))
        .route("/api/", get(root))
}
