// src/routes/health.rs
//! Liveness endpoint for the solarcast backend.
//!
//! This module defines the `/health` route used by container orchestrators
//! and load balancers to verify that the service is running and able to
//! respond to HTTP requests. The model is loaded before the server binds, so
//! a reachable `/health` also means the predictor is ready.

use axum::{routing::get, Json, Router};
use serde::Serialize;

/// JSON response body for the `/health` endpoint.
#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
}

/// Handle `GET /health`.
///
/// Returns a static JSON object. Does not call the model.
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

/// Create a subrouter containing the `/health` route.
///
/// This router is generic over the application state so it can merge cleanly
/// with the gateway router, regardless of the state type.
pub fn router<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    Router::new().route("/health", get(health))
}
