//! `GET /` info endpoint.
//!
//! Reports that the service is up and which model it is serving. Reads the
//! shared state only; no side effects.

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use crate::AppState;

/// JSON response body for `GET /`.
#[derive(Serialize)]
struct InfoResponse {
    message: &'static str,
    model: String,
    version: &'static str,
}

async fn info(State((predictor, _config)): State<AppState>) -> Json<InfoResponse> {
    Json(InfoResponse {
        message: "Solar power prediction API is running",
        model: predictor.name().to_string(),
        version: env!("CARGO_PKG_VERSION"),
    })
}

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(info))
}
