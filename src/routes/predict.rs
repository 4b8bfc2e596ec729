//! `POST /predict` route.
//!
//! Decodes the body into a [`PredictRequest`], hands it to the prediction
//! handler and renders the [`PredictionResult`]. Failures are reported
//! in-band with a 200 unless `STRICT_STATUS` is enabled, in which case the
//! same body is sent with a 4xx/5xx status.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde_json::{json, Value};
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::config::{OutputStyle, PredictionSettings};
use crate::prediction::{self, PredictionError, PredictionResult};
use crate::{AppState, PredictRequest};

// ---

pub fn router() -> Router<AppState> {
    // ---
    Router::new().route("/predict", post(handler))
}

async fn handler(
    State((predictor, config)): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Response {
    // ---
    let request_id = Uuid::new_v4();
    let settings = config.prediction;

    let result = async move {
        info!("POST /predict - Starting");

        let request = match body {
            Ok(Json(value)) => PredictRequest::from_json(value),
            Err(rejection) => Err(rejection.body_text()),
        };

        let result = match request {
            Ok(request) => prediction::handle(request, predictor, &settings).await,
            Err(reason) => PredictionResult::Error(PredictionError::InvalidBody(reason)),
        };

        match &result {
            PredictionResult::Error(e) => warn!("POST /predict - Failed: {}", e),
            ok => info!("POST /predict - Returning {:?}", ok),
        }
        result
    }
    .instrument(info_span!("predict", %request_id))
    .await;

    render(&result, &settings)
}

/// Turn a result into the response body and status.
fn render(result: &PredictionResult, settings: &PredictionSettings) -> Response {
    // ---
    let (status, body) = match result {
        PredictionResult::Value(value) => (StatusCode::OK, json!({ "prediction": value })),
        PredictionResult::Formatted(text) => (StatusCode::OK, json!({ "prediction": text })),
        PredictionResult::Error(e) => {
            let status = if settings.strict_status {
                status_for(e)
            } else {
                StatusCode::OK
            };
            let body = match settings.output_style {
                OutputStyle::Number => json!({ "error": e.to_string() }),
                OutputStyle::Formatted => json!({ "prediction": format!("❌ Error: {e}") }),
            };
            (status, body)
        }
    };

    (status, Json(body)).into_response()
}

fn status_for(error: &PredictionError) -> StatusCode {
    match error {
        PredictionError::InvalidBody(_) => StatusCode::BAD_REQUEST,
        PredictionError::Extraction(_) => StatusCode::UNPROCESSABLE_ENTITY,
        PredictionError::PredictorFailure => StatusCode::INTERNAL_SERVER_ERROR,
    }
}
