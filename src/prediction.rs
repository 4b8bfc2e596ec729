//! Prediction handler: one request in, one [`PredictionResult`] out.
//!
//! Every failure is turned into a value here. Nothing a client sends, and
//! nothing the model does, is allowed to escape as a panic or a rejected
//! request.

use thiserror::Error;
use tracing::{debug, error};

use crate::config::{OutputStyle, PredictionSettings};
use crate::extract::{self, ExtractionError};
use crate::models::PredictRequest;
use crate::predictor::SharedPredictor;

// ---

/// Unit appended in formatted output.
pub const UNIT: &str = "W/m²";

/// Message returned when the model itself fails; details are only logged.
pub const PREDICTOR_FAILURE: &str = "prediction failed";

/// A request that could not produce a prediction.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PredictionError {
    #[error("{0}")]
    Extraction(#[from] ExtractionError),

    #[error("invalid request: {0}")]
    InvalidBody(String),

    #[error("{}", PREDICTOR_FAILURE)]
    PredictorFailure,
}

/// Outcome of one `/predict` call.
#[derive(Debug, Clone, PartialEq)]
pub enum PredictionResult {
    /// Prediction rounded to 2 decimal places.
    Value(f64),
    /// Rounded prediction embedded in a sentence with its unit.
    Formatted(String),
    Error(PredictionError),
}

/// Round half away from zero to 2 decimal places.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Shape a raw model output according to `style`.
pub fn shape(value: f64, style: OutputStyle) -> PredictionResult {
    let rounded = round2(value);
    match style {
        OutputStyle::Number => PredictionResult::Value(rounded),
        OutputStyle::Formatted => {
            PredictionResult::Formatted(format!("Predicted power output: {rounded:.2} {UNIT}"))
        }
    }
}

/// Run one request through extraction, the model and output shaping.
pub async fn handle(
    request: PredictRequest,
    predictor: SharedPredictor,
    settings: &PredictionSettings,
) -> PredictionResult {
    // ---
    match run(request, predictor, settings).await {
        Ok(value) => shape(value, settings.output_style),
        Err(e) => PredictionResult::Error(e),
    }
}

async fn run(
    request: PredictRequest,
    predictor: SharedPredictor,
    settings: &PredictionSettings,
) -> Result<f64, PredictionError> {
    // ---
    let reading = extract::extract(&request, settings)?;
    debug!(?reading, "Features extracted");

    let features = reading.to_features();

    // The model is CPU-bound; keep it off the async workers. A panic inside
    // it surfaces here as a JoinError.
    let outcome = tokio::task::spawn_blocking(move || predictor.predict(&features)).await;

    match outcome {
        Ok(Ok(value)) if value.is_finite() => Ok(value),
        Ok(Ok(value)) => {
            error!(value, "Model returned a non-finite prediction");
            Err(PredictionError::PredictorFailure)
        }
        Ok(Err(e)) => {
            error!("Model failed: {}", e);
            Err(PredictionError::PredictorFailure)
        }
        Err(e) => {
            error!("Model task aborted: {}", e);
            Err(PredictionError::PredictorFailure)
        }
    }
}
