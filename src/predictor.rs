//! Regression model behind `/predict`.
//!
//! The service only needs "four features in, one number out", so handlers
//! talk to a [`Predictor`] trait object. The production implementation is a
//! smartcore random forest persisted as JSON.

use std::{
    fs::File,
    io::BufReader,
    panic::{self, AssertUnwindSafe},
    path::Path,
    sync::Arc,
};

use smartcore::ensemble::random_forest_regressor::RandomForestRegressor;
use smartcore::linalg::basic::matrix::DenseMatrix;
use thiserror::Error;
use tracing::{debug, info};

// ---

/// Failures raised by a model while predicting.
#[derive(Debug, Error)]
pub enum PredictorError {
    #[error("matrix creation failed: {0}")]
    Input(String),

    #[error("model evaluation failed: {0}")]
    Model(String),

    #[error("model returned no prediction")]
    Empty,
}

/// An opaque, read-only regression model.
pub trait Predictor: Send + Sync {
    /// Predict from `[temperature, humidity, pressure, wind speed]`.
    fn predict(&self, features: &[f64; 4]) -> Result<f64, PredictorError>;

    /// Model name/type, shown by `GET /`.
    fn name(&self) -> &str;
}

/// Shared handle injected into the router state.
pub type SharedPredictor = Arc<dyn Predictor>;

type Forest = RandomForestRegressor<f64, f64, DenseMatrix<f64>, Vec<f64>>;

/// Typical mid-range conditions used to smoke-test a freshly loaded model.
const SMOKE_FEATURES: [f64; 4] = [25.0, 50.0, 1010.0, 3.0];

/// Random forest regressor loaded from a serde_json artifact.
pub struct ForestPredictor {
    model: Forest,
}

impl ForestPredictor {
    /// Deserialize the model stored at `path`.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        // ---
        let file = File::open(path)
            .map_err(|e| anyhow::anyhow!("Failed to open model file {:?}: {}", path, e))?;

        let model: Forest = serde_json::from_reader(BufReader::new(file))
            .map_err(|e| anyhow::anyhow!("Failed to deserialize model {:?}: {}", path, e))?;

        // serde accepts a forest with no trees; such a model only fails on predict
        let predictor = Self { model };
        predictor
            .smoke_test()
            .map_err(|e| anyhow::anyhow!("Model {:?} is not usable: {}", path, e))?;

        info!("Successfully loaded model from {:?}", path);
        Ok(predictor)
    }

    /// Run one prediction, treating a panic or a non-finite output as failure.
    fn smoke_test(&self) -> Result<f64, String> {
        // ---
        match panic::catch_unwind(AssertUnwindSafe(|| self.predict(&SMOKE_FEATURES))) {
            Ok(Ok(value)) if value.is_finite() => Ok(value),
            Ok(Ok(value)) => Err(format!("non-finite prediction {value}")),
            Ok(Err(e)) => Err(e.to_string()),
            Err(_) => Err("prediction panicked".to_string()),
        }
    }

    #[cfg(test)]
    pub fn from_model(model: Forest) -> Self {
        Self { model }
    }
}

impl Predictor for ForestPredictor {
    fn predict(&self, features: &[f64; 4]) -> Result<f64, PredictorError> {
        // ---
        let input = DenseMatrix::from_2d_vec(&vec![features.to_vec()])
            .map_err(|e| PredictorError::Input(e.to_string()))?;

        let predictions = self
            .model
            .predict(&input)
            .map_err(|e| PredictorError::Model(e.to_string()))?;

        let value = predictions.first().copied().ok_or(PredictorError::Empty)?;
        debug!(?features, value, "Forest prediction");
        Ok(value)
    }

    fn name(&self) -> &str {
        "SmartCore Random Forest"
    }
}
