//! Temperature prediction engine

mod inference;
mod scaler;
mod selector;
mod weighted;
mod window;

pub use inference::{InferenceStats, ModelPredictor, OnnxSequenceModel, SequenceModel};
pub use scaler::Scaler;
pub use selector::{load_artifacts, load_scaler, select, ArtifactPaths, LoadError};
pub use weighted::{WeightedAveragePredictor, MAX_WEIGHT, MIN_WEIGHT};
pub use window::{TemperatureWindow, ValidationError, WINDOW_LEN};

use anyhow::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Trait for prediction implementations
pub trait Predictor: Send + Sync {
    /// Predict the next temperature from a validated window
    fn predict(&self, window: &TemperatureWindow) -> Result<f64>;

    /// Short identifier used in logs
    fn name(&self) -> &str;
}

/// Which estimator the process committed to at startup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EstimatorMode {
    Fallback,
    Model,
}

impl EstimatorMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            EstimatorMode::Fallback => "fallback",
            EstimatorMode::Model => "model",
        }
    }
}

impl fmt::Display for EstimatorMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure of a single prediction request
#[derive(Debug, thiserror::Error)]
pub enum PredictError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("prediction failed: {0:#}")]
    Inference(anyhow::Error),
}

/// The estimator chosen for the lifetime of the process.
///
/// Built once by [`select`] and shared read-only; the two variants never
/// serve the same request.
pub enum Estimator {
    Fallback(WeightedAveragePredictor),
    Model(ModelPredictor),
}

impl Estimator {
    pub fn fallback() -> Self {
        Estimator::Fallback(WeightedAveragePredictor::new())
    }

    pub fn mode(&self) -> EstimatorMode {
        match self {
            Estimator::Fallback(_) => EstimatorMode::Fallback,
            Estimator::Model(_) => EstimatorMode::Model,
        }
    }

    /// Digest of the loaded model, `None` in fallback mode
    pub fn model_digest(&self) -> Option<&str> {
        match self {
            Estimator::Fallback(_) => None,
            Estimator::Model(model) => Some(model.digest()),
        }
    }

    pub fn inference_stats(&self) -> Option<InferenceStats> {
        match self {
            Estimator::Fallback(_) => None,
            Estimator::Model(model) => Some(model.stats()),
        }
    }

    fn active(&self) -> &dyn Predictor {
        match self {
            Estimator::Fallback(p) => p,
            Estimator::Model(p) => p,
        }
    }

    pub fn predict(&self, window: &TemperatureWindow) -> Result<f64> {
        self.active().predict(window)
    }

    /// Validate untyped request data and predict.
    ///
    /// Validation always completes before the active predictor runs.
    pub fn predict_from_sequence(&self, raw: &Value) -> Result<f64, PredictError> {
        let window = TemperatureWindow::from_json(raw)?;
        self.predict(&window).map_err(PredictError::Inference)
    }
}

impl fmt::Debug for Estimator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Estimator")
            .field("mode", &self.mode())
            .field("predictor", &self.active().name())
            .field("model_digest", &self.model_digest())
            .finish()
    }
}
