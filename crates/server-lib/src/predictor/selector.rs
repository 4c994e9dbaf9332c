//! Startup estimator selection
//!
//! Loads the trained model and its scaler when both artifacts are on disk.
//! Every load problem is returned as a `LoadError`; `select` turns those
//! into the weighted-average fallback so the server always starts.

use super::inference::{ModelPredictor, OnnxSequenceModel};
use super::scaler::Scaler;
use super::weighted::WeightedAveragePredictor;
use super::Estimator;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Hex characters of the SHA-256 kept as the model digest
const DIGEST_LEN: usize = 12;

/// Locations of the model and scaler artifacts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub model: PathBuf,
    pub scaler: PathBuf,
}

impl ArtifactPaths {
    pub fn new(model: impl Into<PathBuf>, scaler: impl Into<PathBuf>) -> Self {
        Self {
            model: model.into(),
            scaler: scaler.into(),
        }
    }

    /// First artifact missing from disk, if any
    fn first_missing(&self) -> Option<&Path> {
        [self.model.as_path(), self.scaler.as_path()]
            .into_iter()
            .find(|path| !path.exists())
    }
}

/// Reasons the model-backed estimator could not be built
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("artifact not found: {}", path.display())]
    Unavailable { path: PathBuf },

    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to load model {}: {reason}", path.display())]
    Model { path: PathBuf, reason: String },

    #[error("failed to parse scaler {}: {source}", path.display())]
    Scaler {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid scaler {}: {reason}", path.display())]
    InvalidScaler { path: PathBuf, reason: String },
}

impl LoadError {
    /// True when the artifacts simply are not deployed
    pub fn is_unavailable(&self) -> bool {
        matches!(self, LoadError::Unavailable { .. })
    }
}

/// Load both artifacts into a model-backed predictor.
///
/// Nothing is read unless both files exist.
pub fn load_artifacts(paths: &ArtifactPaths) -> Result<ModelPredictor, LoadError> {
    if let Some(missing) = paths.first_missing() {
        return Err(LoadError::Unavailable { path: missing.to_path_buf() });
    }

    let model_bytes = fs::read(&paths.model).map_err(|source| LoadError::Read {
        path: paths.model.clone(),
        source,
    })?;
    let scaler = load_scaler(&paths.scaler)?;

    let model = OnnxSequenceModel::from_bytes(&model_bytes).map_err(|e| LoadError::Model {
        path: paths.model.clone(),
        reason: format!("{:#}", e),
    })?;

    Ok(ModelPredictor::new(Box::new(model), scaler, digest(&model_bytes)))
}

/// Read and check a JSON scaler description
pub fn load_scaler(path: &Path) -> Result<Scaler, LoadError> {
    let content = fs::read_to_string(path).map_err(|source| LoadError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let scaler: Scaler = serde_json::from_str(&content).map_err(|source| LoadError::Scaler {
        path: path.to_path_buf(),
        source,
    })?;
    scaler.validate().map_err(|reason| LoadError::InvalidScaler {
        path: path.to_path_buf(),
        reason,
    })?;
    Ok(scaler)
}

fn digest(bytes: &[u8]) -> String {
    let mut hex = hex::encode(Sha256::digest(bytes));
    hex.truncate(DIGEST_LEN);
    hex
}

/// Pick the estimator for this process: the model when it loads, the
/// weighted average otherwise.
pub fn select(paths: &ArtifactPaths) -> Estimator {
    match load_artifacts(paths) {
        Ok(predictor) => {
            info!(
                model = %paths.model.display(),
                scaler = %paths.scaler.display(),
                digest = %predictor.digest(),
                "Loaded model and scaler"
            );
            Estimator::Model(predictor)
        }
        Err(e) if e.is_unavailable() => {
            info!(reason = %e, "Model/scaler not found, using weighted moving-average fallback");
            Estimator::Fallback(WeightedAveragePredictor::new())
        }
        Err(e) => {
            warn!(error = %e, "Failed to load model artifacts, using weighted moving-average fallback");
            Estimator::Fallback(WeightedAveragePredictor::new())
        }
    }
}
