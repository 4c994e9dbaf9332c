//! Input scaling for the model-backed predictor
//!
//! Loaded from a small JSON document next to the model file. The model
//! sees scaled values; its output is mapped back to degrees with the
//! inverse transform.

use serde::{Deserialize, Serialize};

/// Single-feature scaling transform
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Scaler {
    /// Maps `[data_min, data_max]` onto `feature_range`
    MinMax {
        data_min: f64,
        data_max: f64,
        #[serde(default = "default_feature_range")]
        feature_range: (f64, f64),
    },
    /// Subtracts `mean` and divides by `scale`
    Standard { mean: f64, scale: f64 },
}

fn default_feature_range() -> (f64, f64) {
    (0.0, 1.0)
}

impl Scaler {
    /// Reject parameters that would make the transform non-invertible
    pub fn validate(&self) -> Result<(), String> {
        match *self {
            Scaler::MinMax { data_min, data_max, feature_range: (lo, hi) } => {
                if ![data_min, data_max, lo, hi].iter().all(|v| v.is_finite()) {
                    return Err("min_max parameters must be finite".to_string());
                }
                if data_max <= data_min {
                    return Err(format!("data_max ({}) must exceed data_min ({})", data_max, data_min));
                }
                if hi <= lo {
                    return Err(format!("feature_range upper bound ({}) must exceed lower ({})", hi, lo));
                }
                Ok(())
            }
            Scaler::Standard { mean, scale } => {
                if !mean.is_finite() || !scale.is_finite() {
                    return Err("standard parameters must be finite".to_string());
                }
                if scale <= 0.0 {
                    return Err(format!("scale ({}) must be positive", scale));
                }
                Ok(())
            }
        }
    }

    pub fn transform(&self, value: f64) -> f64 {
        match *self {
            Scaler::MinMax { data_min, data_max, feature_range: (lo, hi) } => {
                lo + (value - data_min) * (hi - lo) / (data_max - data_min)
            }
            Scaler::Standard { mean, scale } => (value - mean) / scale,
        }
    }

    pub fn inverse_transform(&self, value: f64) -> f64 {
        match *self {
            Scaler::MinMax { data_min, data_max, feature_range: (lo, hi) } => {
                data_min + (value - lo) * (data_max - data_min) / (hi - lo)
            }
            Scaler::Standard { mean, scale } => value * scale + mean,
        }
    }
}
