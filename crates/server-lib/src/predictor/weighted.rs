//! Weighted moving-average estimator
//!
//! Weights rise linearly from 1.0 on the oldest observation to 2.0 on the
//! most recent one, so recent readings pull the estimate harder.

use super::window::{TemperatureWindow, WINDOW_LEN};
use super::Predictor;
use anyhow::Result;

/// Weight applied to the oldest observation
pub const MIN_WEIGHT: f64 = 1.0;

/// Weight applied to the most recent observation
pub const MAX_WEIGHT: f64 = 2.0;

/// Dependency-free predictor used when no trained model is loaded
#[derive(Debug, Clone, Copy, Default)]
pub struct WeightedAveragePredictor;

impl WeightedAveragePredictor {
    pub fn new() -> Self {
        Self
    }

    /// Weight for position `i`, evenly spaced over `[MIN_WEIGHT, MAX_WEIGHT]`
    pub fn weight(i: usize) -> f64 {
        MIN_WEIGHT + (MAX_WEIGHT - MIN_WEIGHT) * i as f64 / (WINDOW_LEN - 1) as f64
    }

    pub fn estimate(&self, window: &TemperatureWindow) -> f64 {
        let anchored = Self::anchored_average(window);
        if anchored.is_finite() {
            anchored
        } else {
            Self::normalized_average(window)
        }
    }

    /// Centred on the oldest value so a constant window comes back exact.
    /// Overflows when the spread between readings exceeds `f64::MAX`.
    fn anchored_average(window: &TemperatureWindow) -> f64 {
        let anchor = window.values()[0];
        let (weighted_sum, weight_sum) = window
            .iter()
            .enumerate()
            .fold((0.0, 0.0), |(acc, total), (i, value)| {
                let w = Self::weight(i);
                (acc + w * (value - anchor), total + w)
            });
        anchor + weighted_sum / weight_sum
    }

    /// Weights scaled to sum to one; partial sums stay within the largest
    /// reading, so finite input gives a finite result.
    fn normalized_average(window: &TemperatureWindow) -> f64 {
        let weight_sum: f64 = (0..WINDOW_LEN).map(Self::weight).sum();
        window
            .iter()
            .enumerate()
            .map(|(i, value)| Self::weight(i) / weight_sum * value)
            .sum()
    }
}

impl Predictor for WeightedAveragePredictor {
    fn predict(&self, window: &TemperatureWindow) -> Result<f64> {
        let value = self.estimate(window);
        if !value.is_finite() {
            anyhow::bail!("Weighted average is not finite ({})", value);
        }
        Ok(value)
    }

    fn name(&self) -> &str {
        "weighted_average"
    }
}
