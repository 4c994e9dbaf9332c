//! Upstream forecast data
//!
//! The weather endpoint only needs the current temperature, the current
//! condition and the daily max/min series; everything else the provider
//! returns is ignored.

mod condition;
mod open_meteo;

pub use condition::WeatherCondition;
pub use open_meteo::{OpenMeteoClient, DEFAULT_BASE_URL};

use crate::cities::Coordinates;
use async_trait::async_trait;

/// Number of leading daily maxima averaged into `five_day_avg`
pub const AVERAGE_DAYS: usize = 5;

/// Forecast provider errors
#[derive(Debug, thiserror::Error)]
pub enum ForecastError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("Upstream returned status {0}")]
    Status(u16),
    #[error("Parse error: {0}")]
    Parse(String),
}

/// Subset of a forecast used by the weather endpoint
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastSnapshot {
    pub current_temperature: f64,
    pub condition: Option<WeatherCondition>,
    pub daily_max: Vec<f64>,
    pub daily_min: Vec<f64>,
}

impl ForecastSnapshot {
    /// Mean of the first (up to) five daily maxima
    pub fn five_day_average(&self) -> Option<f64> {
        let days: Vec<f64> = self.daily_max.iter().copied().take(AVERAGE_DAYS).collect();
        if days.is_empty() {
            return None;
        }
        Some(days.iter().sum::<f64>() / days.len() as f64)
    }
}

/// Source of forecast data for a location
#[async_trait]
pub trait ForecastSource: Send + Sync {
    async fn fetch(&self, coordinates: &Coordinates) -> Result<ForecastSnapshot, ForecastError>;
}
