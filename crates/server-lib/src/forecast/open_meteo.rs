//! Open-Meteo forecast client
//!
//! API: `https://api.open-meteo.com/v1/forecast`, no key required.

use super::{ForecastError, ForecastSnapshot, ForecastSource, WeatherCondition};
use crate::cities::Coordinates;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::{Duration, Instant};
use tracing::debug;
use url::Url;

pub const DEFAULT_BASE_URL: &str = "https://api.open-meteo.com/v1/forecast";

#[derive(Debug, Deserialize)]
struct OpenMeteoResponse {
    #[serde(default)]
    current: Option<OpenMeteoCurrent>,
    #[serde(default)]
    daily: Option<OpenMeteoDaily>,
}

#[derive(Debug, Deserialize)]
struct OpenMeteoCurrent {
    #[serde(default)]
    temperature_2m: Option<f64>,
    #[serde(default)]
    weather_code: Option<i32>,
}

#[derive(Debug, Deserialize)]
struct OpenMeteoDaily {
    #[serde(default)]
    temperature_2m_max: Vec<Option<f64>>,
    #[serde(default)]
    temperature_2m_min: Vec<Option<f64>>,
}

impl TryFrom<OpenMeteoResponse> for ForecastSnapshot {
    type Error = ForecastError;

    fn try_from(response: OpenMeteoResponse) -> Result<Self, Self::Error> {
        let current = response
            .current
            .ok_or_else(|| ForecastError::Parse("missing 'current' block".to_string()))?;
        let current_temperature = current
            .temperature_2m
            .ok_or_else(|| ForecastError::Parse("missing current temperature_2m".to_string()))?;
        let daily = response
            .daily
            .ok_or_else(|| ForecastError::Parse("missing 'daily' block".to_string()))?;

        // Days the provider has no value for are skipped.
        let daily_max: Vec<f64> = daily.temperature_2m_max.into_iter().flatten().collect();
        let daily_min: Vec<f64> = daily.temperature_2m_min.into_iter().flatten().collect();
        if daily_max.is_empty() {
            return Err(ForecastError::Parse("empty daily temperature_2m_max".to_string()));
        }

        Ok(ForecastSnapshot {
            current_temperature,
            condition: current.weather_code.and_then(WeatherCondition::from_wmo_code),
            daily_max,
            daily_min,
        })
    }
}

/// HTTP client for the Open-Meteo forecast endpoint
#[derive(Debug, Clone)]
pub struct OpenMeteoClient {
    client: Client,
    base_url: Url,
}

impl OpenMeteoClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ForecastError> {
        let client = Client::builder().timeout(timeout).build()?;
        let base_url = Url::parse(base_url)
            .map_err(|e| ForecastError::Parse(format!("invalid base url '{}': {}", base_url, e)))?;
        Ok(Self { client, base_url })
    }

    fn request_url(&self, coordinates: &Coordinates) -> Url {
        let mut url = self.base_url.clone();
        url.query_pairs_mut()
            .append_pair("latitude", &coordinates.latitude.to_string())
            .append_pair("longitude", &coordinates.longitude.to_string())
            .append_pair("current", "temperature_2m,weather_code")
            .append_pair("daily", "temperature_2m_max,temperature_2m_min")
            .append_pair("timezone", "auto");
        url
    }
}

#[async_trait]
impl ForecastSource for OpenMeteoClient {
    async fn fetch(&self, coordinates: &Coordinates) -> Result<ForecastSnapshot, ForecastError> {
        let start = Instant::now();
        let url = self.request_url(coordinates);

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ForecastError::Status(status.as_u16()));
        }

        let body = response.bytes().await?;
        let parsed: OpenMeteoResponse =
            serde_json::from_slice(&body).map_err(|e| ForecastError::Parse(e.to_string()))?;

        debug!(
            latitude = coordinates.latitude,
            longitude = coordinates.longitude,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Fetched forecast"
        );
        ForecastSnapshot::try_from(parsed)
    }
}
