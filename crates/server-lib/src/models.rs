//! Wire types shared by the HTTP API

use crate::cities::City;
use crate::forecast::WeatherCondition;
use serde::{Deserialize, Serialize};

/// City entry in the `/api/cities` listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CitySummary {
    pub id: String,
    pub name: String,
    pub country: String,
}

impl From<&City> for CitySummary {
    fn from(city: &City) -> Self {
        Self {
            id: city.id.to_string(),
            name: city.name.to_string(),
            country: city.country.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CityList {
    pub cities: Vec<CitySummary>,
}

/// City block of a weather report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CityWeatherInfo {
    pub id: String,
    pub name: String,
    pub country: String,
    pub condition: Option<WeatherCondition>,
}

/// Response of `/api/weather/{city_id}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherReport {
    pub city: CityWeatherInfo,
    pub current: f64,
    pub five_day_avg: f64,
}

/// Response of a successful `/predict`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PredictionResponse {
    pub predicted_temperature: f64,
}

/// Error body returned for every non-2xx API response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self { error: error.into() }
    }
}
