//! Server configuration

use anyhow::{Context, Result};
use serde::Deserialize;
use server_lib::forecast::DEFAULT_BASE_URL;
use server_lib::predictor::ArtifactPaths;
use std::time::Duration;

/// Server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Instance name attached to structured log events
    #[serde(default = "default_instance_name")]
    pub instance_name: String,

    /// Address the HTTP API binds to
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// HTTP API port
    #[serde(default = "default_api_port")]
    pub api_port: u16,

    /// Trained ONNX model artifact
    #[serde(default = "default_model_path")]
    pub model_path: String,

    /// JSON scaler artifact paired with the model
    #[serde(default = "default_scaler_path")]
    pub scaler_path: String,

    /// Open-Meteo forecast endpoint
    #[serde(default = "default_forecast_base_url")]
    pub forecast_base_url: String,

    /// Upstream request timeout in seconds
    #[serde(default = "default_forecast_timeout")]
    pub forecast_timeout_secs: u64,
}

fn default_instance_name() -> String {
    std::env::var("HOSTNAME").unwrap_or_else(|_| "unknown".to_string())
}

fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}

fn default_api_port() -> u16 {
    5000
}

fn default_model_path() -> String {
    "lstm_weather_model.onnx".to_string()
}

fn default_scaler_path() -> String {
    "scaler.json".to_string()
}

fn default_forecast_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_forecast_timeout() -> u64 {
    10
}

impl ServerConfig {
    /// Load configuration from an optional `tempcast.*` file and `TEMPCAST_*`
    /// environment variables (environment wins)
    pub fn load() -> Result<Self> {
        Self::from_sources("tempcast", "TEMPCAST")
    }

    fn from_sources(file_stem: &str, env_prefix: &str) -> Result<Self> {
        let config = config::Config::builder()
            .add_source(config::File::with_name(file_stem).required(false))
            .add_source(config::Environment::with_prefix(env_prefix))
            .build()
            .context("Failed to read configuration")?;

        config
            .try_deserialize()
            .context("Invalid configuration")
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.bind_address, self.api_port)
    }

    pub fn artifact_paths(&self) -> ArtifactPaths {
        ArtifactPaths::new(&self.model_path, &self.scaler_path)
    }

    pub fn forecast_timeout(&self) -> Duration {
        Duration::from_secs(self.forecast_timeout_secs)
    }
}
