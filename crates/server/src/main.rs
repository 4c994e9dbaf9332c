//! Tempcast server
//!
//! Serves city weather from Open-Meteo and next-temperature predictions.
//! The estimator is chosen once at startup: the trained model when its
//! artifacts load, the weighted moving average otherwise.

use anyhow::{Context, Result};
use server_lib::{
    forecast::OpenMeteoClient,
    health::{components, HealthRegistry},
    observability::{ServerMetrics, StructuredLogger},
    predictor::{self, EstimatorMode},
};
use std::sync::Arc;
use tempcast_server::{api, config};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with JSON output and env filter
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().json())
        .init();

    info!("Starting tempcast-server");

    let config = config::ServerConfig::load()?;
    info!(instance = %config.instance_name, "Server configured");

    let logger = StructuredLogger::new(&config.instance_name);
    let metrics = ServerMetrics::new();
    let health_registry = HealthRegistry::new();
    health_registry.register(components::PREDICTOR).await;
    health_registry.register(components::FORECAST).await;

    // Committed for the lifetime of the process
    let estimator = Arc::new(predictor::select(&config.artifact_paths()));
    let mode = estimator.mode();
    logger.log_estimator_selected(mode, estimator.model_digest());
    metrics.set_estimator(mode, estimator.model_digest());
    if mode == EstimatorMode::Fallback {
        health_registry
            .set_degraded(components::PREDICTOR, "model artifacts unavailable, using weighted moving average")
            .await;
    }

    let forecast = OpenMeteoClient::new(&config.forecast_base_url, config.forecast_timeout())
        .context("Failed to create forecast client")?;

    let app_state = Arc::new(api::AppState::new(
        estimator.clone(),
        Arc::new(forecast),
        health_registry.clone(),
        metrics,
        logger.clone(),
    ));

    health_registry.set_ready(true).await;

    let addr = config.listen_addr();
    logger.log_startup(SERVER_VERSION, &addr);

    api::serve(&addr, app_state, async {
        // Keep serving if the signal handler cannot be installed.
        if tokio::signal::ctrl_c().await.is_err() {
            std::future::pending::<()>().await;
        }
    })
    .await?;

    if let Some(stats) = estimator.inference_stats() {
        info!(
            total_inferences = stats.total_inferences,
            slow_inferences = stats.slow_inferences,
            "Model inference summary"
        );
    }
    logger.log_shutdown("SIGINT received");

    Ok(())
}
