//! Observability infrastructure for the server
//!
//! Provides:
//! - Prometheus metrics (prediction latency, predictions by mode,
//!   validation rejections, forecast latency and errors, estimator info)
//! - Structured JSON logging with tracing

use crate::predictor::EstimatorMode;
use prometheus::{
    register_gauge_vec, register_histogram, register_int_counter, register_int_counter_vec,
    GaugeVec, Histogram, IntCounter, IntCounterVec,
};
use std::sync::OnceLock;
use tracing::{info, warn};

/// Histogram buckets for in-process prediction latency (seconds)
const PREDICTION_BUCKETS: &[f64] = &[
    0.000001, 0.000005, 0.00001, 0.00005, 0.0001, 0.0005, 0.001, 0.005, 0.01, 0.05,
];

/// Histogram buckets for upstream forecast latency (seconds)
const FORECAST_BUCKETS: &[f64] = &[0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0];

/// Global metrics instance (registered once)
static GLOBAL_METRICS: OnceLock<ServerMetricsInner> = OnceLock::new();

struct ServerMetricsInner {
    prediction_latency_seconds: Histogram,
    predictions_total: IntCounterVec,
    validation_rejections_total: IntCounterVec,
    prediction_errors_total: IntCounter,
    forecast_latency_seconds: Histogram,
    forecast_errors_total: IntCounter,
    estimator_info: GaugeVec,
}

impl ServerMetricsInner {
    fn new() -> Self {
        Self {
            prediction_latency_seconds: register_histogram!(
                "tempcast_prediction_latency_seconds",
                "Time spent producing a temperature prediction",
                PREDICTION_BUCKETS.to_vec()
            )
            .expect("Failed to register prediction_latency_seconds"),

            predictions_total: register_int_counter_vec!(
                "tempcast_predictions_total",
                "Predictions served, by estimator mode",
                &["mode"]
            )
            .expect("Failed to register predictions_total"),

            validation_rejections_total: register_int_counter_vec!(
                "tempcast_validation_rejections_total",
                "Prediction requests rejected by input validation",
                &["kind"]
            )
            .expect("Failed to register validation_rejections_total"),

            prediction_errors_total: register_int_counter!(
                "tempcast_prediction_errors_total",
                "Prediction requests that failed during inference"
            )
            .expect("Failed to register prediction_errors_total"),

            forecast_latency_seconds: register_histogram!(
                "tempcast_forecast_latency_seconds",
                "Time spent fetching forecasts from the upstream provider",
                FORECAST_BUCKETS.to_vec()
            )
            .expect("Failed to register forecast_latency_seconds"),

            forecast_errors_total: register_int_counter!(
                "tempcast_forecast_errors_total",
                "Failed upstream forecast requests"
            )
            .expect("Failed to register forecast_errors_total"),

            estimator_info: register_gauge_vec!(
                "tempcast_estimator_info",
                "Estimator selected at startup",
                &["mode", "model_digest"]
            )
            .expect("Failed to register estimator_info"),
        }
    }
}

/// Server metrics for Prometheus exposition
///
/// Lightweight handle to the global metrics instance; clones share the
/// same underlying metrics.
#[derive(Clone)]
pub struct ServerMetrics {
    _private: (),
}

impl Default for ServerMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl ServerMetrics {
    /// Create a new metrics handle (initializes global metrics if needed)
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(ServerMetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &ServerMetricsInner {
        GLOBAL_METRICS.get_or_init(ServerMetricsInner::new)
    }

    pub fn observe_prediction(&self, mode: EstimatorMode, duration_secs: f64) {
        let inner = self.inner();
        inner.prediction_latency_seconds.observe(duration_secs);
        inner.predictions_total.with_label_values(&[mode.as_str()]).inc();
    }

    pub fn inc_validation_rejections(&self, kind: &str) {
        self.inner().validation_rejections_total.with_label_values(&[kind]).inc();
    }

    pub fn inc_prediction_errors(&self) {
        self.inner().prediction_errors_total.inc();
    }

    pub fn observe_forecast_latency(&self, duration_secs: f64) {
        self.inner().forecast_latency_seconds.observe(duration_secs);
    }

    pub fn inc_forecast_errors(&self) {
        self.inner().forecast_errors_total.inc();
    }

    /// Record the estimator committed at startup
    pub fn set_estimator(&self, mode: EstimatorMode, model_digest: Option<&str>) {
        let info = &self.inner().estimator_info;
        info.reset();
        info.with_label_values(&[mode.as_str(), model_digest.unwrap_or("none")])
            .set(1.0);
    }
}

/// Structured logger for server events
///
/// Emits event-tagged records so log pipelines can filter on `event`.
#[derive(Clone)]
pub struct StructuredLogger {
    instance: String,
}

impl StructuredLogger {
    pub fn new(instance: impl Into<String>) -> Self {
        Self {
            instance: instance.into(),
        }
    }

    pub fn log_startup(&self, version: &str, addr: &str) {
        info!(
            event = "server_started",
            instance = %self.instance,
            server_version = %version,
            addr = %addr,
            "Tempcast server started"
        );
    }

    pub fn log_estimator_selected(&self, mode: EstimatorMode, model_digest: Option<&str>) {
        match mode {
            EstimatorMode::Model => info!(
                event = "estimator_selected",
                instance = %self.instance,
                mode = %mode,
                model_digest = model_digest.unwrap_or("none"),
                "Using trained model for predictions"
            ),
            EstimatorMode::Fallback => warn!(
                event = "estimator_selected",
                instance = %self.instance,
                mode = %mode,
                "Using weighted moving-average fallback for predictions"
            ),
        }
    }

    pub fn log_prediction(&self, mode: EstimatorMode, predicted: f64, elapsed_us: u64) {
        info!(
            event = "prediction_served",
            instance = %self.instance,
            mode = %mode,
            predicted_temperature = predicted,
            elapsed_us = elapsed_us,
            "Served temperature prediction"
        );
    }

    pub fn log_rejection(&self, kind: &str, reason: &str) {
        info!(
            event = "prediction_rejected",
            instance = %self.instance,
            kind = %kind,
            reason = %reason,
            "Rejected prediction request"
        );
    }

    pub fn log_forecast_failure(&self, city_id: &str, error: &str) {
        warn!(
            event = "forecast_failed",
            instance = %self.instance,
            city_id = %city_id,
            error = %error,
            "Upstream forecast request failed"
        );
    }

    pub fn log_shutdown(&self, reason: &str) {
        info!(
            event = "server_shutdown",
            instance = %self.instance,
            reason = %reason,
            "Tempcast server shutting down"
        );
    }
}
