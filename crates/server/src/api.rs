//! HTTP API: dashboard, weather, prediction, health and Prometheus metrics

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use prometheus::{Encoder, TextEncoder};
use serde_json::Value;
use server_lib::{
    cities::{self, CITIES},
    forecast::ForecastSource,
    health::{components, ComponentStatus, HealthRegistry},
    models::{
        CityList, CitySummary, CityWeatherInfo, ErrorResponse, PredictionResponse, WeatherReport,
    },
    observability::{ServerMetrics, StructuredLogger},
    predictor::{Estimator, EstimatorMode, PredictError},
};
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info};

/// Request body key holding the temperature window
pub const SEQUENCE_KEY: &str = "temp_sequence";

const INDEX_HTML: &str = include_str!("../assets/index.html");

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub estimator: Arc<Estimator>,
    pub forecast: Arc<dyn ForecastSource>,
    pub health_registry: HealthRegistry,
    pub metrics: ServerMetrics,
    pub logger: StructuredLogger,
}

impl AppState {
    pub fn new(
        estimator: Arc<Estimator>,
        forecast: Arc<dyn ForecastSource>,
        health_registry: HealthRegistry,
        metrics: ServerMetrics,
        logger: StructuredLogger,
    ) -> Self {
        Self {
            estimator,
            forecast,
            health_registry,
            metrics,
            logger,
        }
    }
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(ErrorResponse::new(message))).into_response()
}

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn list_cities() -> Json<CityList> {
    Json(CityList {
        cities: CITIES.iter().map(CitySummary::from).collect(),
    })
}

async fn city_weather(
    State(state): State<Arc<AppState>>,
    Path(city_id): Path<String>,
) -> Response {
    let Some(city) = cities::find(&city_id) else {
        return error_response(StatusCode::NOT_FOUND, "city not found");
    };

    let start = Instant::now();
    let fetched = state.forecast.fetch(&city.coordinates).await;
    state.metrics.observe_forecast_latency(start.elapsed().as_secs_f64());

    let snapshot = match fetched {
        Ok(snapshot) => snapshot,
        Err(e) => {
            state.metrics.inc_forecast_errors();
            state.logger.log_forecast_failure(city.id, &e.to_string());
            state
                .health_registry
                .set_degraded(components::FORECAST, e.to_string())
                .await;
            return error_response(StatusCode::BAD_GATEWAY, "forecast provider unavailable");
        }
    };
    let Some(five_day_avg) = snapshot.five_day_average() else {
        state.metrics.inc_forecast_errors();
        state
            .health_registry
            .set_degraded(components::FORECAST, "forecast provider returned no daily data")
            .await;
        return error_response(StatusCode::BAD_GATEWAY, "forecast provider returned no daily data");
    };
    state.health_registry.set_healthy(components::FORECAST).await;

    Json(WeatherReport {
        city: CityWeatherInfo {
            id: city.id.to_string(),
            name: city.name.to_string(),
            country: city.country.to_string(),
            condition: snapshot.condition,
        },
        current: snapshot.current_temperature,
        five_day_avg,
    })
    .into_response()
}

/// Anything that is not a JSON object with the sequence key counts as an
/// empty sequence
fn extract_sequence(body: &[u8]) -> Value {
    serde_json::from_slice::<Value>(body)
        .ok()
        .and_then(|payload| payload.get(SEQUENCE_KEY).cloned())
        .unwrap_or_else(|| Value::Array(Vec::new()))
}

async fn predict(State(state): State<Arc<AppState>>, body: Bytes) -> Response {
    let raw = extract_sequence(&body);
    let mode = state.estimator.mode();
    let start = Instant::now();

    match state.estimator.predict_from_sequence(&raw) {
        Ok(predicted) => {
            let elapsed = start.elapsed();
            state.metrics.observe_prediction(mode, elapsed.as_secs_f64());
            state
                .logger
                .log_prediction(mode, predicted, elapsed.as_micros() as u64);
            if mode == EstimatorMode::Model {
                state.health_registry.set_healthy(components::PREDICTOR).await;
            }
            Json(PredictionResponse {
                predicted_temperature: predicted,
            })
            .into_response()
        }
        Err(PredictError::Validation(e)) => {
            state.metrics.inc_validation_rejections(e.kind());
            state.logger.log_rejection(e.kind(), &e.to_string());
            error_response(StatusCode::BAD_REQUEST, e.to_string())
        }
        Err(e @ PredictError::Inference(_)) => {
            state.metrics.inc_prediction_errors();
            error!(mode = %mode, error = %e, "Prediction failed");
            if mode == EstimatorMode::Model {
                state
                    .health_registry
                    .set_unhealthy(components::PREDICTOR, e.to_string())
                    .await;
            }
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "prediction failed")
        }
    }
}

/// Health check response - returns 200 if healthy or degraded, 503 if unhealthy
async fn healthz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let health = state.health_registry.health().await;

    let status_code = match health.status {
        ComponentStatus::Healthy => StatusCode::OK,
        ComponentStatus::Degraded => StatusCode::OK, // Still operational
        ComponentStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };

    (status_code, Json(health))
}

/// Readiness check response - returns 200 if ready, 503 if not ready
async fn readyz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let readiness = state.health_registry.readiness().await;

    let status_code = if readiness.ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status_code, Json(readiness))
}

/// Prometheus metrics endpoint
async fn metrics() -> Response {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();

    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        error!(error = %e, "Failed to encode metrics");
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }

    (
        StatusCode::OK,
        [("content-type", "text/plain; charset=utf-8")],
        buffer,
    )
        .into_response()
}

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/api/cities", get(list_cities))
        .route("/api/weather/:city_id", get(city_weather))
        .route("/predict", post(predict))
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/metrics", get(metrics))
        .with_state(state)
}

/// Start the API server, stopping when `shutdown` resolves
pub async fn serve(
    addr: &str,
    state: Arc<AppState>,
    shutdown: impl std::future::Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    let app = create_router(state);

    info!(addr = %addr, "Starting API server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    Ok(())
}
