//! Integration tests for the server API endpoints

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use server_lib::{
    cities::Coordinates,
    forecast::{ForecastError, ForecastSnapshot, ForecastSource, WeatherCondition},
    health::{components, HealthRegistry},
    observability::{ServerMetrics, StructuredLogger},
    predictor::{Estimator, ModelPredictor, Scaler, SequenceModel, WINDOW_LEN},
};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tempcast_server::api::{create_router, AppState};
use tower::ServiceExt;

/// What a stub forecast fetch returns
#[derive(Clone, Copy)]
enum StubReply {
    Snapshot,
    Failure,
    NoDailyData,
}

/// Forecast source returning a canned snapshot or a canned failure
struct StubForecast {
    reply: StubReply,
    calls: AtomicUsize,
}

impl StubForecast {
    fn new(reply: StubReply) -> Self {
        Self { reply, calls: AtomicUsize::new(0) }
    }

    fn ok() -> Self {
        Self::new(StubReply::Snapshot)
    }

    fn failing() -> Self {
        Self::new(StubReply::Failure)
    }
}

#[async_trait]
impl ForecastSource for StubForecast {
    async fn fetch(&self, _coordinates: &Coordinates) -> Result<ForecastSnapshot, ForecastError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let daily_max = match self.reply {
            StubReply::Failure => return Err(ForecastError::Status(503)),
            StubReply::NoDailyData => Vec::new(),
            StubReply::Snapshot => vec![31.0, 32.0, 30.0, 29.0, 33.0, 45.0, 45.0],
        };
        Ok(ForecastSnapshot {
            current_temperature: 29.4,
            condition: Some(WeatherCondition::PartlyCloudy),
            daily_max,
            daily_min: vec![21.0, 22.0, 20.0, 20.0, 22.0, 25.0, 25.0],
        })
    }
}

/// Model that counts invocations and returns the newest scaled value
struct CountingModel {
    calls: Arc<AtomicUsize>,
}

impl SequenceModel for CountingModel {
    fn run(&self, scaled: &[f32; WINDOW_LEN]) -> anyhow::Result<f32> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(scaled[WINDOW_LEN - 1])
    }
}

/// Model whose failures can be switched on and off
struct SwitchableModel {
    failing: Arc<AtomicBool>,
}

impl SequenceModel for SwitchableModel {
    fn run(&self, scaled: &[f32; WINDOW_LEN]) -> anyhow::Result<f32> {
        if self.failing.load(Ordering::SeqCst) {
            anyhow::bail!("output tensor has unexpected shape");
        }
        Ok(scaled[WINDOW_LEN - 1])
    }
}

fn min_max_scaler() -> Scaler {
    Scaler::MinMax { data_min: 0.0, data_max: 50.0, feature_range: (0.0, 1.0) }
}

struct TestApp {
    router: Router,
    state: Arc<AppState>,
}

async fn setup_app(estimator: Estimator, forecast: Arc<dyn ForecastSource>) -> TestApp {
    let health_registry = HealthRegistry::new();
    health_registry.register(components::PREDICTOR).await;
    health_registry.register(components::FORECAST).await;

    let state = Arc::new(AppState::new(
        Arc::new(estimator),
        forecast,
        health_registry,
        ServerMetrics::new(),
        StructuredLogger::new("test"),
    ));
    TestApp {
        router: create_router(state.clone()),
        state,
    }
}

async fn fallback_app() -> TestApp {
    setup_app(Estimator::fallback(), Arc::new(StubForecast::ok())).await
}

async fn send(router: Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
    let response = router.oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, body.to_vec())
}

async fn get_json(router: Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    let (status, body) = send(router, request).await;
    (status, serde_json::from_slice(&body).unwrap())
}

async fn post_predict(router: Router, body: &str) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("POST")
        .uri("/predict")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    let (status, body) = send(router, request).await;
    (status, serde_json::from_slice(&body).unwrap())
}

#[tokio::test]
async fn test_predict_weighted_average() {
    let app = fallback_app().await;

    let (status, body) =
        post_predict(app.router, r#"{"temp_sequence": [10,11,12,13,14,15,16,17,18,19]}"#).await;

    assert_eq!(status, StatusCode::OK);
    let predicted = body["predicted_temperature"].as_f64().unwrap();
    assert!((predicted - 2040.0 / 135.0).abs() < 1e-9, "predicted {}", predicted);
}

#[tokio::test]
async fn test_predict_accepts_floats() {
    let app = fallback_app().await;

    let (status, body) = post_predict(
        app.router,
        r#"{"temp_sequence": [22.5,22.5,22.5,22.5,22.5,22.5,22.5,22.5,22.5,22.5]}"#,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["predicted_temperature"], 22.5);
}

#[tokio::test]
async fn test_predict_rejects_wrong_length() {
    for payload in [
        r#"{"temp_sequence": [1,2,3,4,5,6,7,8,9]}"#,
        r#"{"temp_sequence": [1,2,3,4,5,6,7,8,9,10,11]}"#,
        r#"{"temp_sequence": 5}"#,
        r#"{}"#,
        "not json at all",
    ] {
        let app = fallback_app().await;
        let (status, body) = post_predict(app.router, payload).await;

        assert_eq!(status, StatusCode::BAD_REQUEST, "payload {}", payload);
        assert_eq!(
            body["error"],
            "Provide exactly 10 numeric values in 'temp_sequence'."
        );
    }
}

#[tokio::test]
async fn test_predict_rejects_non_numeric() {
    let app = fallback_app().await;

    let (status, body) =
        post_predict(app.router, r#"{"temp_sequence": [1,2,3,4,"abc",6,7,8,9,10]}"#).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Non-numeric value in sequence.");
}

#[tokio::test]
async fn test_model_mode_uses_model_and_skips_it_on_bad_input() {
    let calls = Arc::new(AtomicUsize::new(0));
    let model = CountingModel { calls: calls.clone() };
    let estimator = Estimator::Model(ModelPredictor::new(Box::new(model), min_max_scaler(), "feedbeefcafe"));
    let app = setup_app(estimator, Arc::new(StubForecast::ok())).await;

    let (status, _) =
        post_predict(app.router.clone(), r#"{"temp_sequence": [1,2,3,"x",5,6,7,8,9,10]}"#).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(calls.load(Ordering::SeqCst), 0);

    let (status, body) =
        post_predict(app.router, r#"{"temp_sequence": [20,20,20,20,20,20,20,20,20,40]}"#).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    let predicted = body["predicted_temperature"].as_f64().unwrap();
    assert!((predicted - 40.0).abs() < 1e-4, "predicted {}", predicted);
}

#[tokio::test]
async fn test_predict_rejects_booleans() {
    let app = fallback_app().await;

    let (status, body) =
        post_predict(app.router, r#"{"temp_sequence": [true,2,3,4,5,6,7,8,9,10]}"#).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Non-numeric value in sequence.");
}

#[tokio::test]
async fn test_model_failure_marks_predictor_unhealthy_until_recovery() {
    let failing = Arc::new(AtomicBool::new(true));
    let model = SwitchableModel { failing: failing.clone() };
    let estimator = Estimator::Model(ModelPredictor::new(Box::new(model), min_max_scaler(), "feedbeefcafe"));
    let app = setup_app(estimator, Arc::new(StubForecast::ok())).await;
    app.state.health_registry.set_ready(true).await;

    let sequence = r#"{"temp_sequence": [20,21,22,23,24,25,26,27,28,29]}"#;
    let (status, body) = post_predict(app.router.clone(), sequence).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "prediction failed");

    let (status, health) = get_json(app.router.clone(), "/healthz").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(health["status"], "unhealthy");
    assert_eq!(health["components"]["predictor"]["status"], "unhealthy");

    let (status, readiness) = get_json(app.router.clone(), "/readyz").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(readiness["ready"], false);

    failing.store(false, Ordering::SeqCst);
    let (status, _) = post_predict(app.router.clone(), sequence).await;
    assert_eq!(status, StatusCode::OK);

    let (status, health) = get_json(app.router, "/healthz").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(health["status"], "healthy");
}

#[tokio::test]
async fn test_cities_listing() {
    let app = fallback_app().await;

    let (status, body) = get_json(app.router, "/api/cities").await;

    assert_eq!(status, StatusCode::OK);
    let cities = body["cities"].as_array().unwrap();
    assert_eq!(cities.len(), 5);
    assert_eq!(cities[0]["id"], "hyd");
    assert_eq!(cities[0]["name"], "Hyderabad");
    assert_eq!(cities[0]["country"], "IN");
    assert_eq!(cities[4]["id"], "blr");
}

#[tokio::test]
async fn test_weather_report() {
    let app = fallback_app().await;

    let (status, body) = get_json(app.router, "/api/weather/vij").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["city"]["id"], "vij");
    assert_eq!(body["city"]["name"], "Vijayawada");
    assert_eq!(body["city"]["condition"], "partly_cloudy");
    assert_eq!(body["current"], 29.4);
    assert_eq!(body["five_day_avg"], 31.0);
}

#[tokio::test]
async fn test_weather_unknown_city() {
    let forecast = Arc::new(StubForecast::ok());
    let app = setup_app(Estimator::fallback(), forecast.clone()).await;

    let (status, body) = get_json(app.router, "/api/weather/paris").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "city not found");
    assert_eq!(forecast.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_weather_upstream_failure_degrades_forecast() {
    let app = setup_app(Estimator::fallback(), Arc::new(StubForecast::failing())).await;

    let (status, body) = get_json(app.router.clone(), "/api/weather/hyd").await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(body["error"].is_string());

    let health = app.state.health_registry.health().await;
    assert_eq!(
        health.components[components::FORECAST].status,
        server_lib::ComponentStatus::Degraded
    );

    // Degraded still returns 200 (operational)
    let (status, body) = get_json(app.router, "/healthz").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "degraded");
}

#[tokio::test]
async fn test_weather_without_daily_data_keeps_forecast_degraded() {
    let app = setup_app(Estimator::fallback(), Arc::new(StubForecast::new(StubReply::NoDailyData))).await;

    let (status, body) = get_json(app.router, "/api/weather/blr").await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(body["error"].is_string());

    let health = app.state.health_registry.health().await;
    assert_eq!(
        health.components[components::FORECAST].status,
        server_lib::ComponentStatus::Degraded
    );
}

#[tokio::test]
async fn test_healthz_includes_component_details() {
    let app = fallback_app().await;

    let (status, health) = get_json(app.router, "/healthz").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(health["status"], "healthy");
    assert!(health["components"]["predictor"].is_object());
    assert!(health["components"]["forecast"].is_object());
}

#[tokio::test]
async fn test_readyz_transitions() {
    let app = fallback_app().await;

    let (status, readiness) = get_json(app.router.clone(), "/readyz").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(readiness["ready"], false);

    app.state.health_registry.set_ready(true).await;
    let (status, readiness) = get_json(app.router, "/readyz").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(readiness["ready"], true);
}

#[tokio::test]
async fn test_metrics_endpoint_returns_prometheus_format() {
    let app = fallback_app().await;

    let _ = post_predict(app.router.clone(), r#"{"temp_sequence": [1,2,3,4,5,6,7,8,9,10]}"#).await;
    let _ = post_predict(app.router.clone(), r#"{"temp_sequence": [1]}"#).await;

    let request = Request::builder().uri("/metrics").body(Body::empty()).unwrap();
    let (status, body) = send(app.router, request).await;
    assert_eq!(status, StatusCode::OK);

    let metrics_text = String::from_utf8(body).unwrap();
    assert!(metrics_text.contains("tempcast_prediction_latency_seconds_bucket"));
    assert!(metrics_text.contains("tempcast_predictions_total"));
    assert!(metrics_text.contains("tempcast_validation_rejections_total"));
}

#[tokio::test]
async fn test_index_page() {
    let app = fallback_app().await;

    let request = Request::builder().uri("/").body(Body::empty()).unwrap();
    let (status, body) = send(app.router, request).await;

    assert_eq!(status, StatusCode::OK);
    assert!(String::from_utf8(body).unwrap().contains("Tempcast"));
}
