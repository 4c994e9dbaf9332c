//! Core library for the Tempcast weather server
//!
//! This crate provides:
//! - Next-temperature prediction (weighted moving average or ONNX model)
//! - The supported city table
//! - Open-Meteo forecast retrieval
//! - Health checks and observability

pub mod cities;
pub mod forecast;
pub mod health;
pub mod models;
pub mod observability;
pub mod predictor;

pub use health::{
    ComponentHealth, ComponentStatus, HealthRegistry, HealthResponse, ReadinessResponse,
};
pub use models::*;
pub use observability::{ServerMetrics, StructuredLogger};
