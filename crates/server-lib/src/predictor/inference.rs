//! ONNX inference using tract
//!
//! Provides the model-backed predictor: the window is scaled, fed to a
//! pre-trained sequence model as a `[1, 10, 1]` tensor and the single
//! output value is mapped back to degrees.

use super::scaler::Scaler;
use super::window::{TemperatureWindow, WINDOW_LEN};
use super::Predictor;
use anyhow::{Context, Result};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tract_onnx::prelude::*;
use tracing::{debug, warn};

/// Maximum inference latency before warning
const MAX_INFERENCE_MS: u128 = 5;

type TractModel = SimplePlan<TypedFact, Box<dyn TypedOp>, Graph<TypedFact, Box<dyn TypedOp>>>;

/// Opaque regression model over a scaled window
pub trait SequenceModel: Send + Sync {
    /// Run one inference and return the raw (still scaled) output
    fn run(&self, scaled: &[f32; WINDOW_LEN]) -> Result<f32>;
}

/// Sequence model backed by an optimized tract plan
pub struct OnnxSequenceModel {
    plan: TractModel,
}

impl OnnxSequenceModel {
    /// Parse and optimize an ONNX model from bytes
    pub fn from_bytes(model_bytes: &[u8]) -> Result<Self> {
        let plan = tract_onnx::onnx()
            .model_for_read(&mut std::io::Cursor::new(model_bytes))
            .context("Failed to parse ONNX model")?
            .with_input_fact(0, f32::fact([1, WINDOW_LEN, 1]).into())
            .context("Failed to set input shape")?
            .into_optimized()
            .context("Failed to optimize model")?
            .into_runnable()
            .context("Failed to create runnable model")?;
        Ok(Self { plan })
    }
}

impl SequenceModel for OnnxSequenceModel {
    fn run(&self, scaled: &[f32; WINDOW_LEN]) -> Result<f32> {
        let input: Tensor = tract_ndarray::Array3::from_shape_vec((1, WINDOW_LEN, 1), scaled.to_vec())
            .context("Failed to shape model input")?
            .into();

        let result = self.plan.run(tvec!(input.into()))?;
        let output = result.first().context("No output from model")?;
        let view = output.to_array_view::<f32>()?;
        view.iter().next().copied().context("Model output is empty")
    }
}

/// Predictor that defers to a loaded model and its scaler
pub struct ModelPredictor {
    model: Box<dyn SequenceModel>,
    scaler: Scaler,
    digest: String,
    inference_count: AtomicU64,
    slow_inference_count: AtomicU64,
}

impl ModelPredictor {
    pub fn new(model: Box<dyn SequenceModel>, scaler: Scaler, digest: impl Into<String>) -> Self {
        Self {
            model,
            scaler,
            digest: digest.into(),
            inference_count: AtomicU64::new(0),
            slow_inference_count: AtomicU64::new(0),
        }
    }

    /// Short content digest of the model artifact
    pub fn digest(&self) -> &str {
        &self.digest
    }

    fn scale_window(&self, window: &TemperatureWindow) -> [f32; WINDOW_LEN] {
        let mut scaled = [0.0f32; WINDOW_LEN];
        for (slot, value) in scaled.iter_mut().zip(window.iter()) {
            *slot = self.scaler.transform(value) as f32;
        }
        scaled
    }

    /// Get inference statistics
    pub fn stats(&self) -> InferenceStats {
        InferenceStats {
            total_inferences: self.inference_count.load(Ordering::Relaxed),
            slow_inferences: self.slow_inference_count.load(Ordering::Relaxed),
        }
    }
}

impl fmt::Debug for ModelPredictor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelPredictor")
            .field("scaler", &self.scaler)
            .field("digest", &self.digest)
            .field("stats", &self.stats())
            .finish_non_exhaustive()
    }
}

impl Predictor for ModelPredictor {
    fn predict(&self, window: &TemperatureWindow) -> Result<f64> {
        let start = Instant::now();

        let scaled = self.scale_window(window);
        let raw = self.model.run(&scaled)?;
        let value = self.scaler.inverse_transform(raw as f64);

        if !value.is_finite() {
            anyhow::bail!("Model produced a non-finite prediction ({})", value);
        }

        let elapsed = start.elapsed();
        self.inference_count.fetch_add(1, Ordering::Relaxed);

        if elapsed.as_millis() > MAX_INFERENCE_MS {
            self.slow_inference_count.fetch_add(1, Ordering::Relaxed);
            warn!(elapsed_ms = elapsed.as_millis(), "Inference exceeded {}ms target", MAX_INFERENCE_MS);
        } else {
            debug!(elapsed_us = elapsed.as_micros(), "Inference completed");
        }

        Ok(value)
    }

    fn name(&self) -> &str {
        "onnx_model"
    }
}

/// Inference statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InferenceStats {
    pub total_inferences: u64,
    pub slow_inferences: u64,
}
