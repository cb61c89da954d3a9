//! Domain definitions for inference: the two artifact capabilities and the
//! immutable state the HTTP layer reads on every request.

use std::sync::Arc;

use crate::common::error::PremiumResult;

/// Fitted normalization applied before prediction.
pub trait Transformer: Send + Sync {
    fn transform(&self, features: &[f64]) -> PremiumResult<Vec<f64>>;
}

/// Fitted regression mapping a normalized vector to a premium.
pub trait Predictor: Send + Sync {
    fn predict(&self, features: &[f64]) -> PremiumResult<f64>;
}

/// Result of a single inference call.
#[derive(Clone, Debug, PartialEq)]
pub struct Prediction {
    pub premium_price: f64,
    pub latency_us: u64,
}

/// Scaler and model loaded together.
#[derive(Clone)]
pub struct Pipeline {
    pub scaler: Arc<dyn Transformer>,
    pub model: Arc<dyn Predictor>,
}

impl Pipeline {
    pub fn new(scaler: Arc<dyn Transformer>, model: Arc<dyn Predictor>) -> Self {
        Self { scaler, model }
    }
}

/// Process-wide model state. Built once at startup and never mutated.
#[derive(Clone, Default)]
pub struct ModelState {
    pipeline: Option<Pipeline>,
}

impl ModelState {
    /// State with both artifacts available.
    pub fn loaded(pipeline: Pipeline) -> Self {
        Self {
            pipeline: Some(pipeline),
        }
    }

    /// State after a failed load: nothing to serve.
    pub fn degraded() -> Self {
        Self { pipeline: None }
    }

    pub fn is_loaded(&self) -> bool {
        self.pipeline.is_some()
    }

    pub fn pipeline(&self) -> Option<&Pipeline> {
        self.pipeline.as_ref()
    }
}

impl std::fmt::Debug for ModelState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelState")
            .field("loaded", &self.is_loaded())
            .finish()
    }
}
