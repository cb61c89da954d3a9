//! Inference domain: scaling plus prediction over loaded artifacts.

pub mod domain;
pub mod service;

pub use domain::{ModelState, Pipeline, Prediction, Predictor, Transformer};
