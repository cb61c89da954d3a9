// lib.rs - insurance premium prediction service
#![forbid(unsafe_code)]
#![deny(clippy::unwrap_used, clippy::expect_used)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used))]

pub mod api;
pub mod artifacts;
pub mod common;
pub mod features;
pub mod inference;

pub use common::error::{PremiumError, PremiumResult};
pub use inference::domain::{ModelState, Pipeline, Predictor, Transformer};
