//! Inference orchestration: scale, then predict.

use std::time::Instant;

use tracing::debug;

use crate::common::error::{PremiumError, PremiumResult};
use crate::features::domain::{FeatureRecord, FEATURE_COUNT};

use super::domain::{Pipeline, Prediction};

/// Perform a single inference call with the loaded artifacts.
pub fn infer(pipeline: &Pipeline, record: &FeatureRecord) -> PremiumResult<Prediction> {
    let start = Instant::now();
    let features = record.to_vector();

    let scaled = pipeline.scaler.transform(&features)?;
    if scaled.len() != FEATURE_COUNT {
        return Err(PremiumError::inference(format!(
            "scaler returned {} features, expected {FEATURE_COUNT}",
            scaled.len()
        )));
    }

    let premium_price = pipeline.model.predict(&scaled)?;
    if !premium_price.is_finite() {
        return Err(PremiumError::inference(format!(
            "model produced a non-finite premium ({premium_price})"
        )));
    }

    let latency_us = start.elapsed().as_micros() as u64;
    debug!(ev = "infer", premium_price, latency_us, "prediction computed");

    Ok(Prediction {
        premium_price,
        latency_us,
    })
}

/// Perform batch inference by invoking `infer` for every record.
pub fn batch_infer(pipeline: &Pipeline, records: &[FeatureRecord]) -> PremiumResult<Vec<Prediction>> {
    records
        .iter()
        .enumerate()
        .map(|(idx, record)| {
            infer(pipeline, record).map_err(|err| match err {
                PremiumError::Inference(msg) => {
                    PremiumError::inference(format!("record {idx}: {msg}"))
                }
                other => other,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::inference::domain::{Predictor, Transformer};

    struct Identity;

    impl Transformer for Identity {
        fn transform(&self, features: &[f64]) -> PremiumResult<Vec<f64>> {
            Ok(features.to_vec())
        }
    }

    struct Truncating;

    impl Transformer for Truncating {
        fn transform(&self, features: &[f64]) -> PremiumResult<Vec<f64>> {
            Ok(features[..3].to_vec())
        }
    }

    struct Sum;

    impl Predictor for Sum {
        fn predict(&self, features: &[f64]) -> PremiumResult<f64> {
            Ok(features.iter().sum())
        }
    }

    struct Exploding;

    impl Predictor for Exploding {
        fn predict(&self, _: &[f64]) -> PremiumResult<f64> {
            Ok(f64::INFINITY)
        }
    }

    fn record(age: f64) -> FeatureRecord {
        FeatureRecord {
            age,
            diabetes: 0,
            blood_pressure_problems: 1,
            any_transplants: 0,
            any_chronic_diseases: 0,
            height: 170.0,
            weight: 80.0,
            known_allergies: 0,
            history_of_cancer_in_family: 0,
            number_of_major_surgeries: 1,
        }
    }

    #[test]
    fn identity_scaler_and_sum_model() {
        let pipeline = Pipeline::new(Arc::new(Identity), Arc::new(Sum));
        let prediction = infer(&pipeline, &record(45.0)).unwrap();
        assert_eq!(prediction.premium_price, 297.0);
    }

    #[test]
    fn inference_is_deterministic() {
        let pipeline = Pipeline::new(Arc::new(Identity), Arc::new(Sum));
        let a = infer(&pipeline, &record(33.5)).unwrap();
        let b = infer(&pipeline, &record(33.5)).unwrap();
        assert_eq!(a.premium_price, b.premium_price);
    }

    #[test]
    fn scaler_shape_mismatch_is_an_inference_failure() {
        let pipeline = Pipeline::new(Arc::new(Truncating), Arc::new(Sum));
        assert!(matches!(
            infer(&pipeline, &record(45.0)),
            Err(PremiumError::Inference(_))
        ));
    }

    #[test]
    fn non_finite_output_is_an_inference_failure() {
        let pipeline = Pipeline::new(Arc::new(Identity), Arc::new(Exploding));
        assert!(matches!(
            infer(&pipeline, &record(45.0)),
            Err(PremiumError::Inference(_))
        ));
    }

    #[test]
    fn batch_keeps_order_and_names_failing_record() {
        let pipeline = Pipeline::new(Arc::new(Identity), Arc::new(Sum));
        let out = batch_infer(&pipeline, &[record(45.0), record(20.0)]).unwrap();
        let prices: Vec<_> = out.iter().map(|p| p.premium_price).collect();
        assert_eq!(prices, vec![297.0, 272.0]);

        let broken = Pipeline::new(Arc::new(Identity), Arc::new(Exploding));
        let err = batch_infer(&broken, &[record(45.0)]).unwrap_err();
        assert!(err.to_string().starts_with("record 0:"));
    }
}
