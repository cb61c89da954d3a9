//! Startup loading of the scaler and model.
//!
//! A load failure never aborts the process: the service starts degraded and
//! reports it through `/health`.

use std::sync::Arc;
use std::time::Instant;

use tracing::{error, info};

use crate::common::config::AppCfg;
use crate::common::error::ErrorCode;
use crate::inference::domain::{ModelState, Pipeline};

use super::domain::ArtifactRepo;
use super::repo_fs::FsArtifactRepo;

/// Load artifacts into process state, degrading on failure.
///
/// Both artifacts must load; a usable scaler alone is discarded.
pub fn load_state(repo: &dyn ArtifactRepo) -> ModelState {
    let start = Instant::now();
    let loaded = repo
        .load_scaler()
        .and_then(|scaler| Ok((scaler, repo.load_model()?)));
    match loaded {
        Ok((scaler, model)) => {
            info!(
                ev = "artifacts_loaded",
                code = ErrorCode::Ok.as_u32(),
                dur_ms = start.elapsed().as_millis() as u64,
                model_kind = model.kind(),
                features = scaler.feature_names.len(),
                "model and scaler loaded"
            );
            ModelState::loaded(Pipeline::new(Arc::new(scaler), Arc::new(model)))
        }
        Err(err) => {
            error!(
                ev = "artifacts_load_failed",
                code = err.code().as_u32(),
                dur_ms = start.elapsed().as_millis() as u64,
                error = %err,
                "failed to load model artifacts; serving in degraded mode"
            );
            ModelState::degraded()
        }
    }
}

/// Resolve the artifact directory from configuration and load.
pub fn load_from_cfg(cfg: &AppCfg) -> ModelState {
    match FsArtifactRepo::new(cfg) {
        Ok(repo) => {
            info!(
                ev = "artifacts_resolve",
                dir = %repo.root().display(),
                model = %repo.model_path().display(),
                scaler = %repo.scaler_path().display(),
                "loading model artifacts"
            );
            load_state(&repo)
        }
        Err(err) => {
            error!(
                ev = "artifacts_load_failed",
                code = err.code().as_u32(),
                error = %err,
                "cannot resolve artifact directory; serving in degraded mode"
            );
            ModelState::degraded()
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::Path;

    use serde_json::json;

    use super::*;
    use crate::features::domain::feature_names;
    use crate::features::FeatureRecord;
    use crate::inference::service::infer;

    fn write_artifacts(dir: &Path) {
        let names: Vec<_> = feature_names().collect();
        fs::write(
            dir.join("scaler.json"),
            json!({"feature_names": names, "mean": vec![0.0; 10], "scale": vec![1.0; 10]}).to_string(),
        )
        .unwrap();
        fs::write(
            dir.join("insurance_model.json"),
            json!({
                "kind": "linear",
                "feature_names": names,
                "coefficients": vec![1.0; 10],
                "intercept": 0.0
            })
            .to_string(),
        )
        .unwrap();
    }

    fn record() -> FeatureRecord {
        FeatureRecord {
            age: 45.0,
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

    fn cfg_for(dir: &Path) -> AppCfg {
        AppCfg {
            artifact_dir: Some(dir.to_path_buf()),
            ..AppCfg::default()
        }
    }

    #[test]
    fn loads_valid_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        write_artifacts(dir.path());

        let state = load_from_cfg(&cfg_for(dir.path()));
        assert!(state.is_loaded());

        let prediction = infer(state.pipeline().unwrap(), &record()).unwrap();
        assert_eq!(prediction.premium_price, 297.0);
    }

    #[test]
    fn tree_ensemble_loads_through_the_repo() {
        let dir = tempfile::tempdir().unwrap();
        write_artifacts(dir.path());
        let names: Vec<_> = feature_names().collect();
        fs::write(
            dir.path().join("insurance_model.json"),
            json!({
                "kind": "tree_ensemble",
                "feature_names": names,
                "trees": [{"nodes": [
                    {"feature": 0, "threshold": 50.0, "left": 1, "right": 2},
                    {"value": 15000.0},
                    {"value": 30000.0}
                ]}]
            })
            .to_string(),
        )
        .unwrap();

        let repo = FsArtifactRepo::new(&cfg_for(dir.path())).unwrap();
        assert_eq!(repo.root(), dir.path());
        let state = load_state(&repo);
        let prediction = infer(state.pipeline().unwrap(), &record()).unwrap();
        assert_eq!(prediction.premium_price, 15000.0);
    }

    #[test]
    fn missing_scaler_degrades() {
        let dir = tempfile::tempdir().unwrap();
        write_artifacts(dir.path());
        fs::remove_file(dir.path().join("scaler.json")).unwrap();
        assert!(!load_from_cfg(&cfg_for(dir.path())).is_loaded());
    }

    #[test]
    fn missing_model_degrades() {
        let dir = tempfile::tempdir().unwrap();
        write_artifacts(dir.path());
        fs::remove_file(dir.path().join("insurance_model.json")).unwrap();
        assert!(!load_from_cfg(&cfg_for(dir.path())).is_loaded());
    }

    #[test]
    fn reordered_model_features_degrade() {
        let dir = tempfile::tempdir().unwrap();
        write_artifacts(dir.path());
        let mut names: Vec<_> = feature_names().collect();
        names.reverse();
        fs::write(
            dir.path().join("insurance_model.json"),
            json!({
                "kind": "linear",
                "feature_names": names,
                "coefficients": vec![1.0; 10],
                "intercept": 0.0
            })
            .to_string(),
        )
        .unwrap();
        assert!(!load_from_cfg(&cfg_for(dir.path())).is_loaded());
    }
}
