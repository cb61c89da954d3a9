//! Filesystem repository for the startup artifacts.
//!
//! Paths resolve against the directory of the running executable, not the
//! working directory, unless `PREMIUM_ARTIFACT_DIR` names one explicitly.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;

use crate::common::config::AppCfg;
use crate::common::error::{PremiumError, PremiumResult};

use super::domain::{ArtifactRepo, ModelArtifact, ScalerArtifact};

/// Reads `scaler.json` and `insurance_model.json` (names configurable) from one directory.
#[derive(Clone, Debug)]
pub struct FsArtifactRepo {
    root: PathBuf,
    model_file: String,
    scaler_file: String,
}

impl FsArtifactRepo {
    pub fn new(cfg: &AppCfg) -> PremiumResult<Self> {
        let root = match &cfg.artifact_dir {
            Some(dir) => dir.clone(),
            None => executable_dir()?,
        };
        Ok(Self::with_root(root, cfg))
    }

    pub fn with_root(root: impl Into<PathBuf>, cfg: &AppCfg) -> Self {
        Self {
            root: root.into(),
            model_file: cfg.model_file.clone(),
            scaler_file: cfg.scaler_file.clone(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn model_path(&self) -> PathBuf {
        self.root.join(&self.model_file)
    }

    pub fn scaler_path(&self) -> PathBuf {
        self.root.join(&self.scaler_file)
    }
}

impl ArtifactRepo for FsArtifactRepo {
    fn load_scaler(&self) -> PremiumResult<ScalerArtifact> {
        let scaler: ScalerArtifact = read_json(&self.scaler_path())?;
        scaler.validate()?;
        Ok(scaler)
    }

    fn load_model(&self) -> PremiumResult<ModelArtifact> {
        let model: ModelArtifact = read_json(&self.model_path())?;
        model.validate()?;
        Ok(model)
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> PremiumResult<T> {
    let bytes = fs::read(path).map_err(|source| PremiumError::ArtifactIo {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_slice(&bytes).map_err(|source| PremiumError::ArtifactDecode {
        path: path.to_path_buf(),
        source,
    })
}

fn executable_dir() -> PremiumResult<PathBuf> {
    let exe = env::current_exe()
        .map_err(|err| PremiumError::Config(format!("cannot locate executable: {err}")))?;
    exe.parent()
        .map(Path::to_path_buf)
        .ok_or_else(|| PremiumError::Config(format!("executable {} has no parent", exe.display())))
}
