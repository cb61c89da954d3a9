//! Artifact domain: formats, filesystem repository and startup loading.

pub mod domain;
pub mod repo_fs;
pub mod service;

pub use domain::{ArtifactRepo, ModelArtifact, ScalerArtifact};
pub use repo_fs::FsArtifactRepo;
