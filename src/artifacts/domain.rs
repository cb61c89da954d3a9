//! Artifact formats for the fitted scaler and regression model.
//!
//! Both artifacts are JSON documents that embed the feature names they were
//! fitted on. [`ScalerArtifact::validate`] and [`ModelArtifact::validate`]
//! run at load time so a retrained artifact with a different column layout is
//! rejected before any request is served.

use serde::{Deserialize, Serialize};

use crate::common::error::{PremiumError, PremiumResult};
use crate::features::domain::{feature_names, FEATURE_COUNT};
use crate::inference::domain::{Predictor, Transformer};

/// Standard scaler: `(x - mean) / scale`, per feature.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScalerArtifact {
    pub feature_names: Vec<String>,
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

impl ScalerArtifact {
    pub fn validate(&self) -> PremiumResult<()> {
        check_feature_names("scaler", &self.feature_names)?;
        check_finite_vector("scaler", "mean", &self.mean)?;
        check_finite_vector("scaler", "scale", &self.scale)
    }
}

impl Transformer for ScalerArtifact {
    fn transform(&self, features: &[f64]) -> PremiumResult<Vec<f64>> {
        check_input_len(features)?;
        Ok(features
            .iter()
            .zip(self.mean.iter().zip(&self.scale))
            .map(|(x, (mean, scale))| {
                // Constant features were fitted with a zero scale.
                let scale = if *scale == 0.0 { 1.0 } else { *scale };
                (x - mean) / scale
            })
            .collect())
    }
}

/// Fitted regression model.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModelArtifact {
    Linear(LinearModel),
    TreeEnsemble(TreeEnsemble),
}

impl ModelArtifact {
    pub fn kind(&self) -> &'static str {
        match self {
            ModelArtifact::Linear(_) => "linear",
            ModelArtifact::TreeEnsemble(_) => "tree_ensemble",
        }
    }

    pub fn feature_names(&self) -> &[String] {
        match self {
            ModelArtifact::Linear(m) => &m.feature_names,
            ModelArtifact::TreeEnsemble(m) => &m.feature_names,
        }
    }

    pub fn validate(&self) -> PremiumResult<()> {
        check_feature_names("model", self.feature_names())?;
        match self {
            ModelArtifact::Linear(m) => m.validate(),
            ModelArtifact::TreeEnsemble(m) => m.validate(),
        }
    }
}

impl Predictor for ModelArtifact {
    fn predict(&self, features: &[f64]) -> PremiumResult<f64> {
        check_input_len(features)?;
        match self {
            ModelArtifact::Linear(m) => Ok(m.evaluate(features)),
            ModelArtifact::TreeEnsemble(m) => m.evaluate(features),
        }
    }
}

/// `intercept + sum(coefficients[i] * x[i])`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LinearModel {
    pub feature_names: Vec<String>,
    pub coefficients: Vec<f64>,
    pub intercept: f64,
}

impl LinearModel {
    fn validate(&self) -> PremiumResult<()> {
        check_finite_vector("model", "coefficients", &self.coefficients)?;
        if !self.intercept.is_finite() {
            return Err(PremiumError::artifact_invalid("model", "intercept is not finite"));
        }
        Ok(())
    }

    fn evaluate(&self, features: &[f64]) -> f64 {
        self.intercept
            + self
                .coefficients
                .iter()
                .zip(features)
                .map(|(w, x)| w * x)
                .sum::<f64>()
    }
}

/// How per-tree outputs are combined.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Aggregation {
    /// Random-forest style average.
    #[default]
    Mean,
    /// Boosting style sum.
    Sum,
}

/// Ensemble of regression trees.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TreeEnsemble {
    pub feature_names: Vec<String>,
    #[serde(default)]
    pub aggregation: Aggregation,
    #[serde(default)]
    pub base_score: f64,
    pub trees: Vec<Tree>,
}

/// Flat node array; node 0 is the root.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Tree {
    pub nodes: Vec<TreeNode>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TreeNode {
    /// Go `left` when `x[feature] <= threshold`, else `right`.
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        value: f64,
    },
}

impl TreeEnsemble {
    fn validate(&self) -> PremiumResult<()> {
        if self.trees.is_empty() {
            return Err(PremiumError::artifact_invalid("model", "ensemble has no trees"));
        }
        if !self.base_score.is_finite() {
            return Err(PremiumError::artifact_invalid("model", "base_score is not finite"));
        }
        for (idx, tree) in self.trees.iter().enumerate() {
            tree.validate()
                .map_err(|reason| PremiumError::artifact_invalid("model", format!("tree {idx}: {reason}")))?;
        }
        Ok(())
    }

    fn evaluate(&self, features: &[f64]) -> PremiumResult<f64> {
        if self.trees.is_empty() {
            return Err(PremiumError::inference("ensemble has no trees"));
        }
        let mut total = 0.0;
        for tree in &self.trees {
            total += tree.evaluate(features)?;
        }
        let combined = match self.aggregation {
            Aggregation::Mean => total / self.trees.len() as f64,
            Aggregation::Sum => total,
        };
        Ok(self.base_score + combined)
    }
}

impl Tree {
    // Children must point forward, so traversal always terminates.
    fn validate(&self) -> Result<(), String> {
        if self.nodes.is_empty() {
            return Err("tree has no nodes".to_string());
        }
        for (idx, node) in self.nodes.iter().enumerate() {
            match *node {
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    if feature >= FEATURE_COUNT {
                        return Err(format!("node {idx} splits on unknown feature {feature}"));
                    }
                    if !threshold.is_finite() {
                        return Err(format!("node {idx} has a non-finite threshold"));
                    }
                    for child in [left, right] {
                        if child <= idx || child >= self.nodes.len() {
                            return Err(format!("node {idx} has invalid child {child}"));
                        }
                    }
                }
                TreeNode::Leaf { value } => {
                    if !value.is_finite() {
                        return Err(format!("leaf {idx} has a non-finite value"));
                    }
                }
            }
        }
        Ok(())
    }

    // A walk longer than the node count means a cycle.
    fn evaluate(&self, features: &[f64]) -> PremiumResult<f64> {
        let mut idx = 0;
        for _ in 0..self.nodes.len() {
            match self.nodes.get(idx) {
                Some(TreeNode::Leaf { value }) => return Ok(*value),
                Some(TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                }) => {
                    let x = features.get(*feature).ok_or_else(|| {
                        PremiumError::inference(format!("split on unknown feature {feature}"))
                    })?;
                    idx = if *x <= *threshold { *left } else { *right };
                }
                None => {
                    return Err(PremiumError::inference(format!("tree node {idx} out of range")))
                }
            }
        }
        Err(PremiumError::inference("tree walk did not reach a leaf"))
    }
}

/// Source of the two startup artifacts.
pub trait ArtifactRepo {
    fn load_scaler(&self) -> PremiumResult<ScalerArtifact>;
    fn load_model(&self) -> PremiumResult<ModelArtifact>;
}

fn check_feature_names(artifact: &'static str, names: &[String]) -> PremiumResult<()> {
    if names.len() != FEATURE_COUNT || !names.iter().map(String::as_str).eq(feature_names()) {
        return Err(PremiumError::artifact_invalid(
            artifact,
            format!(
                "feature_names {names:?} do not match expected order {:?}",
                feature_names().collect::<Vec<_>>()
            ),
        ));
    }
    Ok(())
}

fn check_finite_vector(artifact: &'static str, name: &str, values: &[f64]) -> PremiumResult<()> {
    if values.len() != FEATURE_COUNT {
        return Err(PremiumError::artifact_invalid(
            artifact,
            format!("{name} has {} entries, expected {FEATURE_COUNT}", values.len()),
        ));
    }
    if let Some(pos) = values.iter().position(|v| !v.is_finite()) {
        return Err(PremiumError::artifact_invalid(
            artifact,
            format!("{name}[{pos}] is not finite"),
        ));
    }
    Ok(())
}

fn check_input_len(features: &[f64]) -> PremiumResult<()> {
    if features.len() != FEATURE_COUNT {
        return Err(PremiumError::inference(format!(
            "expected {FEATURE_COUNT} features, got {}",
            features.len()
        )));
    }
    Ok(())
}
