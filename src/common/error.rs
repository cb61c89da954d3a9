//! Error handling primitives shared across the core.
//!
//! Every failure is a [`PremiumError`]. The HTTP layer maps errors to status
//! codes through [`PremiumError::code`], and the same numeric code is attached
//! to structured log lines.

use std::path::PathBuf;

use thiserror::Error;

/// Stable error codes emitted in logs.
#[repr(u32)]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ErrorCode {
    /// Success code used as a sentinel.
    Ok = 0,
    /// Artifact missing, unreadable or failed its self-check.
    LoadFailure = 1,
    /// Artifacts were never loaded.
    ServiceUnavailable = 2,
    /// Request input failed validation.
    InvalidInput = 3,
    /// Scaling or prediction failed.
    InferenceFailure = 4,
    /// Startup configuration could not be used.
    Config = 5,
}

impl ErrorCode {
    pub fn as_u32(self) -> u32 {
        self as u32
    }
}

/// Canonical error type for the core.
#[derive(Error, Debug)]
pub enum PremiumError {
    #[error("failed to read artifact {}: {source}", .path.display())]
    ArtifactIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode artifact {}: {source}", .path.display())]
    ArtifactDecode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("artifact {artifact} rejected: {reason}")]
    ArtifactInvalid {
        artifact: &'static str,
        reason: String,
    },

    #[error("Model not initialized")]
    NotInitialized,

    #[error("Missing key: {0}")]
    MissingKey(&'static str),

    #[error("invalid value for {field}: {reason}")]
    InvalidField { field: &'static str, reason: String },

    #[error("{0}")]
    InvalidBody(String),

    #[error("request body exceeds {limit} bytes")]
    BodyTooLarge { limit: usize },

    #[error("{0}")]
    Inference(String),

    #[error("invalid configuration: {0}")]
    Config(String),
}

/// Result alias used throughout the crate.
pub type PremiumResult<T> = Result<T, PremiumError>;

impl PremiumError {
    /// Machine readable code for logs and status mapping.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::ArtifactIo { .. } | Self::ArtifactDecode { .. } | Self::ArtifactInvalid { .. } => {
                ErrorCode::LoadFailure
            }
            Self::NotInitialized => ErrorCode::ServiceUnavailable,
            Self::MissingKey(_)
            | Self::InvalidField { .. }
            | Self::InvalidBody(_)
            | Self::BodyTooLarge { .. } => ErrorCode::InvalidInput,
            Self::Inference(_) => ErrorCode::InferenceFailure,
            Self::Config(_) => ErrorCode::Config,
        }
    }

    /// Validation helper.
    pub fn invalid_field(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidField {
            field,
            reason: reason.into(),
        }
    }

    /// Artifact self-check helper.
    pub fn artifact_invalid(artifact: &'static str, reason: impl Into<String>) -> Self {
        Self::ArtifactInvalid {
            artifact,
            reason: reason.into(),
        }
    }

    /// Inference helper.
    pub fn inference(msg: impl Into<String>) -> Self {
        Self::Inference(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_stable() {
        assert_eq!(ErrorCode::Ok as u32, 0);
        assert_eq!(ErrorCode::LoadFailure as u32, 1);
        assert_eq!(ErrorCode::ServiceUnavailable as u32, 2);
        assert_eq!(ErrorCode::InvalidInput as u32, 3);
        assert_eq!(ErrorCode::InferenceFailure as u32, 4);
        assert_eq!(ErrorCode::Config as u32, 5);
    }

    #[test]
    fn validation_errors_map_to_invalid_input() {
        assert_eq!(
            PremiumError::MissingKey("Age").code(),
            ErrorCode::InvalidInput
        );
        assert_eq!(
            PremiumError::invalid_field("Height", "not a number").code(),
            ErrorCode::InvalidInput
        );
        assert_eq!(
            PremiumError::BodyTooLarge { limit: 1 }.code(),
            ErrorCode::InvalidInput
        );
        assert_eq!(
            PremiumError::inference("shape").code(),
            ErrorCode::InferenceFailure
        );
        assert_eq!(
            PremiumError::NotInitialized.code(),
            ErrorCode::ServiceUnavailable
        );
    }

    #[test]
    fn missing_key_message_names_the_key() {
        assert_eq!(
            PremiumError::MissingKey("Weight").to_string(),
            "Missing key: Weight"
        );
    }
}
