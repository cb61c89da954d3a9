//! Runtime configuration loaded from the process environment.
//!
//! The snapshot is taken once at startup and never re-read.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

use crate::common::error::{PremiumError, PremiumResult};

pub const DEFAULT_MODEL_FILE: &str = "insurance_model.json";
pub const DEFAULT_SCALER_FILE: &str = "scaler.json";

/// Log output format.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum LogFormat {
    Text,
    Json,
}

/// Snapshot of configuration values consumed by the service.
#[derive(Clone, Debug)]
pub struct AppCfg {
    pub bind_addr: String,
    pub port: u16,
    pub debug: bool,
    pub log_format: LogFormat,
    /// Overrides the executable's directory as the artifact location.
    pub artifact_dir: Option<PathBuf>,
    pub model_file: String,
    pub scaler_file: String,
    pub max_body_bytes: usize,
}

impl Default for AppCfg {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1".to_string(),
            port: 5001,
            debug: false,
            log_format: LogFormat::Text,
            artifact_dir: None,
            model_file: DEFAULT_MODEL_FILE.to_string(),
            scaler_file: DEFAULT_SCALER_FILE.to_string(),
            max_body_bytes: 16_384,
        }
    }
}

impl AppCfg {
    /// Create a configuration snapshot from the process environment.
    pub fn load() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a snapshot from an arbitrary key lookup. Unparseable numbers fall back to defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let env_or = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        Self {
            bind_addr: env_or("PREMIUM_BIND_ADDR", &defaults.bind_addr),
            port: lookup("PREMIUM_PORT")
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(defaults.port),
            debug: lookup("PREMIUM_DEBUG").map(|v| is_truthy(&v)).unwrap_or(false),
            log_format: match lookup("PREMIUM_LOG_FORMAT").as_deref() {
                Some(v) if v.eq_ignore_ascii_case("json") => LogFormat::Json,
                _ => LogFormat::Text,
            },
            artifact_dir: lookup("PREMIUM_ARTIFACT_DIR")
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from),
            model_file: env_or("PREMIUM_MODEL_FILE", &defaults.model_file),
            scaler_file: env_or("PREMIUM_SCALER_FILE", &defaults.scaler_file),
            max_body_bytes: lookup("PREMIUM_MAX_BODY_BYTES")
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(defaults.max_body_bytes),
        }
    }

    /// Socket address the HTTP server binds to.
    pub fn listen_addr(&self) -> PremiumResult<SocketAddr> {
        format!("{}:{}", self.bind_addr, self.port)
            .parse()
            .map_err(|err| {
                PremiumError::Config(format!(
                    "bind address {}:{}: {err}",
                    self.bind_addr, self.port
                ))
            })
    }
}

fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
