//! Logging setup.
//!
//! Log lines carry the fields `ev` (event name), `code` (see
//! [`ErrorCode`](crate::common::error::ErrorCode)) and `dur_ms` where a
//! duration applies.

use tracing_subscriber::EnvFilter;

use crate::common::config::{AppCfg, LogFormat};

/// Default filter directive for the configured verbosity.
pub fn default_directive(cfg: &AppCfg) -> &'static str {
    if cfg.debug {
        "debug"
    } else {
        "info,tower_http=warn"
    }
}

/// Install the global subscriber. `RUST_LOG` wins over the debug flag.
/// Calling this twice is harmless; the second install is ignored.
pub fn init(cfg: &AppCfg) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(cfg)));

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    let _ = match cfg.log_format {
        LogFormat::Json => builder.json().with_current_span(false).try_init(),
        LogFormat::Text => builder.with_target(true).try_init(),
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_flag_selects_verbose_directive() {
        let cfg = AppCfg {
            debug: true,
            ..AppCfg::default()
        };
        assert_eq!(default_directive(&cfg), "debug");
        assert_eq!(default_directive(&AppCfg::default()), "info,tower_http=warn");
    }

    #[test]
    fn init_twice_does_not_panic() {
        init(&AppCfg::default());
        init(&AppCfg::default());
    }
}
