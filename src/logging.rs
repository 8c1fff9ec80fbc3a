//! Global tracing subscriber setup

use std::sync::Once;

use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;

static INIT: Once = Once::new();

/// Filter directives in effect: `RUST_LOG` when set, otherwise the configured filter
pub fn filter_directives(config: &LoggingConfig) -> String {
    match std::env::var("RUST_LOG") {
        Ok(filter) if !filter.trim().is_empty() => filter,
        _ => config.filter.clone(),
    }
}

/// Installs the fmt subscriber once; later calls are ignored
pub fn init(config: &LoggingConfig) {
    INIT.call_once(|| {
        let directives = filter_directives(config);
        let filter = EnvFilter::try_new(&directives).unwrap_or_else(|e| {
            eprintln!("invalid log filter {directives:?}: {e}, falling back to info");
            EnvFilter::new("info")
        });

        let result = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_ansi(config.ansi)
            .with_target(config.with_target)
            .try_init();

        if result.is_ok() {
            debug!(filter = %directives, "logging initialized");
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_is_idempotent() {
        let config = LoggingConfig::default();
        init(&config);
        init(&config);
    }

    #[test]
    fn configured_filter_is_used_without_rust_log() {
        if std::env::var("RUST_LOG").is_ok() {
            return;
        }
        let config = LoggingConfig {
            filter: "debug,wgpu_core=warn".to_string(),
            ..LoggingConfig::default()
        };
        assert_eq!(filter_directives(&config), "debug,wgpu_core=warn");
    }
}
