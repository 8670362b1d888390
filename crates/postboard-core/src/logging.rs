//! Log output setup

use crate::config::LogConfig;
use tracing_subscriber::EnvFilter;

/// Environment variable overriding the configured filter
pub const LOG_ENV: &str = "POSTBOARD_LOG";

/// Filter from `POSTBOARD_LOG`, else the configured directive, else `info`
#[must_use]
pub fn env_filter(config: &LogConfig) -> EnvFilter {
    std::env::var(LOG_ENV)
        .ok()
        .and_then(|directive| EnvFilter::try_new(directive).ok())
        .or_else(|| EnvFilter::try_new(&config.filter).ok())
        .unwrap_or_else(|| EnvFilter::new("info"))
}

/// Install the global subscriber writing to stderr
///
/// Returns `false` if a subscriber was already installed; safe to call from
/// several tests.
pub fn init(config: &LogConfig) -> bool {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter(config))
        .with_writer(std::io::stderr)
        .with_target(true);

    let installed = if config.json {
        builder.json().try_init().is_ok()
    } else {
        builder.try_init().is_ok()
    };

    if installed {
        tracing::debug!(filter = %config.filter, json = config.json, "logging initialized");
    }
    installed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bad_directive_falls_back() {
        let config = LogConfig {
            filter: "[[not a filter".to_string(),
            json: false,
        };
        // Must not panic
        let _ = env_filter(&config);
    }

    #[test]
    fn init_twice_is_harmless() {
        let config = LogConfig::default();
        init(&config);
        assert!(!init(&config));
    }
}
