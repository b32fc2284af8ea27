// Process-wide tracing setup.

use tracing_subscriber::{fmt, EnvFilter};

use crate::config::LoggingConfig;

/// `RUST_LOG` wins when set; otherwise `logging.level` applies.
pub fn build_filter(config: &LoggingConfig) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Install the global subscriber. Later calls are ignored so tests and the
/// CLI can both call this freely.
pub fn init_logging(config: &LoggingConfig) {
    let _ = fmt()
        .with_env_filter(build_filter(config))
        .with_target(false)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_init_is_harmless() {
        let config = LoggingConfig::default();
        init_logging(&config);
        init_logging(&config);
    }

    #[test]
    fn garbage_level_falls_back() {
        let config = LoggingConfig {
            level: "not a level[".to_string(),
        };
        // Must not panic.
        let _ = build_filter(&config);
    }
}
