//! Logging and tracing setup

use tracing_subscriber::{
    fmt, layer::SubscriberExt, prelude::*, util::SubscriberInitExt, EnvFilter,
};

use crate::config::LoggingConfig;
use crate::error::{ProjectionError, Result};

/// Initialize logging at `info`, or whatever `RUST_LOG` asks for
pub fn initialize_logging() -> Result<()> {
    initialize_logging_with_config(&LoggingConfig::default())
}

/// Initialize logging from configuration
///
/// `RUST_LOG` still takes precedence over the configured level. Output goes to
/// stderr so board JSON on stdout stays clean.
pub fn initialize_logging_with_config(config: &LoggingConfig) -> Result<()> {
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.level).map_err(|e| {
            ProjectionError::invalid_config(format!("log level {}: {e}", config.level))
        })?,
    };

    let fmt_layer = match config.format.as_str() {
        "json" => fmt::layer()
            .json()
            .with_target(true)
            .with_thread_names(true)
            .with_writer(std::io::stderr)
            .boxed(),
        "pretty" => fmt::layer()
            .pretty()
            .with_target(false)
            .with_thread_names(true)
            .with_file(true)
            .with_line_number(true)
            .with_writer(std::io::stderr)
            .boxed(),
        "compact" => fmt::layer()
            .compact()
            .with_target(false)
            .with_thread_names(true)
            .with_writer(std::io::stderr)
            .boxed(),
        other => {
            return Err(ProjectionError::invalid_config(format!(
                "unknown log format {other}, expected compact, pretty or json"
            )))
        }
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()
        .map_err(|e| ProjectionError::invalid_config(format!("logging already initialized: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_format_rejected() {
        let config = LoggingConfig { level: "info".to_string(), format: "xml".to_string() };
        assert!(initialize_logging_with_config(&config).is_err());
    }
}
