//! Plain log output for short-lived commands

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{AppConfig, LogFormat};

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

impl From<&AppConfig> for LoggingConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            level: config.logging.level.clone(),
            format: config.logging.format.clone(),
        }
    }
}

/// Install a subscriber without span export.
///
/// Used by administrative commands; `serve` goes through `init_tracing`.
pub fn init_logging(config: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.level));

    match config.format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        LogFormat::Pretty => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .init();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_app_config() {
        let config = AppConfig::default();
        let logging = LoggingConfig::from(&config);

        assert_eq!(logging.level, "info");
        assert!(matches!(logging.format, LogFormat::Pretty));
    }
}
