//! Structured Logger
//!
//! Wraps `tracing` with a console layer on stderr (stdout carries the chat
//! transcript) and, when a log directory is configured, a daily-rotated
//! NDJSON file layer.

use std::path::Path;

use anyhow::{Context, Result};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use cybersafer_config::CyberSaferConfig;

/// Log files are named `cybersafer.log.YYYY-MM-DD`.
pub const LOG_FILE_PREFIX: &str = "cybersafer.log";

/// `RUST_LOG` if set and valid, otherwise the configured level.
pub fn build_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
}

/// Initialize the global subscriber from the `logging` config section.
///
/// Calling it again after a subscriber is installed is a no-op.
pub fn init_logger(config: &CyberSaferConfig) -> Result<()> {
    let logging = config.logging.clone().unwrap_or_default();
    let json_console = logging.json.unwrap_or(false);

    let console_layer = if json_console {
        fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .boxed()
    } else {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .boxed()
    };

    let file_layer = match logging.dir.as_deref() {
        Some(dir) => Some(file_layer(Path::new(dir))?),
        None => None,
    };

    let _ = tracing_subscriber::registry()
        .with(build_filter(config.log_level()))
        .with(console_layer)
        .with(file_layer)
        .try_init();
    Ok(())
}

fn file_layer<S>(dir: &Path) -> Result<Box<dyn Layer<S> + Send + Sync>>
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
{
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create log directory: {}", dir.display()))?;
    let appender = RollingFileAppender::new(Rotation::DAILY, dir, LOG_FILE_PREFIX);
    Ok(fmt::layer()
        .json()
        .with_writer(appender)
        .with_ansi(false)
        .boxed())
}

#[cfg(test)]
mod tests {
    use super::*;
    use cybersafer_config::LoggingConfig;

    #[test]
    fn creates_log_directory() {
        let dir = std::env::temp_dir().join(format!("cybersafer-logs-{}", std::process::id()));
        let mut config = CyberSaferConfig::default();
        config.logging = Some(LoggingConfig {
            level: Some("debug".to_string()),
            dir: Some(dir.display().to_string()),
            json: Some(true),
        });

        init_logger(&config).unwrap();
        assert!(dir.is_dir());

        // A second call must not panic.
        init_logger(&config).unwrap();
    }

    #[test]
    fn unwritable_log_dir_is_reported() {
        let blocker = std::env::temp_dir().join(format!("cybersafer-log-blocker-{}", std::process::id()));
        std::fs::write(&blocker, b"not a directory").unwrap();

        let mut config = CyberSaferConfig::default();
        config.logging = Some(LoggingConfig {
            dir: Some(blocker.join("logs").display().to_string()),
            ..Default::default()
        });
        assert!(init_logger(&config).is_err());
    }
}
