//! Config validation with field paths in every message.

use thiserror::Error;

use crate::schema::CyberSaferConfig;

/// Polling faster than this only adds load on the server.
const MIN_SENSIBLE_POLL_INTERVAL_MS: u64 = 500;

const KNOWN_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error", "off"];

/// A config validation error with field path and message.
#[derive(Debug, Error)]
#[error("Config validation error at '{path}': {message}")]
pub struct ConfigValidationError {
    pub path: String,
    pub message: String,
}

/// All errors and warnings found in one pass.
#[derive(Debug, Default)]
pub struct ValidationReport {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    fn error(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            path: path.into(),
            message: message.into(),
        });
    }

    fn warn(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            path: path.into(),
            message: message.into(),
        });
    }
}

pub fn validate(config: &CyberSaferConfig) -> ValidationReport {
    let mut report = ValidationReport::default();
    validate_server(config, &mut report);
    validate_polling(config, &mut report);
    validate_logging(config, &mut report);
    report
}

fn validate_server(config: &CyberSaferConfig, report: &mut ValidationReport) {
    let url = config.base_url();
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        report.error("server.baseUrl", format!("Expected an http(s) URL, got {url:?}"));
    }
    if config.connect_timeout_secs() == 0 {
        report.error("server.connectTimeoutSecs", "Must be at least 1 second");
    }
}

fn validate_polling(config: &CyberSaferConfig, report: &mut ValidationReport) {
    let interval = config.poll_interval_ms();
    if interval == 0 {
        report.error("polling.intervalMs", "Must be greater than 0");
    } else if interval < MIN_SENSIBLE_POLL_INTERVAL_MS {
        report.warn(
            "polling.intervalMs",
            format!("{interval}ms is very frequent; {MIN_SENSIBLE_POLL_INTERVAL_MS}ms or more is recommended"),
        );
    }
}

fn validate_logging(config: &CyberSaferConfig, report: &mut ValidationReport) {
    let level = config.log_level();
    // Full filter directives ("cybersafer_view=debug,info") are left to EnvFilter.
    if !level.contains('=') && !KNOWN_LOG_LEVELS.contains(&level.to_ascii_lowercase().as_str()) {
        report.warn("logging.level", format!("Unknown log level {level:?}"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{LoggingConfig, PollingConfig};

    #[test]
    fn defaults_are_valid() {
        let report = validate(&CyberSaferConfig::default());
        assert!(report.is_valid());
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn rejects_non_http_base_url() {
        let mut cfg = CyberSaferConfig::default();
        cfg.set_base_url("localhost:8021");
        let report = validate(&cfg);
        assert!(!report.is_valid());
        assert_eq!(report.errors[0].path, "server.baseUrl");
    }

    #[test]
    fn zero_interval_is_an_error_and_fast_interval_a_warning() {
        let mut cfg = CyberSaferConfig::default();
        cfg.polling = Some(PollingConfig { enabled: None, interval_ms: Some(0) });
        assert!(!validate(&cfg).is_valid());

        cfg.polling = Some(PollingConfig { enabled: None, interval_ms: Some(100) });
        let report = validate(&cfg);
        assert!(report.is_valid());
        assert_eq!(report.warnings.len(), 1);
    }

    #[test]
    fn filter_directives_are_accepted() {
        let mut cfg = CyberSaferConfig::default();
        cfg.logging = Some(LoggingConfig {
            level: Some("cybersafer_view=debug,info".to_string()),
            ..Default::default()
        });
        assert!(validate(&cfg).warnings.is_empty());

        cfg.logging = Some(LoggingConfig {
            level: Some("loud".to_string()),
            ..Default::default()
        });
        assert_eq!(validate(&cfg).warnings.len(), 1);
    }
}
