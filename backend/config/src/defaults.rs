//! Config defaults: applies default values to a parsed config.

use crate::schema::{
    CyberSaferConfig, DisplayConfig, LoggingConfig, PollingConfig, ServerConfig,
};

pub const DEFAULT_BASE_URL: &str = "http://localhost:8021";

pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Status poll period.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 2000;

pub const DEFAULT_BOT_LABEL: &str = "Bot";

pub const DEFAULT_USER_LABEL: &str = "You";

pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Apply all defaults to a freshly loaded config.
pub fn apply_all_defaults(config: CyberSaferConfig) -> CyberSaferConfig {
    let config = apply_server_defaults(config);
    let config = apply_polling_defaults(config);
    let config = apply_display_defaults(config);
    apply_logging_defaults(config)
}

fn apply_server_defaults(mut config: CyberSaferConfig) -> CyberSaferConfig {
    let server = config.server.get_or_insert_with(ServerConfig::default);
    if server.base_url.is_none() {
        server.base_url = Some(DEFAULT_BASE_URL.to_string());
    }
    if server.connect_timeout_secs.is_none() {
        server.connect_timeout_secs = Some(DEFAULT_CONNECT_TIMEOUT_SECS);
    }
    config
}

fn apply_polling_defaults(mut config: CyberSaferConfig) -> CyberSaferConfig {
    let polling = config.polling.get_or_insert_with(PollingConfig::default);
    if polling.enabled.is_none() {
        polling.enabled = Some(true);
    }
    if polling.interval_ms.is_none() {
        polling.interval_ms = Some(DEFAULT_POLL_INTERVAL_MS);
    }
    config
}

fn apply_display_defaults(mut config: CyberSaferConfig) -> CyberSaferConfig {
    let display = config.display.get_or_insert_with(DisplayConfig::default);
    if display.bot_label.is_none() {
        display.bot_label = Some(DEFAULT_BOT_LABEL.to_string());
    }
    if display.user_label.is_none() {
        display.user_label = Some(DEFAULT_USER_LABEL.to_string());
    }
    config
}

fn apply_logging_defaults(mut config: CyberSaferConfig) -> CyberSaferConfig {
    let logging = config.logging.get_or_insert_with(LoggingConfig::default);
    if logging.level.is_none() {
        logging.level = Some(DEFAULT_LOG_LEVEL.to_string());
    }
    if logging.json.is_none() {
        logging.json = Some(false);
    }
    config
}
