//! Client configuration schema.
//!
//! Every section is optional in the file; `defaults::apply_all_defaults`
//! fills in what is missing and the accessors on [`CyberSaferConfig`] read
//! the resolved values.

use serde::{Deserialize, Serialize};

use crate::defaults::{
    DEFAULT_BASE_URL, DEFAULT_BOT_LABEL, DEFAULT_CONNECT_TIMEOUT_SECS, DEFAULT_LOG_LEVEL,
    DEFAULT_POLL_INTERVAL_MS, DEFAULT_USER_LABEL,
};

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CyberSaferConfig {
    /// Scenario server connection
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server: Option<ServerConfig>,

    /// Background status polling
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub polling: Option<PollingConfig>,

    /// Transcript labels
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display: Option<DisplayConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerConfig {
    /// Origin of the scenario server, e.g. `http://localhost:8021`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connect_timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PollingConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval_ms: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bot_label: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_label: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoggingConfig {
    /// `tracing` filter directive used when `RUST_LOG` is unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,

    /// Directory for daily-rotated JSON log files; no file logging if unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<String>,

    /// Emit console logs as JSON
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub json: Option<bool>,
}

impl CyberSaferConfig {
    pub fn base_url(&self) -> &str {
        self.server
            .as_ref()
            .and_then(|s| s.base_url.as_deref())
            .unwrap_or(DEFAULT_BASE_URL)
    }

    pub fn connect_timeout_secs(&self) -> u64 {
        self.server
            .as_ref()
            .and_then(|s| s.connect_timeout_secs)
            .unwrap_or(DEFAULT_CONNECT_TIMEOUT_SECS)
    }

    pub fn polling_enabled(&self) -> bool {
        self.polling.as_ref().and_then(|p| p.enabled).unwrap_or(true)
    }

    pub fn poll_interval_ms(&self) -> u64 {
        self.polling
            .as_ref()
            .and_then(|p| p.interval_ms)
            .unwrap_or(DEFAULT_POLL_INTERVAL_MS)
    }

    pub fn bot_label(&self) -> &str {
        self.display
            .as_ref()
            .and_then(|d| d.bot_label.as_deref())
            .unwrap_or(DEFAULT_BOT_LABEL)
    }

    pub fn user_label(&self) -> &str {
        self.display
            .as_ref()
            .and_then(|d| d.user_label.as_deref())
            .unwrap_or(DEFAULT_USER_LABEL)
    }

    pub fn log_level(&self) -> &str {
        self.logging
            .as_ref()
            .and_then(|l| l.level.as_deref())
            .unwrap_or(DEFAULT_LOG_LEVEL)
    }

    /// Set the server origin, e.g. from a command-line flag.
    pub fn set_base_url(&mut self, url: impl Into<String>) {
        self.server.get_or_insert_with(ServerConfig::default).base_url = Some(url.into());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_camel_case_yaml() {
        let yaml = "
server:
  baseUrl: http://training.local:9000
  connectTimeoutSecs: 3
polling:
  intervalMs: 1500
display:
  botLabel: Mentor
logging:
  level: debug
  dir: /tmp/cybersafer-logs
";
        let cfg: CyberSaferConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(cfg.base_url(), "http://training.local:9000");
        assert_eq!(cfg.connect_timeout_secs(), 3);
        assert_eq!(cfg.poll_interval_ms(), 1500);
        assert_eq!(cfg.bot_label(), "Mentor");
        assert_eq!(cfg.user_label(), DEFAULT_USER_LABEL);
        assert_eq!(cfg.log_level(), "debug");
    }

    #[test]
    fn empty_document_reads_as_defaults() {
        let cfg: CyberSaferConfig = serde_yaml::from_str("{}").unwrap();
        assert_eq!(cfg.base_url(), DEFAULT_BASE_URL);
        assert!(cfg.polling_enabled());
        assert_eq!(cfg.poll_interval_ms(), DEFAULT_POLL_INTERVAL_MS);
    }

    #[test]
    fn set_base_url_creates_section() {
        let mut cfg = CyberSaferConfig::default();
        cfg.set_base_url("https://example.org");
        assert_eq!(cfg.base_url(), "https://example.org");
    }
}
