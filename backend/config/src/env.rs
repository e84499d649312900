//! Environment handling for config values.
//!
//! String values may reference `${VAR_NAME}` (uppercase names only), which
//! is resolved at load time; `$${VAR_NAME}` escapes to a literal
//! `${VAR_NAME}`. A few `CYBERSAFER_*` variables also override config
//! fields directly.

use std::collections::HashMap;
use std::sync::LazyLock;

use anyhow::{bail, Context, Result};
use regex::{Captures, Regex};
use serde_json::Value;

use crate::schema::{CyberSaferConfig, LoggingConfig, PollingConfig};

/// `${VAR}` with an optional extra leading `$` marking an escape.
static ENV_REF_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\$)?\$\{([A-Z_][A-Z0-9_]*)\}").unwrap());

pub const ENV_BASE_URL: &str = "CYBERSAFER_BASE_URL";
pub const ENV_POLL_INTERVAL_MS: &str = "CYBERSAFER_POLL_INTERVAL_MS";
pub const ENV_LOG_LEVEL: &str = "CYBERSAFER_LOG_LEVEL";

/// Error returned for missing env vars.
#[derive(Debug, thiserror::Error)]
#[error("Missing env var \"{var_name}\" referenced at config path: {config_path}")]
pub struct MissingEnvVarError {
    pub var_name: String,
    pub config_path: String,
}

/// Substitute `${VAR}` references using the given variables. Unset or empty
/// variables are an error.
pub fn resolve_env_vars_with(value: &Value, env: &HashMap<String, String>) -> Result<Value> {
    substitute_value(value, env, "")
}

fn substitute_value(value: &Value, env: &HashMap<String, String>, path: &str) -> Result<Value> {
    match value {
        Value::String(s) => Ok(Value::String(substitute_string(s, env, path)?)),
        Value::Array(items) => items
            .iter()
            .enumerate()
            .map(|(i, v)| substitute_value(v, env, &format!("{path}[{i}]")))
            .collect::<Result<Vec<_>>>()
            .map(Value::Array),
        Value::Object(map) => {
            let mut out = serde_json::Map::with_capacity(map.len());
            for (key, v) in map {
                let child = if path.is_empty() {
                    key.clone()
                } else {
                    format!("{path}.{key}")
                };
                out.insert(key.clone(), substitute_value(v, env, &child)?);
            }
            Ok(Value::Object(out))
        }
        other => Ok(other.clone()),
    }
}

fn substitute_string(s: &str, env: &HashMap<String, String>, path: &str) -> Result<String> {
    if !s.contains('$') {
        return Ok(s.to_string());
    }

    let mut missing: Option<MissingEnvVarError> = None;
    let out = ENV_REF_PATTERN.replace_all(s, |caps: &Captures| {
        let name = &caps[2];
        if caps.get(1).is_some() {
            return format!("${{{name}}}");
        }
        match env.get(name) {
            Some(val) if !val.is_empty() => val.clone(),
            _ => {
                missing.get_or_insert_with(|| MissingEnvVarError {
                    var_name: name.to_string(),
                    config_path: path.to_string(),
                });
                String::new()
            }
        }
    });

    if let Some(err) = missing {
        bail!(err);
    }
    Ok(out.into_owned())
}

/// Apply `CYBERSAFER_*` overrides from `env`.
pub fn apply_env_overrides_with(
    mut config: CyberSaferConfig,
    env: &HashMap<String, String>,
) -> Result<CyberSaferConfig> {
    if let Some(url) = non_empty(env, ENV_BASE_URL) {
        config.set_base_url(url);
    }
    if let Some(raw) = non_empty(env, ENV_POLL_INTERVAL_MS) {
        let interval: u64 = raw
            .trim()
            .parse()
            .with_context(|| format!("{ENV_POLL_INTERVAL_MS} must be a whole number of milliseconds, got {raw:?}"))?;
        config.polling.get_or_insert_with(PollingConfig::default).interval_ms = Some(interval);
    }
    if let Some(level) = non_empty(env, ENV_LOG_LEVEL) {
        config.logging.get_or_insert_with(LoggingConfig::default).level = Some(level.to_string());
    }
    Ok(config)
}

fn non_empty<'a>(env: &'a HashMap<String, String>, key: &str) -> Option<&'a str> {
    env.get(key).map(String::as_str).filter(|v| !v.is_empty())
}
