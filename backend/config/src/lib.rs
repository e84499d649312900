//! `cybersafer-config`: configuration for the Cyber Safer client.
//!
//! Provides:
//! - Typed config schema (server, polling, display, logging)
//! - YAML loading from `~/.cybersafer/config.yaml`
//! - `${ENV_VAR}` substitution and `CYBERSAFER_*` overrides
//! - Default value application
//! - Validation

pub mod defaults;
pub mod env;
pub mod io;
pub mod schema;
pub mod validation;

pub use defaults::apply_all_defaults;
pub use env::{
    apply_env_overrides_with, resolve_env_vars_with, MissingEnvVarError, ENV_BASE_URL,
    ENV_LOG_LEVEL, ENV_POLL_INTERVAL_MS,
};
pub use io::{config_dir, config_file_path, load_config_value};
pub use schema::{CyberSaferConfig, DisplayConfig, LoggingConfig, PollingConfig, ServerConfig};
pub use validation::{validate, ConfigValidationError, ValidationReport};

use std::collections::HashMap;
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde_json::Value;

/// Load a config file, substitute env vars, apply overrides and defaults,
/// and validate.
///
/// This is the main entry point for loading a config at runtime. `env` is
/// usually the process environment; callers with their own overrides (such
/// as command-line flags) insert them under the `CYBERSAFER_*` keys so they
/// are validated like every other source. Validation warnings are logged;
/// validation errors fail the load.
pub async fn load_and_prepare(
    path: &Path,
    env: &HashMap<String, String>,
) -> Result<CyberSaferConfig> {
    let raw = load_config_value(path).await?;
    prepare(raw, env)
}

/// The load pipeline after reading the file, with an explicit environment.
pub fn prepare(raw: Value, env: &HashMap<String, String>) -> Result<CyberSaferConfig> {
    let value = resolve_env_vars_with(&raw, env).context("Failed to resolve env vars in config")?;

    let config: CyberSaferConfig =
        serde_json::from_value(value).context("Failed to deserialize config")?;

    let config = apply_env_overrides_with(config, env)?;
    let config = apply_all_defaults(config);

    let report = validate(&config);
    for warning in &report.warnings {
        tracing::warn!(path = %warning.path, message = %warning.message, "Config warning");
    }
    if let Some(first) = report.errors.first() {
        for error in &report.errors {
            tracing::error!(path = %error.path, message = %error.message, "Config error");
        }
        bail!("{first}");
    }

    Ok(config)
}
