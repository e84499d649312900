mod play_cmd;
mod scenario_cmd;
mod terminal;
mod terminal_output;

use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{debug, warn};

use cybersafer_client::ApiClient;
use cybersafer_config::{
    config_dir, config_file_path, load_and_prepare, validate, CyberSaferConfig, ENV_BASE_URL,
};

#[derive(Parser)]
#[command(name = "cybersafer")]
#[command(about = "Cyber Safer: practise spotting scams against a scripted adversary")]
#[command(version)]
struct Cli {
    /// Config file (defaults to ~/.cybersafer/config.yaml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Scenario server base URL, overriding the config file
    #[arg(long, global = true)]
    base_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check that the scenario server is reachable
    Health,
    /// List available scenarios by category
    Scenarios {
        /// Print the raw JSON response
        #[arg(long)]
        json: bool,
    },
    /// Show one scenario's details
    Scenario { id: String },
    /// Start a scenario
    Start { id: String },
    /// Send one message to the active scenario and stream the reply
    Chat { message: String },
    /// Show red-flag progress for the active scenario
    Status,
    /// Finish the active scenario and print the report
    Complete,
    /// Leave scenario mode
    Exit,
    /// Play a scenario interactively
    Play { id: String },
}

/// Load the config file with `env` overrides. `--base-url` takes the place
/// of `CYBERSAFER_BASE_URL` so it goes through the same validation.
async fn load_config(cli: &Cli, mut env: HashMap<String, String>) -> Result<CyberSaferConfig> {
    let path = match &cli.config {
        Some(path) => path.clone(),
        None => config_file_path(&config_dir()),
    };
    if let Some(url) = &cli.base_url {
        env.insert(ENV_BASE_URL.to_string(), url.clone());
    }
    load_and_prepare(&path, &env)
        .await
        .with_context(|| format!("Failed to load config from {}", path.display()))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli, std::env::vars().collect()).await?;
    cybersafer_logging::init_logger(&config)?;
    // Load-time warnings fire before the subscriber exists.
    for warning in validate(&config).warnings {
        warn!(path = %warning.path, message = %warning.message, "Config warning");
    }

    let client = ApiClient::from_config(&config)?;
    debug!(base_url = client.base_url(), "API client ready");

    match cli.command {
        Commands::Health => scenario_cmd::health(&client).await?,
        Commands::Scenarios { json } => scenario_cmd::list(&client, json).await?,
        Commands::Scenario { id } => scenario_cmd::show(&client, &id).await?,
        Commands::Start { id } => scenario_cmd::start(&client, &config, &id).await?,
        Commands::Chat { message } => scenario_cmd::chat(&client, &config, &message).await?,
        Commands::Status => scenario_cmd::status(&client).await?,
        Commands::Complete => scenario_cmd::complete(&client).await?,
        Commands::Exit => scenario_cmd::exit(&client).await?,
        Commands::Play { id } => play_cmd::run(client, &config, &id).await?,
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn missing_config() -> String {
        std::env::temp_dir()
            .join("cybersafer-cli-no-such-dir/config.yaml")
            .display()
            .to_string()
    }

    #[tokio::test]
    async fn base_url_flag_without_scheme_is_rejected() {
        let path = missing_config();
        let cli = Cli::parse_from([
            "cybersafer",
            "--config",
            path.as_str(),
            "--base-url",
            "localhost:8021",
            "health",
        ]);

        let err = load_config(&cli, HashMap::new()).await.unwrap_err();
        assert!(format!("{err:#}").contains("server.baseUrl"));
    }

    #[tokio::test]
    async fn base_url_flag_beats_environment() {
        let path = missing_config();
        let cli = Cli::parse_from([
            "cybersafer",
            "--config",
            path.as_str(),
            "--base-url",
            "https://lab.example",
            "status",
        ]);
        let env: HashMap<String, String> =
            [(ENV_BASE_URL.to_string(), "http://other:8021".to_string())].into_iter().collect();

        let config = load_config(&cli, env).await.unwrap();
        assert_eq!(config.base_url(), "https://lab.example");
    }

    #[tokio::test]
    async fn environment_applies_without_flag() {
        let path = missing_config();
        let cli = Cli::parse_from(["cybersafer", "--config", path.as_str(), "exit"]);
        let env: HashMap<String, String> =
            [(ENV_BASE_URL.to_string(), "http://other:8021".to_string())].into_iter().collect();

        let config = load_config(&cli, env).await.unwrap();
        assert_eq!(config.base_url(), "http://other:8021");
    }
}
