//! One-shot scenario commands.
//!
//! Each command makes a single request and prints the result. The server
//! keeps the active scenario, so `start`, `chat`, `status`, `complete` and
//! `exit` can be issued from separate invocations.

use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use serde_json::Value;

use cybersafer_client::ApiClient;
use cybersafer_config::CyberSaferConfig;
use cybersafer_core::{CompletionReport, ExitAck, ScenarioCatalog, ScenarioStatus, StartedScenario};
use cybersafer_view::{CounterSink, StreamRenderer};

use crate::terminal::{TerminalCounter, TerminalTranscript};
use crate::terminal_output::{
    note_info, note_success, note_warn, paint, render_table, supports_color, BOLD, DIM,
};

pub async fn health(client: &ApiClient) -> Result<()> {
    let body = client
        .health()
        .await
        .with_context(|| format!("Server at {} is not reachable", client.base_url()))?;
    let app = body.get("app").and_then(Value::as_str).unwrap_or("unknown");
    let status = body.get("status").and_then(Value::as_str).unwrap_or("unknown");
    note_success(&format!("{app} at {}: {status}", client.base_url()));
    Ok(())
}

pub async fn list(client: &ApiClient, json: bool) -> Result<()> {
    let body = client.list_scenarios().await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&body)?);
        return Ok(());
    }

    let catalog: ScenarioCatalog =
        serde_json::from_value(body).context("Unexpected scenario list shape")?;
    if catalog.total() == 0 {
        note_warn("No scenarios available");
        return Ok(());
    }

    let color = supports_color();
    for (category, scenarios) in &catalog.categories {
        println!("\n{}", paint(category, BOLD, color));
        let rows: Vec<Vec<String>> = scenarios
            .iter()
            .map(|s| vec![s.id.clone(), s.difficulty.clone(), s.title.clone()])
            .collect();
        print!("{}", render_table(&["ID", "Difficulty", "Title"], &rows));
    }
    println!();
    note_info(&format!("{} scenarios", catalog.total()));
    Ok(())
}

pub async fn show(client: &ApiClient, scenario_id: &str) -> Result<()> {
    let body = client
        .get_scenario(scenario_id)
        .await
        .with_context(|| format!("Failed to load scenario '{scenario_id}'"))?;
    println!("{}", serde_json::to_string_pretty(&body)?);
    Ok(())
}

pub async fn start(client: &ApiClient, config: &CyberSaferConfig, scenario_id: &str) -> Result<()> {
    let body = client
        .start_scenario(scenario_id)
        .await
        .with_context(|| format!("Failed to start scenario '{scenario_id}'"))?;
    let started: StartedScenario = serde_json::from_value(body)?;
    print_started(&started);
    if !started.initial_message.is_empty() {
        let from = started.adversary.as_deref().unwrap_or(config.bot_label());
        println!("\n{}: {}", paint(from, BOLD, supports_color()), started.initial_message);
    }
    Ok(())
}

/// Banner for a freshly started scenario. The opening message itself is
/// rendered by the caller.
pub fn print_started(started: &StartedScenario) {
    let color = supports_color();
    let title = started
        .scenario
        .title
        .as_deref()
        .unwrap_or(&started.scenario.id);
    note_success(&format!("Scenario started: {}", paint(title, BOLD, color)));
    if let Some(intro) = started.scenario.introduction.as_deref() {
        println!("{}", paint(intro, DIM, color));
    }
}

pub async fn chat(client: &ApiClient, config: &CyberSaferConfig, message: &str) -> Result<()> {
    let color = supports_color();
    let counter: Arc<dyn CounterSink> = Arc::new(TerminalCounter::stderr(color));
    let transcript = TerminalTranscript::new(std::io::stdout(), color).without_user_echo();
    let mut renderer = StreamRenderer::new(transcript, counter)
        .with_labels(config.bot_label(), config.user_label());

    let started = Instant::now();
    let mut stream = client.send_message(message).await?;
    let reply = renderer.render_stream(&mut stream).await?;

    let summary = format!(
        "{:.2}s, {} chars",
        started.elapsed().as_secs_f64(),
        reply.chars().count()
    );
    eprintln!("{}", paint(&summary, DIM, color));
    Ok(())
}

pub async fn status(client: &ApiClient) -> Result<()> {
    let status: ScenarioStatus = client.scenario_status().await?;
    if !status.active {
        note_info("No active scenario");
        return Ok(());
    }
    TerminalCounter::stdout(supports_color()).update_counter(status.counter());
    Ok(())
}

pub async fn complete(client: &ApiClient) -> Result<()> {
    let body = client
        .complete_scenario()
        .await
        .context("Failed to complete scenario")?;
    let report: CompletionReport = serde_json::from_value(body)?;
    print_report(&report);
    Ok(())
}

pub fn print_report(report: &CompletionReport) {
    let color = supports_color();
    println!("\n{}", paint("Scenario report", BOLD, color));
    println!("  Score:        {}", report.score);
    println!("  Passed:       {}", if report.passed { "yes" } else { "no" });
    println!(
        "  Red flags:    {}/{}",
        report.red_flags_detected.len(),
        report.red_flags_total
    );
    for flag in &report.red_flags_detected {
        println!("    - {flag}");
    }
    println!(
        "  Criteria met: {}/{}",
        report.success_criteria_met.len(),
        report.success_criteria_total.len()
    );
    if !report.feedback.is_empty() {
        println!("\n{}", report.feedback);
    }
    if !report.learning_objectives.is_empty() {
        println!("\n{}", paint("Learning objectives", BOLD, color));
        for objective in &report.learning_objectives {
            println!("  - {objective}");
        }
    }
    println!();
    if report.passed {
        note_success("Scenario passed");
    } else {
        note_warn("Scenario not passed");
    }
}

pub async fn exit(client: &ApiClient) -> Result<()> {
    let body = client.exit_scenario().await.context("Failed to exit scenario")?;
    let ack: ExitAck = serde_json::from_value(body)?;
    if ack.message.is_empty() {
        note_info("Left scenario mode");
    } else {
        note_info(&ack.message);
    }
    Ok(())
}
