//! Interactive scenario play.
//!
//! Starts a scenario, polls its status in the background and turns every
//! stdin line into a chat message until the user completes or leaves.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::{info, warn};

use cybersafer_client::ApiClient;
use cybersafer_config::CyberSaferConfig;
use cybersafer_core::{CompletionReport, StartedScenario};
use cybersafer_view::{ChatSession, CounterSink, MessageContainer};

use crate::scenario_cmd::{print_report, print_started};
use crate::terminal::{TerminalCounter, TerminalTranscript};
use crate::terminal_output::{note_error, note_info, paint, supports_color, DIM};

/// A line typed at the prompt.
#[derive(Debug, PartialEq, Eq)]
enum Input<'a> {
    Complete,
    Exit,
    Help,
    Message(&'a str),
    Blank,
}

fn parse_input(line: &str) -> Input<'_> {
    match line.trim() {
        "" => Input::Blank,
        "/complete" => Input::Complete,
        "/exit" | "/quit" => Input::Exit,
        "/help" => Input::Help,
        text => Input::Message(text),
    }
}

pub async fn run(client: ApiClient, config: &CyberSaferConfig, scenario_id: &str) -> Result<()> {
    let color = supports_color();
    let counter: Arc<dyn CounterSink> = Arc::new(TerminalCounter::stderr(color));
    let transcript = TerminalTranscript::new(std::io::stdout(), color).without_user_echo();
    let mut session = ChatSession::new(client, transcript, counter)
        .with_labels(config.bot_label(), config.user_label())
        .with_poll_interval(Duration::from_millis(config.poll_interval_ms()))
        .with_polling(config.polling_enabled());

    play(&mut session, scenario_id, BufReader::new(tokio::io::stdin())).await
}

/// Drive one scenario from `input` lines. Once started, the scenario is
/// always exited, whether the loop ends by command, end of input or a
/// failed completion.
async fn play<C, R>(session: &mut ChatSession<C>, scenario_id: &str, input: R) -> Result<()>
where
    C: MessageContainer,
    R: AsyncBufRead + Unpin,
{
    let color = supports_color();
    let started = session
        .start(scenario_id)
        .await
        .with_context(|| format!("Failed to start scenario '{scenario_id}'"))?;
    if let Ok(started) = serde_json::from_value::<StartedScenario>(started) {
        print_started(&started);
    }
    println!(
        "{}",
        paint("Type a reply. /complete to finish, /exit to leave.", DIM, color)
    );

    let mut lines = input.lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => {
                info!("Input closed");
                break;
            }
            Err(err) => {
                warn!(error = %err, "Failed to read input");
                break;
            }
        };
        match parse_input(&line) {
            Input::Blank => continue,
            Input::Help => {
                note_info("/complete finishes the scenario with a report; /exit or /quit leaves it")
            }
            Input::Message(text) => {
                if let Err(err) = session.send(text).await {
                    warn!(error = %err, "Chat message failed");
                    note_error(&err.to_string());
                }
            }
            Input::Complete => {
                match session.complete().await {
                    Ok(body) => match serde_json::from_value::<CompletionReport>(body) {
                        Ok(report) => print_report(&report),
                        Err(err) => {
                            warn!(error = %err, "Unreadable completion report");
                            note_error(&format!("Could not read the scenario report: {err}"));
                        }
                    },
                    Err(err) => {
                        warn!(error = %err, "Scenario completion failed");
                        note_error(&format!("Failed to complete scenario: {err}"));
                    }
                }
                break;
            }
            Input::Exit => break,
        }
    }

    let ack = session.exit().await.context("Failed to exit scenario")?;
    if let Some(message) = ack.get("message").and_then(|m| m.as_str()) {
        note_info(message);
    }
    Ok(())
}
