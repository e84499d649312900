use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tracing::info;

use cybersafer_client::{ApiClient, ApiError};

use crate::counter_view::CounterSink;
use crate::poller::StatusPoller;
use crate::renderer::StreamRenderer;
use crate::surface::MessageContainer;

/// One chat session: the API client, the renderer for its message surface
/// and the status poller feeding the same counter.
///
/// The poller lives and dies with the session.
pub struct ChatSession<C: MessageContainer> {
    client: ApiClient,
    renderer: StreamRenderer<C>,
    poller: StatusPoller,
    polling_enabled: bool,
    scenario_id: Option<String>,
}

impl<C: MessageContainer> ChatSession<C> {
    pub fn new(client: ApiClient, container: C, counter: Arc<dyn CounterSink>) -> Self {
        let poller = StatusPoller::new(Arc::new(client.clone()), Arc::clone(&counter));
        Self {
            client,
            renderer: StreamRenderer::new(container, counter),
            poller,
            polling_enabled: true,
            scenario_id: None,
        }
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poller = self.poller.with_interval(interval);
        self
    }

    /// Disable the status poller; counters then only come from stream
    /// markers.
    pub fn with_polling(mut self, enabled: bool) -> Self {
        self.polling_enabled = enabled;
        self
    }

    pub fn with_labels(mut self, bot: impl Into<String>, user: impl Into<String>) -> Self {
        self.renderer = self.renderer.with_labels(bot, user);
        self
    }

    /// Start a scenario, show its opening message and begin polling.
    ///
    /// Returns the server's start confirmation unchanged.
    pub async fn start(&mut self, scenario_id: &str) -> Result<Value, ApiError> {
        let response = self.client.start_scenario(scenario_id).await?;
        info!(scenario = scenario_id, "Scenario started");

        if let Some(adversary) = response
            .get("adversary")
            .and_then(Value::as_str)
            .filter(|name| !name.is_empty())
        {
            self.renderer.set_bot_label(adversary);
        }
        if let Some(opener) = response
            .get("initial_message")
            .and_then(Value::as_str)
            .filter(|text| !text.is_empty())
        {
            self.renderer.push_bot_message(opener);
        }

        self.scenario_id = Some(scenario_id.to_string());
        if self.polling_enabled {
            self.poller.start();
        }
        Ok(response)
    }

    /// Send a message and render the streamed reply. Returns the reply text
    /// with counter markers removed.
    pub async fn send(&mut self, message: &str) -> Result<String, ApiError> {
        self.renderer.push_user_message(message);
        let mut stream = self.client.send_message(message).await?;
        self.renderer.render_stream(&mut stream).await
    }

    /// Finish the scenario and fetch the result summary.
    pub async fn complete(&mut self) -> Result<Value, ApiError> {
        let report = self.client.complete_scenario().await?;
        self.poller.stop();
        info!(scenario = ?self.scenario_id, "Scenario completed");
        Ok(report)
    }

    /// Leave scenario mode.
    pub async fn exit(&mut self) -> Result<Value, ApiError> {
        let ack = self.client.exit_scenario().await?;
        self.poller.stop();
        info!(scenario = ?self.scenario_id, "Scenario exited");
        self.scenario_id = None;
        Ok(ack)
    }

    pub fn scenario_id(&self) -> Option<&str> {
        self.scenario_id.as_deref()
    }

    pub fn renderer(&self) -> &StreamRenderer<C> {
        &self.renderer
    }

    pub fn poller(&self) -> &StatusPoller {
        &self.poller
    }
}
