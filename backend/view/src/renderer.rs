//! Incremental rendering of streamed chat replies.

use std::sync::Arc;

use tracing::debug;

use cybersafer_client::{ApiError, ChatStream};
use cybersafer_core::{split_counter_marker, Role};

use crate::counter_view::CounterSink;
use crate::surface::MessageContainer;

/// Appends streamed text to the newest bot message, routing any leading
/// `[COUNTER:n/m]` marker to the counter sink instead of the transcript.
pub struct StreamRenderer<C> {
    container: C,
    counter: Arc<dyn CounterSink>,
    bot_label: String,
    user_label: String,
}

impl<C: MessageContainer> StreamRenderer<C> {
    pub fn new(container: C, counter: Arc<dyn CounterSink>) -> Self {
        Self {
            container,
            counter,
            bot_label: "Bot".to_string(),
            user_label: "You".to_string(),
        }
    }

    pub fn with_labels(mut self, bot: impl Into<String>, user: impl Into<String>) -> Self {
        self.bot_label = bot.into();
        self.user_label = user.into();
        self
    }

    pub fn set_bot_label(&mut self, label: impl Into<String>) {
        self.bot_label = label.into();
    }

    /// Render one chunk and return the text that reached the transcript.
    ///
    /// A marker is only recognised at the very start of the chunk. A chunk
    /// that is nothing but a marker updates the counter and touches no
    /// message element.
    pub fn render_chunk<'a>(&mut self, chunk: &'a str) -> &'a str {
        let text = match split_counter_marker(chunk) {
            Some(marker) => {
                debug!(counter = %marker.counter, "Counter marker in chat stream");
                self.counter.update_counter(marker.counter);
                marker.rest
            }
            None => chunk,
        };
        if text.is_empty() {
            return text;
        }

        let reuse = self
            .container
            .last_message()
            .is_some_and(|last| last.is_open_bot());
        if !reuse {
            self.container.push_message(Role::Bot, &self.bot_label);
        }
        self.container.append_to_last(text);
        self.container.scroll_to_latest();
        text
    }

    /// Consume `stream` to its end, rendering every chunk in arrival order.
    ///
    /// On a clean end the open bot message is marked complete. An error is
    /// returned as-is and leaves the message open.
    pub async fn render_stream(&mut self, stream: &mut ChatStream) -> Result<String, ApiError> {
        let mut rendered = String::new();
        while let Some(chunk) = stream.next_chunk().await? {
            rendered.push_str(self.render_chunk(&chunk));
        }
        self.finish_message();
        debug!(len = rendered.len(), "Chat stream rendered");
        Ok(rendered)
    }

    /// Mark the open bot message, if any, as complete.
    pub fn finish_message(&mut self) {
        if self
            .container
            .last_message()
            .is_some_and(|last| last.is_open_bot())
        {
            self.container.mark_last_complete();
        }
    }

    /// Add a finished message typed by the user.
    pub fn push_user_message(&mut self, text: &str) {
        self.push_complete(Role::User, text);
    }

    /// Add a finished bot message in one piece, e.g. a scenario's opener.
    pub fn push_bot_message(&mut self, text: &str) {
        self.push_complete(Role::Bot, text);
    }

    fn push_complete(&mut self, role: Role, text: &str) {
        let label = match role {
            Role::User => &self.user_label,
            Role::Bot => &self.bot_label,
        };
        self.container.push_message(role, label);
        self.container.append_to_last(text);
        self.container.mark_last_complete();
        self.container.scroll_to_latest();
    }

    pub fn container(&self) -> &C {
        &self.container
    }

    pub fn into_container(self) -> C {
        self.container
    }
}
