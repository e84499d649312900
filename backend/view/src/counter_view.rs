//! Red-flag counter display.

use std::sync::{Mutex, PoisonError};

use cybersafer_core::Counter;

/// Receives counter updates from the stream renderer and the status poller.
///
/// Both writers share one sink and nothing orders them; the last update
/// wins.
pub trait CounterSink: Send + Sync {
    fn update_counter(&self, counter: Counter);
}

#[derive(Debug, Default)]
struct PanelState {
    display: String,
    progress_width: Option<String>,
    last: Option<Counter>,
}

/// In-memory counter display: a `"current/total"` text element and an
/// optional progress bar whose width is a percentage string.
#[derive(Debug)]
pub struct CounterPanel {
    has_progress_bar: bool,
    state: Mutex<PanelState>,
}

impl CounterPanel {
    /// A panel with a text display only.
    pub fn new() -> Self {
        Self {
            has_progress_bar: false,
            state: Mutex::new(PanelState::default()),
        }
    }

    /// A panel with a text display and a progress bar.
    pub fn with_progress_bar() -> Self {
        Self {
            has_progress_bar: true,
            state: Mutex::new(PanelState::default()),
        }
    }

    pub fn display_text(&self) -> String {
        self.lock().display.clone()
    }

    /// Current inline width of the progress bar; `None` if there is no bar
    /// or it has never been sized.
    pub fn progress_width(&self) -> Option<String> {
        self.lock().progress_width.clone()
    }

    pub fn last_counter(&self) -> Option<Counter> {
        self.lock().last
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, PanelState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for CounterPanel {
    fn default() -> Self {
        Self::new()
    }
}

impl CounterSink for CounterPanel {
    fn update_counter(&self, counter: Counter) {
        let mut state = self.lock();
        state.display = counter.to_string();
        state.last = Some(counter);
        if self.has_progress_bar {
            if let Some(width) = counter.width_style() {
                state.progress_width = Some(width);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sets_text_and_width() {
        let panel = CounterPanel::with_progress_bar();
        panel.update_counter(Counter::new(3, 10));
        assert_eq!(panel.display_text(), "3/10");
        assert_eq!(panel.progress_width().as_deref(), Some("30%"));
    }

    #[test]
    fn zero_total_keeps_previous_width() {
        let panel = CounterPanel::with_progress_bar();
        panel.update_counter(Counter::new(1, 4));
        panel.update_counter(Counter::new(0, 0));
        assert_eq!(panel.display_text(), "0/0");
        assert_eq!(panel.progress_width().as_deref(), Some("25%"));
    }

    #[test]
    fn missing_progress_bar_is_fine() {
        let panel = CounterPanel::new();
        panel.update_counter(Counter::new(2, 5));
        assert_eq!(panel.display_text(), "2/5");
        assert_eq!(panel.progress_width(), None);
    }
}
