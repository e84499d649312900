//! Background red-flag status polling.
//!
//! A fallback for servers that do not embed counter markers in the chat
//! stream: while a scenario runs, the status endpoint is fetched on a fixed
//! interval and its counts are pushed to the counter sink.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use cybersafer_client::{ApiClient, ApiError};
use cybersafer_core::ScenarioStatus;

use crate::counter_view::CounterSink;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Where the poller reads scenario status from.
#[async_trait]
pub trait StatusSource: Send + Sync {
    async fn fetch_status(&self) -> Result<ScenarioStatus, ApiError>;
}

#[async_trait]
impl StatusSource for ApiClient {
    async fn fetch_status(&self) -> Result<ScenarioStatus, ApiError> {
        self.scenario_status().await
    }
}

#[derive(Default)]
struct PollState {
    // Bumped per started loop so a loop that ends by itself only clears
    // its own handle.
    generation: u64,
    handle: Option<JoinHandle<()>>,
}

/// Owns at most one polling loop. Dropping the poller aborts the loop.
pub struct StatusPoller {
    source: Arc<dyn StatusSource>,
    sink: Arc<dyn CounterSink>,
    interval: Duration,
    state: Arc<Mutex<PollState>>,
}

impl StatusPoller {
    pub fn new(source: Arc<dyn StatusSource>, sink: Arc<dyn CounterSink>) -> Self {
        Self {
            source,
            sink,
            interval: DEFAULT_POLL_INTERVAL,
            state: Arc::new(Mutex::new(PollState::default())),
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Start polling unless a loop is already running.
    ///
    /// Returns `true` if a new loop was spawned. The first poll happens one
    /// interval after the call; each later poll one interval after the
    /// previous fetch finished, so a slow server never gets back-to-back
    /// requests. Must be called from within a tokio runtime.
    pub fn start(&self) -> bool {
        let mut state = lock(&self.state);
        if state.handle.is_some() {
            debug!("Status polling already active");
            return false;
        }

        state.generation += 1;
        let generation = state.generation;
        let source = Arc::clone(&self.source);
        let sink = Arc::clone(&self.sink);
        let shared = Arc::clone(&self.state);
        let period = self.interval;

        state.handle = Some(tokio::spawn(async move {
            let mut ticker = time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let result = source.fetch_status().await;
                // Next poll a full period after this one finished.
                ticker.reset();
                match result {
                    Ok(status) if status.active => sink.update_counter(status.counter()),
                    Ok(_) => {
                        info!("Scenario no longer active; stopping status polling");
                        break;
                    }
                    Err(e) => warn!(error = %e, "Status poll failed"),
                }
            }

            let mut state = lock(&shared);
            if state.generation == generation {
                state.handle = None;
            }
        }));
        info!(interval_ms = period.as_millis() as u64, "Status polling started");
        true
    }

    /// Stop the running loop. Returns `true` if one was running.
    pub fn stop(&self) -> bool {
        match lock(&self.state).handle.take() {
            Some(handle) => {
                handle.abort();
                debug!("Status polling stopped");
                true
            }
            None => false,
        }
    }

    pub fn is_polling(&self) -> bool {
        lock(&self.state).handle.is_some()
    }
}

impl Drop for StatusPoller {
    fn drop(&mut self) {
        if let Some(handle) = lock(&self.state).handle.take() {
            handle.abort();
        }
    }
}

fn lock(state: &Mutex<PollState>) -> MutexGuard<'_, PollState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}
