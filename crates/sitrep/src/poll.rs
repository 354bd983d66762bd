//! Polling controller.
//!
//! Re-runs batch ingestion on a recurring timer. Starting triggers one
//! immediate batch, then the recurring schedule. At most one poller is
//! active at a time; starting again cancels the prior schedule first.
//! Stopping only suppresses the *next* scheduled run — an in-flight batch
//! started before the stop request is allowed to finish.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::ingest::FeedClient;
use crate::state::AppState;

/// A handle to a running poll schedule.
///
/// Lightweight and cloneable; dropping it does not stop the schedule,
/// calling [`PollHandle::stop`] does.
#[derive(Debug, Clone, Default)]
pub struct PollHandle {
    stop_signal: Arc<AtomicBool>,
}

impl PollHandle {
    /// Create a fresh handle.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Signal the schedule to stop before its next run.
    pub fn stop(&self) {
        self.stop_signal.store(true, Ordering::SeqCst);
    }

    /// Check if the stop signal has been sent.
    #[must_use]
    pub fn should_stop(&self) -> bool {
        self.stop_signal.load(Ordering::SeqCst)
    }
}

/// Controller enforcing the one-active-schedule rule.
///
/// The controller holds at most one handle; starting a new schedule stops
/// whatever was running first.
#[derive(Debug, Default)]
pub struct Poller {
    handle: Option<PollHandle>,
}

impl Poller {
    /// Create an idle poller.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a schedule has been started and not yet stopped.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.should_stop())
    }

    /// Start polling: one immediate batch, then one batch per interval.
    ///
    /// Any prior schedule is cancelled first, so at most one timer is ever
    /// active.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInterval`] for an interval below 1 minute;
    /// nothing is started or cancelled in that case.
    pub fn start(
        &mut self,
        interval_minutes: u64,
        client: Arc<FeedClient>,
        state: Arc<Mutex<AppState>>,
    ) -> Result<PollHandle> {
        if interval_minutes < 1 {
            return Err(Error::InvalidInterval {
                minutes: interval_minutes,
            });
        }

        self.stop();

        let handle = PollHandle::new();
        let task_handle = handle.clone();

        tokio::spawn(async move {
            let period = Duration::from_secs(interval_minutes * 60);
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

            // The first tick of a tokio interval completes immediately,
            // giving the "fetch now, then every N minutes" behavior.
            loop {
                ticker.tick().await;
                if task_handle.should_stop() {
                    debug!("poll schedule stopped");
                    break;
                }
                let mut state = state.lock().await;
                let reports = client.ingest_all(&mut state).await;
                drop(state);
                debug!("poll batch finished: {} feeds", reports.len());
            }
        });

        info!("polling every {interval_minutes} minutes");
        self.handle = Some(handle.clone());
        Ok(handle)
    }

    /// Stop the current schedule, if any. Idempotent.
    pub fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.stop();
            info!("polling stopped");
        }
    }
}
