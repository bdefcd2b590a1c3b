//! Hold timer implementations.
//!
//! [`TokioHoldTimer`] is the production timer: each scheduled token becomes a
//! spawned task that sleeps and then sends the token down a channel which the
//! event loop selects on.  Cancelling aborts the task.  A token that was sent
//! just before it was cancelled can still arrive; the gesture translator
//! ignores it because the session no longer holds that token.
//!
//! [`ManualHoldTimer`] never fires on its own.  Tests read the scheduled
//! tokens and deliver fires explicitly, which keeps gesture tests free of
//! real sleeps.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::trace;

use crate::application::translate_gestures::{HoldTimer, TimerToken};

/// Hold timer backed by Tokio tasks.
pub struct TokioHoldTimer {
    fired_tx: mpsc::UnboundedSender<TimerToken>,
    tasks: HashMap<TimerToken, JoinHandle<()>>,
}

impl TokioHoldTimer {
    /// Creates a timer that reports expiries on `fired_tx`.
    ///
    /// Must be used from within a Tokio runtime.
    pub fn new(fired_tx: mpsc::UnboundedSender<TimerToken>) -> Self {
        Self {
            fired_tx,
            tasks: HashMap::new(),
        }
    }
}

impl HoldTimer for TokioHoldTimer {
    fn schedule(&mut self, token: TimerToken, delay: Duration) {
        self.tasks.retain(|_, task| !task.is_finished());

        let tx = self.fired_tx.clone();
        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            // The receiver is gone only during shutdown.
            let _ = tx.send(token);
        });
        trace!(?token, ?delay, "hold timer scheduled");
        self.tasks.insert(token, task);
    }

    fn cancel(&mut self, token: TimerToken) {
        if let Some(task) = self.tasks.remove(&token) {
            task.abort();
            trace!(?token, "hold timer cancelled");
        }
    }
}

impl Drop for TokioHoldTimer {
    fn drop(&mut self) {
        for (_, task) in self.tasks.drain() {
            task.abort();
        }
    }
}

#[derive(Debug, Default)]
struct ManualState {
    scheduled: Vec<(TimerToken, Duration)>,
    cancelled: Vec<TimerToken>,
}

/// A hold timer driven by the test.  Clones share state, so a test can keep
/// one clone while the translator owns another.
#[derive(Debug, Clone, Default)]
pub struct ManualHoldTimer {
    state: Arc<Mutex<ManualState>>,
}

impl ManualHoldTimer {
    /// Tokens scheduled and not cancelled, oldest first.
    pub fn pending(&self) -> Vec<TimerToken> {
        let state = self.state.lock().unwrap();
        state
            .scheduled
            .iter()
            .map(|(token, _)| *token)
            .filter(|token| !state.cancelled.contains(token))
            .collect()
    }

    /// Every token that has been cancelled.
    pub fn cancelled(&self) -> Vec<TimerToken> {
        self.state.lock().unwrap().cancelled.clone()
    }

    /// Delay requested for `token`, if it was ever scheduled.
    pub fn delay_of(&self, token: TimerToken) -> Option<Duration> {
        self.state
            .lock()
            .unwrap()
            .scheduled
            .iter()
            .find(|(t, _)| *t == token)
            .map(|(_, delay)| *delay)
    }
}

impl HoldTimer for ManualHoldTimer {
    fn schedule(&mut self, token: TimerToken, delay: Duration) {
        self.state.lock().unwrap().scheduled.push((token, delay));
    }

    fn cancel(&mut self, token: TimerToken) {
        self.state.lock().unwrap().cancelled.push(token);
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
