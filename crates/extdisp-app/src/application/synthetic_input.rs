//! The synthetic input seam: the trait both translators send commands
//! through, plus the error type backends report.
//!
//! Commands are fire-and-forget.  A translator never waits for a command to
//! take effect and never lets a failure escape to the UI, so every call site
//! goes through [`dispatch`], which logs and drops the error.

use extdisp_core::BackendCommand;
use thiserror::Error;
use tracing::warn;

/// Error type for synthetic input operations.
#[derive(Debug, Error)]
pub enum BackendError {
    /// The transport could not be launched (e.g. `xdotool` is not installed).
    #[error("failed to launch input transport: {0}")]
    Launch(String),
    /// The transport ran but reported a failure.
    #[error("input transport failed: {0}")]
    Transport(String),
    /// The transport's output could not be understood.
    #[error("unexpected transport output: {0}")]
    Parse(String),
    /// The background worker that executes commands has shut down.
    #[error("input worker is not running")]
    WorkerGone,
}

/// A transport that executes backend commands on the target display.
///
/// Implementations must not block the caller for the duration of the
/// command; queueing the command and returning is sufficient.
#[cfg_attr(test, mockall::automock)]
pub trait SyntheticInput: Send + Sync {
    /// Executes (or queues) one command.
    fn execute(&self, command: &BackendCommand) -> Result<(), BackendError>;

    /// Reports the current pointer position on the target display.
    fn pointer_position(&self) -> Result<(i32, i32), BackendError>;
}

/// Sends `command` to `backend`, logging any failure.
///
/// Returns `true` if the backend accepted the command.
pub fn dispatch(backend: &dyn SyntheticInput, command: BackendCommand) -> bool {
    match backend.execute(&command) {
        Ok(()) => true,
        Err(e) => {
            warn!(%command, error = %e, "input command failed");
            false
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
