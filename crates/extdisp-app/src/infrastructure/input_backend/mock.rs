//! Recording input backend for tests.
//!
//! Every executed [`BackendCommand`] is pushed into a `Mutex<Vec<...>>` so
//! assertions can inspect exactly what the translators emitted and in what
//! order.  Set `should_fail` to make every call return an error; this is how
//! tests prove that translator state is reset even when the transport breaks.

use std::sync::Mutex;

use extdisp_core::BackendCommand;

use crate::application::synthetic_input::{BackendError, SyntheticInput};

/// A backend that records commands instead of injecting input.
#[derive(Default)]
pub struct MockInputBackend {
    /// Every command passed to `execute`, in order.
    pub commands: Mutex<Vec<BackendCommand>>,
    /// Position reported by `pointer_position`.  `None` makes the query fail.
    pub pointer: Mutex<Option<(i32, i32)>>,
    /// Number of `pointer_position` calls.
    pub pointer_queries: Mutex<usize>,
    /// When `true`, `execute` records nothing and returns an error.
    pub should_fail: bool,
}

impl MockInputBackend {
    /// Creates a backend with the pointer at the origin.
    pub fn new() -> Self {
        Self {
            pointer: Mutex::new(Some((0, 0))),
            ..Self::default()
        }
    }

    /// Creates a backend whose every command fails.
    pub fn failing() -> Self {
        Self {
            should_fail: true,
            ..Self::new()
        }
    }

    /// A copy of the recorded commands.
    pub fn recorded(&self) -> Vec<BackendCommand> {
        self.commands.lock().unwrap().clone()
    }

    /// Recorded click commands only.
    pub fn clicks(&self) -> Vec<BackendCommand> {
        self.recorded().into_iter().filter(BackendCommand::is_click).collect()
    }

    /// Recorded relative moves only.
    pub fn moves(&self) -> Vec<BackendCommand> {
        self.recorded().into_iter().filter(BackendCommand::is_move).collect()
    }

    /// Forgets everything recorded so far.
    pub fn clear(&self) {
        self.commands.lock().unwrap().clear();
    }
}

impl SyntheticInput for MockInputBackend {
    fn execute(&self, command: &BackendCommand) -> Result<(), BackendError> {
        if self.should_fail {
            return Err(BackendError::Transport("mock failure".into()));
        }
        self.commands.lock().unwrap().push(command.clone());
        Ok(())
    }

    fn pointer_position(&self) -> Result<(i32, i32), BackendError> {
        *self.pointer_queries.lock().unwrap() += 1;
        self.pointer
            .lock()
            .unwrap()
            .ok_or_else(|| BackendError::Parse("no pointer".into()))
    }
}
