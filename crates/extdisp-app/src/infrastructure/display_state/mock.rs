//! In-memory display state for tests.
//!
//! `connect_after` simulates a display that only reports `connected` after a
//! number of status polls, which is how lifecycle tests exercise the
//! connection wait.

use std::sync::Mutex;

use crate::application::display_status::{
    DisplayStateError, DisplayStateSource, DisplayStatus, DisplayTarget, STATUS_CONNECTED,
};

/// A display state source backed by plain fields.
#[derive(Default)]
pub struct MockDisplayState {
    /// Status returned by `status` (until `connect_after` flips it).
    pub status: Mutex<DisplayStatus>,
    /// Modes returned by `available_modes`.
    pub modes: Mutex<Vec<String>>,
    /// Value returned by `current_resolution`.
    pub current: Mutex<Option<String>>,
    /// Every `(connector, mode)` passed to `apply_mode`.
    pub applied: Mutex<Vec<(String, String)>>,
    /// Number of `status` calls so far.
    pub status_queries: Mutex<usize>,
    /// When set, `status` reports connected from this poll count onwards.
    pub connect_after: Mutex<Option<usize>>,
    /// When `true`, `apply_mode` fails.
    pub should_fail: bool,
}

impl MockDisplayState {
    /// A source reporting a connected, powered display.
    pub fn connected() -> Self {
        Self {
            status: Mutex::new(DisplayStatus {
                status: Some(STATUS_CONNECTED.into()),
                power_state: Some("On".into()),
                manufacturer: Some("DEL".into()),
            }),
            ..Self::default()
        }
    }

    /// A source reporting a disconnected connector.
    pub fn disconnected() -> Self {
        Self {
            status: Mutex::new(DisplayStatus {
                status: Some("disconnected".into()),
                ..DisplayStatus::default()
            }),
            ..Self::default()
        }
    }
}

impl DisplayStateSource for MockDisplayState {
    fn status(&self, _target: &DisplayTarget) -> DisplayStatus {
        let mut queries = self.status_queries.lock().unwrap();
        *queries += 1;
        if let Some(after) = *self.connect_after.lock().unwrap() {
            if *queries >= after {
                let mut status = self.status.lock().unwrap();
                status.status = Some(STATUS_CONNECTED.into());
            }
        }
        self.status.lock().unwrap().clone()
    }

    fn available_modes(&self, _target: &DisplayTarget) -> Vec<String> {
        self.modes.lock().unwrap().clone()
    }

    fn current_resolution(&self, _connector: &str) -> Option<String> {
        self.current.lock().unwrap().clone()
    }

    fn apply_mode(&self, connector: &str, mode: &str) -> Result<(), DisplayStateError> {
        if self.should_fail {
            return Err(DisplayStateError::Failed {
                tool: "xrandr",
                status: "exit status: 1".into(),
                stderr: "mock failure".into(),
            });
        }
        self.applied
            .lock()
            .unwrap()
            .push((connector.to_string(), mode.to_string()));
        *self.current.lock().unwrap() = Some(mode.to_string());
        Ok(())
    }
}
