//! Display state queries and the snapshot shown to the UI.
//!
//! The display state source is polled, never pushed.  Anything it cannot
//! answer comes back as `None` and is rendered as an empty string, so the UI
//! never shows an error message in a status field.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error type for display operations that can fail outright (mode changes).
#[derive(Debug, Error)]
pub enum DisplayStateError {
    /// The mode-switch tool could not be launched.
    #[error("failed to run {tool}: {source}")]
    Launch {
        tool: &'static str,
        #[source]
        source: std::io::Error,
    },
    /// The mode-switch tool ran and reported failure.
    #[error("{tool} exited with {status}: {stderr}")]
    Failed {
        tool: &'static str,
        status: String,
        stderr: String,
    },
}

/// Connection status string reported by the kernel for a live display.
pub const STATUS_CONNECTED: &str = "connected";

/// Connector state read from the display state source.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DisplayStatus {
    /// `connected`, `disconnected`, `unknown` ...
    pub status: Option<String>,
    /// DPMS power state (`On`, `Off`, ...).
    pub power_state: Option<String>,
    /// Three-letter manufacturer ID from the EDID.
    pub manufacturer: Option<String>,
}

impl DisplayStatus {
    /// Returns `true` if the connector reports a connected display.
    pub fn is_connected(&self) -> bool {
        self.status.as_deref() == Some(STATUS_CONNECTED)
    }
}

/// The DRM card and connector a display lives on (`card1`, `DVI-I-1`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayTarget {
    pub card: String,
    pub connector: String,
}

impl fmt::Display for DisplayTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.card, self.connector)
    }
}

/// Source of display connection state, modes and resolution.
///
/// Implementations swallow read failures and report `None` / empty.
pub trait DisplayStateSource: Send + Sync {
    /// Connection status, power state and manufacturer of `target`.
    fn status(&self, target: &DisplayTarget) -> DisplayStatus;

    /// Modes the display advertises, de-duplicated, in advertised order.
    fn available_modes(&self, target: &DisplayTarget) -> Vec<String>;

    /// The active resolution (`WxH`) of `connector`, if it is driving one.
    fn current_resolution(&self, connector: &str) -> Option<String>;

    /// Switches `connector` to `mode`.
    fn apply_mode(&self, connector: &str, mode: &str) -> Result<(), DisplayStateError>;
}

/// Everything the UI shows about the external display, with blanks for
/// unknown values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplaySnapshot {
    pub status: String,
    pub power_state: String,
    pub manufacturer: String,
    pub modes: Vec<String>,
    pub current_mode: String,
}

impl DisplaySnapshot {
    /// Reads a full snapshot from `source`.
    pub fn collect(source: &dyn DisplayStateSource, target: &DisplayTarget) -> Self {
        let status = source.status(target);
        Self {
            status: status.status.unwrap_or_default(),
            power_state: status.power_state.unwrap_or_default(),
            manufacturer: status.manufacturer.unwrap_or_default(),
            modes: source.available_modes(target),
            current_mode: source.current_resolution(&target.connector).unwrap_or_default(),
        }
    }

    /// The snapshot shown while the pipeline is disabled.
    pub fn blank() -> Self {
        Self::default()
    }

    pub fn is_connected(&self) -> bool {
        self.status == STATUS_CONNECTED
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::display_state::mock::MockDisplayState;

    fn target() -> DisplayTarget {
        DisplayTarget {
            card: "card1".into(),
            connector: "DVI-I-1".into(),
        }
    }

    #[test]
    fn test_unknown_values_become_blank_strings() {
        // Arrange
        let source = MockDisplayState::default();

        // Act
        let snapshot = DisplaySnapshot::collect(&source, &target());

        // Assert
        assert_eq!(snapshot, DisplaySnapshot::blank());
        assert!(!snapshot.is_connected());
    }

    #[test]
    fn test_collect_copies_known_values() {
        let source = MockDisplayState::connected();
        *source.modes.lock().unwrap() = vec!["1920x1080".into(), "1280x720".into()];
        *source.current.lock().unwrap() = Some("1920x1080".into());

        let snapshot = DisplaySnapshot::collect(&source, &target());

        assert_eq!(snapshot.status, "connected");
        assert_eq!(snapshot.modes, vec!["1920x1080", "1280x720"]);
        assert_eq!(snapshot.current_mode, "1920x1080");
        assert!(snapshot.is_connected());
    }

    #[test]
    fn test_target_display_joins_card_and_connector() {
        assert_eq!(target().to_string(), "card1-DVI-I-1");
    }
}
