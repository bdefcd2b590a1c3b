//! `xdotool` transport.
//!
//! Every [`BackendCommand`] maps to one `xdotool` invocation:
//!
//! | Command                      | Arguments                               |
//! |------------------------------|-----------------------------------------|
//! | `MoveRelative { dx, dy }`    | `mousemove_relative -- dx dy`           |
//! | `Click { button, 1 }`        | `click N`                               |
//! | `Click { button, n }`        | `click --repeat n N`                    |
//! | `ButtonDown` / `ButtonUp`    | `mousedown N` / `mouseup N`             |
//! | `Scroll { direction, t }`    | `click --repeat t 4` or `5` (wheel)     |
//! | `KeyPress { chord }`         | `key ctrl+alt+t`                        |
//! | `KeyDown` / `KeyUp`          | `keydown ctrl` / `keyup ctrl`           |
//! | `TypeText { text }`          | `type -- text`                          |
//!
//! # Ordering (for beginners)
//!
//! `execute` only pushes the command onto an unbounded channel.  A single
//! background task pops commands and runs them one process at a time, so a
//! button-down is always delivered before the moves that follow it, and the
//! event loop never waits for a process to exit.
//!
//! [`XdotoolBackend::drain`] waits until everything queued so far has run.
//! Shutdown uses it so the final key-ups and button-ups reach the display
//! before the runtime stops.
//!
//! `pointer_position` is the one synchronous call: it runs
//! `xdotool getmouselocation` and parses the `x:.. y:..` reply.  It happens
//! once per primary press.

use std::process::{Command as StdCommand, Output};

use extdisp_core::{BackendCommand, WheelMapping};
use tokio::process::Command;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::application::synthetic_input::{BackendError, SyntheticInput};

const XDOTOOL: &str = "xdotool";

/// Builds the `xdotool` argument list for `command`.
pub fn xdotool_args(command: &BackendCommand, wheel: WheelMapping) -> Vec<String> {
    match command {
        BackendCommand::MoveRelative { dx, dy } => vec![
            "mousemove_relative".into(),
            "--".into(),
            dx.to_string(),
            dy.to_string(),
        ],
        BackendCommand::Click { button, repeat } if *repeat > 1 => vec![
            "click".into(),
            "--repeat".into(),
            repeat.to_string(),
            button.x11_number().to_string(),
        ],
        BackendCommand::Click { button, .. } => {
            vec!["click".into(), button.x11_number().to_string()]
        }
        BackendCommand::ButtonDown { button } => {
            vec!["mousedown".into(), button.x11_number().to_string()]
        }
        BackendCommand::ButtonUp { button } => {
            vec!["mouseup".into(), button.x11_number().to_string()]
        }
        BackendCommand::Scroll { direction, ticks } => vec![
            "click".into(),
            "--repeat".into(),
            ticks.to_string(),
            direction.x11_button(wheel).to_string(),
        ],
        BackendCommand::KeyPress { chord } => vec!["key".into(), chord.to_string()],
        BackendCommand::KeyDown { modifier } => {
            vec!["keydown".into(), modifier.canonical_name().into()]
        }
        BackendCommand::KeyUp { modifier } => {
            vec!["keyup".into(), modifier.canonical_name().into()]
        }
        BackendCommand::TypeText { text } => vec!["type".into(), "--".into(), text.clone()],
    }
}

/// Parses `getmouselocation` output (`x:123 y:456 screen:0 window:...`).
pub fn parse_mouse_location(output: &str) -> Option<(i32, i32)> {
    let mut x = None;
    let mut y = None;
    for field in output.split_whitespace() {
        if let Some(value) = field.strip_prefix("x:") {
            x = value.parse().ok();
        } else if let Some(value) = field.strip_prefix("y:") {
            y = value.parse().ok();
        }
    }
    Some((x?, y?))
}

enum Job {
    Run(BackendCommand),
    Drained(oneshot::Sender<()>),
}

/// Synthetic input through `xdotool`.
pub struct XdotoolBackend {
    x_display: String,
    queue: mpsc::UnboundedSender<Job>,
}

impl XdotoolBackend {
    /// Starts the worker task that drives `x_display` (e.g. `:1`).
    ///
    /// Must be called from within a Tokio runtime.
    pub fn spawn(x_display: impl Into<String>, wheel: WheelMapping) -> Self {
        let x_display = x_display.into();
        let (queue, mut rx) = mpsc::unbounded_channel::<Job>();

        let worker_display = x_display.clone();
        tokio::spawn(async move {
            while let Some(job) = rx.recv().await {
                match job {
                    Job::Run(command) => {
                        if let Err(e) = run(&worker_display, &command, wheel).await {
                            warn!(%command, error = %e, "xdotool command failed");
                        }
                    }
                    Job::Drained(done) => {
                        let _ = done.send(());
                    }
                }
            }
            debug!("xdotool worker stopped");
        });

        info!(x_display = %x_display, ?wheel, "xdotool input backend started");
        Self { x_display, queue }
    }

    /// Waits until every command queued before this call has run.
    ///
    /// Returns [`BackendError::WorkerGone`] if the worker has exited.
    pub async fn drain(&self) -> Result<(), BackendError> {
        let (done, drained) = oneshot::channel();
        self.queue
            .send(Job::Drained(done))
            .map_err(|_| BackendError::WorkerGone)?;
        drained.await.map_err(|_| BackendError::WorkerGone)
    }

    /// Verifies that `xdotool` can be launched.
    pub fn check_available() -> Result<(), BackendError> {
        StdCommand::new(XDOTOOL)
            .arg("version")
            .output()
            .map_err(|e| BackendError::Launch(format!("{XDOTOOL}: {e}")))
            .and_then(|output| check_status(&output))
    }

    pub fn x_display(&self) -> &str {
        &self.x_display
    }
}

impl SyntheticInput for XdotoolBackend {
    fn execute(&self, command: &BackendCommand) -> Result<(), BackendError> {
        self.queue
            .send(Job::Run(command.clone()))
            .map_err(|_| BackendError::WorkerGone)
    }

    fn pointer_position(&self) -> Result<(i32, i32), BackendError> {
        let output = StdCommand::new(XDOTOOL)
            .arg("getmouselocation")
            .env("DISPLAY", &self.x_display)
            .output()
            .map_err(|e| BackendError::Launch(format!("{XDOTOOL}: {e}")))?;
        check_status(&output)?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        parse_mouse_location(&stdout).ok_or_else(|| BackendError::Parse(stdout.trim().to_string()))
    }
}

async fn run(
    x_display: &str,
    command: &BackendCommand,
    wheel: WheelMapping,
) -> Result<(), BackendError> {
    let args = xdotool_args(command, wheel);
    debug!(?args, "xdotool");
    let output = Command::new(XDOTOOL)
        .args(&args)
        .env("DISPLAY", x_display)
        .output()
        .await
        .map_err(|e| BackendError::Launch(format!("{XDOTOOL}: {e}")))?;
    check_status(&output)
}

fn check_status(output: &Output) -> Result<(), BackendError> {
    if output.status.success() {
        Ok(())
    } else {
        Err(BackendError::Transport(format!(
            "{} ({})",
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        )))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use extdisp_core::{KeyChord, Modifier, PointerButton, ScrollDirection};

    fn args(command: BackendCommand) -> String {
        xdotool_args(&command, WheelMapping::Natural).join(" ")
    }

    #[test]
    fn test_relative_move_separates_negative_numbers_from_options() {
        assert_eq!(
            args(BackendCommand::MoveRelative { dx: -4, dy: 12 }),
            "mousemove_relative -- -4 12"
        );
    }

    #[test]
    fn test_single_and_double_click() {
        assert_eq!(args(BackendCommand::click(PointerButton::Primary)), "click 1");
        assert_eq!(args(BackendCommand::click(PointerButton::Secondary)), "click 3");
        assert_eq!(
            args(BackendCommand::Click {
                button: PointerButton::Primary,
                repeat: 2
            }),
            "click --repeat 2 1"
        );
    }

    #[test]
    fn test_button_hold_and_release() {
        assert_eq!(
            args(BackendCommand::ButtonDown {
                button: PointerButton::Primary
            }),
            "mousedown 1"
        );
        assert_eq!(
            args(BackendCommand::ButtonUp {
                button: PointerButton::Primary
            }),
            "mouseup 1"
        );
    }

    #[test]
    fn test_pinch_in_scroll_sends_button_four_by_default() {
        assert_eq!(
            args(BackendCommand::Scroll {
                direction: ScrollDirection::Down,
                ticks: 3
            }),
            "click --repeat 3 4"
        );
    }

    #[test]
    fn test_traditional_wheel_sends_button_five_for_scroll_down() {
        let scroll = BackendCommand::Scroll {
            direction: ScrollDirection::Down,
            ticks: 1,
        };

        assert_eq!(
            xdotool_args(&scroll, WheelMapping::Traditional).join(" "),
            "click --repeat 1 5"
        );
    }

    #[test]
    fn test_keys_and_text() {
        assert_eq!(
            args(BackendCommand::KeyPress {
                chord: KeyChord::with_modifiers(vec![Modifier::Ctrl], "c")
            }),
            "key ctrl+c"
        );
        assert_eq!(
            args(BackendCommand::KeyDown {
                modifier: Modifier::Super
            }),
            "keydown super"
        );
        assert_eq!(
            xdotool_args(&BackendCommand::TypeText { text: "-n".into() }, WheelMapping::Natural),
            vec!["type", "--", "-n"]
        );
    }

    #[test]
    fn test_parse_mouse_location() {
        assert_eq!(
            parse_mouse_location("x:123 y:456 screen:0 window:41943047\n"),
            Some((123, 456))
        );
    }

    #[test]
    fn test_parse_mouse_location_rejects_incomplete_output() {
        assert_eq!(parse_mouse_location("x:12 screen:0"), None);
        assert_eq!(parse_mouse_location(""), None);
        assert_eq!(parse_mouse_location("x:a y:3"), None);
    }

    #[tokio::test]
    async fn test_execute_after_worker_exit_reports_worker_gone() {
        // Arrange: a backend whose queue has no receiver
        let (queue, rx) = mpsc::unbounded_channel();
        drop(rx);
        let backend = XdotoolBackend {
            x_display: ":1".into(),
            queue,
        };

        // Act
        let result = backend.execute(&BackendCommand::click(PointerButton::Primary));
        let drained = backend.drain().await;

        // Assert
        assert!(matches!(result, Err(BackendError::WorkerGone)));
        assert!(matches!(drained, Err(BackendError::WorkerGone)));
    }

    #[tokio::test]
    async fn test_drain_waits_for_queued_commands() {
        // Arrange: the test plays the worker's part on the receiving end
        let (queue, mut rx) = mpsc::unbounded_channel();
        let backend = XdotoolBackend {
            x_display: ":1".into(),
            queue,
        };
        backend
            .execute(&BackendCommand::KeyUp {
                modifier: Modifier::Ctrl,
            })
            .unwrap();

        // Act
        let drain = tokio::spawn(async move { backend.drain().await });
        let first = rx.recv().await;
        let second = rx.recv().await;

        // Assert: the key-up is ahead of the drain request, which resolves
        // once the worker acknowledges it
        assert!(matches!(
            first,
            Some(Job::Run(BackendCommand::KeyUp {
                modifier: Modifier::Ctrl
            }))
        ));
        match second {
            Some(Job::Drained(done)) => done.send(()).unwrap(),
            _ => panic!("expected a drain request"),
        }
        assert!(drain.await.unwrap().is_ok());
    }
}
