//! JSON-lines bridge between the UI process and the application.
//!
//! The UI (a touch surface drawn by another process) writes one JSON object
//! per line to our stdin and reads status events, one per line, from our
//! stdout.  Logs go to stderr so the two never mix.
//!
//! # Message format
//!
//! Every message is a JSON object with a `"type"` field naming the variant,
//! and the variant's fields flattened next to it:
//!
//! ```json
//! {"type":"press","button":1,"n_press":1,"x":120.0,"y":48.5}
//! {"type":"key_down","name":"c","character":"c","ctrl":true}
//! {"type":"enable"}
//! ```
//!
//! Outbound:
//!
//! ```json
//! {"type":"lifecycle","enabled":true}
//! {"type":"toast","message":"Display services enabled successfully"}
//! {"type":"display_info","status":"connected","power_state":"On",
//!  "manufacturer":"DEL","modes":["1920x1080"],"current_mode":"1920x1080"}
//! ```
//!
//! # Fan-out
//!
//! [`StatusHub`] wraps a `tokio::sync::broadcast` channel.  The stdout
//! writer is one subscriber; tests and any future surface can subscribe too.
//! A slow subscriber that falls behind skips the events it missed.  The hub
//! remembers the latest `lifecycle` and `display_info` events, and the
//! writer re-sends them after a skip so the UI never keeps a stale toggle.

use std::sync::{Arc, Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::application::display_status::DisplaySnapshot;

/// Buffered status events per subscriber.
const STATUS_CAPACITY: usize = 64;

/// Error type for the UI bridge.
#[derive(Debug, Error)]
pub enum UiBridgeError {
    #[error("invalid UI message: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("UI stream I/O error: {0}")]
    Io(#[from] std::io::Error),
}

// ── Inbound ───────────────────────────────────────────────────────────────────

fn one() -> u32 {
    1
}

/// Events the UI sends to the application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum UiEvent {
    KeyDown {
        name: String,
        #[serde(default)]
        character: Option<char>,
        #[serde(default)]
        ctrl: bool,
        #[serde(default)]
        alt: bool,
        #[serde(default)]
        shift: bool,
        #[serde(default, rename = "super")]
        super_key: bool,
    },
    KeyUp {
        name: String,
    },
    /// Button numbers: 1 primary, 2 middle, 3 secondary.
    Press {
        button: u32,
        #[serde(default = "one")]
        n_press: u32,
        x: f64,
        y: f64,
    },
    Release {
        button: u32,
        x: f64,
        y: f64,
    },
    DragBegin {
        x: f64,
        y: f64,
    },
    DragUpdate {
        offset_x: f64,
        offset_y: f64,
    },
    DragEnd {
        offset_x: f64,
        offset_y: f64,
    },
    ZoomBegin,
    ZoomUpdate {
        scale: f64,
    },
    SetSensitivity {
        value: f64,
    },
    Enable,
    Disable,
    Refresh,
    SetMode {
        mode: String,
    },
}

/// Parses one inbound line.
pub fn parse_event(line: &str) -> Result<UiEvent, UiBridgeError> {
    Ok(serde_json::from_str(line.trim())?)
}

// ── Outbound ──────────────────────────────────────────────────────────────────

/// Events the application publishes to the UI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StatusEvent {
    /// Whether the display pipeline is enabled.
    Lifecycle { enabled: bool },
    /// A transition is running; further toggles are rejected until it ends.
    Busy { message: String },
    /// Short user-facing notice.
    Toast { message: String },
    /// Current display state, blanks for unknowns.
    DisplayInfo(DisplaySnapshot),
    /// Position of the active contact, `None` once it ends.
    Touch { position: Option<(f64, f64)> },
}

impl StatusEvent {
    pub fn toast(message: impl Into<String>) -> Self {
        Self::Toast {
            message: message.into(),
        }
    }
}

/// Serializes one outbound event as a single line (without the newline).
pub fn encode_event(event: &StatusEvent) -> Result<String, UiBridgeError> {
    Ok(serde_json::to_string(event)?)
}

/// Latest state-bearing events, replayed after a subscriber lags.
#[derive(Debug, Default)]
struct Latest {
    lifecycle: Option<StatusEvent>,
    display_info: Option<StatusEvent>,
}

/// Broadcasts status events to every subscriber.
#[derive(Clone)]
pub struct StatusHub {
    tx: broadcast::Sender<StatusEvent>,
    latest: Arc<Mutex<Latest>>,
}

impl Default for StatusHub {
    fn default() -> Self {
        Self::new()
    }
}

impl StatusHub {
    pub fn new() -> Self {
        Self::with_capacity(STATUS_CAPACITY)
    }

    /// A hub buffering `capacity` events per subscriber.
    pub fn with_capacity(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self {
            tx,
            latest: Arc::default(),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StatusEvent> {
        self.tx.subscribe()
    }

    /// Publishes `event`.  Having no subscribers is not an error.
    pub fn publish(&self, event: StatusEvent) {
        debug!(?event, "status event");
        {
            let mut latest = self.latest.lock().unwrap_or_else(PoisonError::into_inner);
            match &event {
                StatusEvent::Lifecycle { .. } => latest.lifecycle = Some(event.clone()),
                StatusEvent::DisplayInfo(_) => latest.display_info = Some(event.clone()),
                _ => {}
            }
        }
        let _ = self.tx.send(event);
    }

    /// The most recent `lifecycle` and `display_info` events, in that order.
    pub fn latest(&self) -> Vec<StatusEvent> {
        let latest = self.latest.lock().unwrap_or_else(PoisonError::into_inner);
        latest
            .lifecycle
            .iter()
            .chain(latest.display_info.iter())
            .cloned()
            .collect()
    }
}

// ── Stream tasks ──────────────────────────────────────────────────────────────

/// Reads JSON lines from `reader` and forwards parsed events on `events`.
///
/// Malformed lines are logged and skipped.  The task ends at end of input or
/// when the receiver is dropped; dropping `events` then tells the event loop
/// that the UI has gone away.
pub fn spawn_reader<R>(reader: R, events: mpsc::Sender<UiEvent>) -> JoinHandle<()>
where
    R: AsyncBufRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut lines = reader.lines();
        loop {
            let line = match lines.next_line().await {
                Ok(Some(line)) => line,
                Ok(None) => break,
                Err(e) => {
                    warn!(error = %e, "UI input stream failed");
                    break;
                }
            };
            if line.trim().is_empty() {
                continue;
            }
            match parse_event(&line) {
                Ok(event) => {
                    if events.send(event).await.is_err() {
                        break;
                    }
                }
                Err(e) => warn!(error = %e, line = %line, "ignoring UI message"),
            }
        }
        info!("UI input closed");
    })
}

/// Writes every event published on `hub` to `writer`, one JSON line each.
///
/// Subscribes before returning, so nothing published after the call is
/// missed.  After falling behind, the hub's latest state is written first.
pub fn spawn_writer<W>(hub: &StatusHub, mut writer: W) -> JoinHandle<()>
where
    W: AsyncWrite + Unpin + Send + 'static,
{
    let mut status = hub.subscribe();
    let hub = hub.clone();
    tokio::spawn(async move {
        loop {
            let events = match status.recv().await {
                Ok(event) => vec![event],
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "UI writer fell behind, resending state");
                    hub.latest()
                }
                Err(broadcast::error::RecvError::Closed) => break,
            };
            for event in &events {
                if let Err(e) = write_line(&mut writer, event).await {
                    warn!(error = %e, "UI output stream failed");
                    return;
                }
            }
        }
    })
}

async fn write_line<W>(writer: &mut W, event: &StatusEvent) -> Result<(), UiBridgeError>
where
    W: AsyncWrite + Unpin,
{
    let mut line = encode_event(event)?;
    line.push('\n');
    writer.write_all(line.as_bytes()).await?;
    writer.flush().await?;
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
