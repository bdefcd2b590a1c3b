//! The single task that owns the translators and reacts to everything.
//!
//! ```text
//!  UI lines ──► ui rx ─────┐
//!  hold timer ─► timer rx ─┤            ┌─► KeyboardTranslator ─┐
//!  worker ────► report rx ─┼─ select! ──┼─► GestureTranslator ──┼─► SyntheticInput
//!  refresh tick ───────────┘            ├─► LifecycleWorker     │
//!                                       └─► StatusHub ◄─────────┘ (status events)
//! ```
//!
//! Each event is handled to completion before the next is taken, so the
//! translators are plain `&mut self` state with no locks.  Lifecycle
//! transitions are the only slow work; they run on the worker's task and
//! come back here as [`LifecycleReport`]s.
//!
//! While the pipeline is enabled the display info is refreshed on a fixed
//! tick until the display reports `connected`.
//!
//! The loop ends when the UI input closes or the shutdown future resolves.
//! Either way it leaves through [`EventLoop::shutdown`], which lifts every
//! latched modifier and any held button on the target display.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use extdisp_core::ModifierSnapshot;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::application::display_status::{DisplaySnapshot, DisplayStateSource, DisplayTarget};
use crate::application::service_lifecycle::{LifecycleReport, LifecycleWorker, Transition};
use crate::application::translate_gestures::{GestureTranslator, TimerToken};
use crate::application::translate_keys::{KeyIdentity, KeyboardTranslator};
use crate::infrastructure::ui_bridge::{StatusEvent, StatusHub, UiEvent};

/// Receivers the loop selects over.
pub struct EventSources {
    pub ui: mpsc::Receiver<UiEvent>,
    pub timer: mpsc::UnboundedReceiver<TimerToken>,
    pub reports: mpsc::UnboundedReceiver<LifecycleReport>,
}

/// Owns the translators and the UI-visible state.
pub struct EventLoop {
    keyboard: KeyboardTranslator,
    gestures: GestureTranslator,
    worker: LifecycleWorker,
    display: Arc<dyn DisplayStateSource>,
    target: DisplayTarget,
    hub: StatusHub,
    refresh_interval: Duration,
    enabled: bool,
    polling: bool,
    last_touch: Option<(f64, f64)>,
}

impl EventLoop {
    pub fn new(
        keyboard: KeyboardTranslator,
        gestures: GestureTranslator,
        worker: LifecycleWorker,
        display: Arc<dyn DisplayStateSource>,
        target: DisplayTarget,
        hub: StatusHub,
        refresh_interval: Duration,
    ) -> Self {
        Self {
            keyboard,
            gestures,
            worker,
            display,
            target,
            hub,
            refresh_interval,
            enabled: false,
            polling: false,
            last_touch: None,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Returns `true` while periodic display refresh is active.
    pub fn is_polling(&self) -> bool {
        self.polling
    }

    /// Runs until the UI input closes or `shutdown` resolves.
    ///
    /// On return every release command has been handed to the backend; the
    /// caller only has to wait for the transport to drain.
    pub async fn run<S>(mut self, mut sources: EventSources, shutdown: S)
    where
        S: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        let mut tick = tokio::time::interval(self.refresh_interval);
        tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately; consume it so refreshes are
        // spaced by a full interval.
        tick.tick().await;

        info!("event loop running");
        loop {
            tokio::select! {
                () = &mut shutdown => {
                    info!("shutdown requested");
                    break;
                }
                event = sources.ui.recv() => match event {
                    Some(event) => self.handle_ui(event),
                    None => break,
                },
                Some(token) = sources.timer.recv() => self.gestures.on_hold_timer_fired(token),
                Some(report) = sources.reports.recv() => self.handle_report(report),
                _ = tick.tick(), if self.polling => self.refresh(),
            }
            self.publish_touch();
        }

        self.shutdown();
        info!("event loop stopped");
    }

    /// Handles one UI event.
    pub fn handle_ui(&mut self, event: UiEvent) {
        match event {
            UiEvent::KeyDown {
                name,
                character,
                ctrl,
                alt,
                shift,
                super_key,
            } => {
                let snapshot = ModifierSnapshot::from_flags(ctrl, alt, shift, super_key);
                self.keyboard.on_key_down(&KeyIdentity::new(name, character), snapshot);
            }
            UiEvent::KeyUp { name } => {
                self.keyboard.on_key_up(&KeyIdentity::named(name));
            }
            UiEvent::Press { button, n_press, x, y } => self.gestures.on_press(button, n_press, x, y),
            UiEvent::Release { button, x, y } => self.gestures.on_release(button, x, y),
            UiEvent::DragBegin { x, y } => self.gestures.on_drag_begin(x, y),
            UiEvent::DragUpdate { offset_x, offset_y } => {
                self.gestures.on_drag_update(offset_x, offset_y)
            }
            UiEvent::DragEnd { offset_x, offset_y } => self.gestures.on_drag_end(offset_x, offset_y),
            UiEvent::ZoomBegin => self.gestures.on_zoom_begin(),
            UiEvent::ZoomUpdate { scale } => self.gestures.on_zoom_update(scale),
            UiEvent::SetSensitivity { value } => {
                self.gestures.set_sensitivity(value);
                info!(sensitivity = self.gestures.config().sensitivity(), "sensitivity changed");
            }
            UiEvent::Enable => self.request(Transition::Enable, "Starting display services..."),
            UiEvent::Disable => self.request(Transition::Disable, "Stopping display services..."),
            UiEvent::Refresh => {
                self.refresh();
                self.hub.publish(StatusEvent::toast("Refresh complete"));
            }
            UiEvent::SetMode { mode } => self.set_mode(&mode),
        }
    }

    /// Starts a lifecycle transition on the worker.
    pub fn request(&mut self, transition: Transition, progress: &str) {
        match self.worker.request(transition) {
            Ok(_) => {
                debug!(?transition, "lifecycle transition started");
                self.hub.publish(StatusEvent::Busy {
                    message: progress.to_string(),
                });
            }
            Err(e) => {
                warn!(?transition, error = %e, "lifecycle request rejected");
                self.hub.publish(StatusEvent::toast(e.to_string()));
            }
        }
    }

    /// Applies a finished transition to the UI-visible state.
    pub fn handle_report(&mut self, report: LifecycleReport) {
        info!(
            transition = ?report.transition,
            enabled = report.enabled,
            succeeded = report.succeeded(),
            warnings = report.warnings.len(),
            "lifecycle transition finished"
        );

        if report.transition != Transition::Reconcile || !report.succeeded() {
            for warning in &report.warnings {
                self.hub.publish(StatusEvent::toast(warning.message.clone()));
            }
            self.hub.publish(StatusEvent::toast(report.message()));
        }

        self.enabled = report.enabled;
        self.hub.publish(StatusEvent::Lifecycle {
            enabled: self.enabled,
        });

        if self.enabled {
            self.polling = true;
            self.refresh();
        } else {
            self.polling = false;
            self.hub.publish(StatusEvent::DisplayInfo(DisplaySnapshot::blank()));
        }
    }

    /// Publishes a fresh display snapshot.  Stops periodic refresh once the
    /// display is connected.
    pub fn refresh(&mut self) {
        let snapshot = DisplaySnapshot::collect(self.display.as_ref(), &self.target);
        if snapshot.is_connected() && self.polling {
            debug!("display connected, periodic refresh stopped");
            self.polling = false;
        }
        self.hub.publish(StatusEvent::DisplayInfo(snapshot));
    }

    fn set_mode(&mut self, mode: &str) {
        match self.display.apply_mode(&self.target.connector, mode) {
            Ok(()) => {
                self.hub
                    .publish(StatusEvent::toast(format!("Display mode changed to {mode}")));
                self.refresh();
            }
            Err(e) => {
                warn!(mode, error = %e, "mode change failed");
                self.hub
                    .publish(StatusEvent::toast(format!("Failed to change mode: {e}")));
            }
        }
    }

    fn publish_touch(&mut self) {
        let position = self.gestures.touch_indicator();
        if position != self.last_touch {
            self.last_touch = position;
            self.hub.publish(StatusEvent::Touch { position });
        }
    }

    /// Releases everything the translators hold on the target display.
    pub fn shutdown(&mut self) {
        self.keyboard.release_all();
        self.gestures.reset();
        self.publish_touch();
    }
}
