//! GestureTranslator: turns touch-surface primitives into pointer commands.
//!
//! # Tap, hold-drag, move and scroll (for beginners)
//!
//! A single finger on the touch surface can mean three different things, and
//! the translator only knows which once the contact has lasted a while:
//!
//! ```text
//!                     press
//!                       │
//!          ┌────────────┼──────────────────┐
//!          │            │                  │
//!    released before    held still for     moved past the
//!    moving / holding   `hold_delay`       movement threshold
//!          │            │                  │
//!        click        button down,       relative moves,
//!                     moves, button up   no click
//! ```
//!
//! Two fingers pinching produce *scale* updates, which become wheel scrolls.
//!
//! # Movement buffering
//!
//! Movement reported before the contact has crossed the threshold is not
//! forwarded straight away, otherwise every tap would nudge the pointer.  It
//! is buffered and sent as one catch-up move once the threshold is crossed
//! (or a hold-drag starts), and thrown away if the contact ends as a tap.
//!
//! # Finishing a contact
//!
//! The UI reports both a release and a drag-end for most contacts.  Whichever
//! arrives first finishes the session; the second one finds no session and
//! does nothing.  Finishing always clears the hold timer, the touch indicator
//! and the session, even when the backend rejects the final command.

use std::sync::Arc;
use std::time::Duration;

use extdisp_core::{BackendCommand, GestureConfig, PointerButton};
use tracing::{debug, trace, warn};

use super::synthetic_input::{dispatch, SyntheticInput};

/// Identifies one scheduled hold timer.  A fire whose token does not match
/// the live session's pending token is stale and ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerToken(pub u64);

/// A single-shot, cancellable timer service.
///
/// When a scheduled timer expires the implementation must arrange for
/// [`GestureTranslator::on_hold_timer_fired`] to be called with its token
/// on the event loop that owns the translator.
pub trait HoldTimer: Send {
    /// Schedules `token` to fire after `delay`.
    fn schedule(&mut self, token: TimerToken, delay: Duration);

    /// Cancels `token`.  Cancelling an expired or unknown token is a no-op.
    fn cancel(&mut self, token: TimerToken);
}

/// One continuous contact, from press or drag-begin to release or drag-end.
#[derive(Debug, Clone, PartialEq)]
pub struct GestureSession {
    start: (f64, f64),
    last: (f64, f64),
    movement: f64,
    crossed_threshold: bool,
    drag_button_held: bool,
    click_consumed: bool,
    hold_token: Option<TimerToken>,
    pending: (f64, f64),
    pointer_origin: (i32, i32),
}

impl GestureSession {
    fn new(x: f64, y: f64) -> Self {
        Self {
            start: (x, y),
            last: (x, y),
            movement: 0.0,
            crossed_threshold: false,
            drag_button_held: false,
            click_consumed: false,
            hold_token: None,
            pending: (0.0, 0.0),
            pointer_origin: (0, 0),
        }
    }

    /// Cumulative distance travelled since the session was (re-)anchored.
    pub fn movement(&self) -> f64 {
        self.movement
    }

    /// `true` once the contact has moved far enough to never be a tap.
    pub fn crossed_threshold(&self) -> bool {
        self.crossed_threshold
    }

    /// `true` while the primary button is held for a hold-drag.
    pub fn drag_button_held(&self) -> bool {
        self.drag_button_held
    }

    /// Target pointer position queried when the contact started.
    pub fn pointer_origin(&self) -> (i32, i32) {
        self.pointer_origin
    }

    /// Token of the armed hold timer, if any.
    pub fn hold_token(&self) -> Option<TimerToken> {
        self.hold_token
    }

    fn forwards_motion(&self) -> bool {
        self.crossed_threshold || self.drag_button_held
    }
}

/// Pinch state: only the last scale that produced a scroll.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoomSession {
    pub last_scale: f64,
}

impl Default for ZoomSession {
    fn default() -> Self {
        Self { last_scale: 1.0 }
    }
}

/// Gesture translator owning the session, the zoom state and the hold timer.
pub struct GestureTranslator {
    backend: Arc<dyn SyntheticInput>,
    timer: Box<dyn HoldTimer>,
    config: GestureConfig,
    session: Option<GestureSession>,
    zoom: ZoomSession,
    touch_indicator: Option<(f64, f64)>,
    next_token: u64,
}

impl GestureTranslator {
    pub fn new(
        backend: Arc<dyn SyntheticInput>,
        timer: Box<dyn HoldTimer>,
        config: GestureConfig,
    ) -> Self {
        Self {
            backend,
            timer,
            config,
            session: None,
            zoom: ZoomSession::default(),
            touch_indicator: None,
            next_token: 0,
        }
    }

    pub fn config(&self) -> &GestureConfig {
        &self.config
    }

    /// Changes the pointer sensitivity (clamped into the accepted range).
    pub fn set_sensitivity(&mut self, sensitivity: f64) {
        self.config.set_sensitivity(sensitivity);
    }

    /// The live session, if a contact is active.
    pub fn session(&self) -> Option<&GestureSession> {
        self.session.as_ref()
    }

    pub fn zoom(&self) -> ZoomSession {
        self.zoom
    }

    /// Last touch position while a contact is active, for drawing.
    pub fn touch_indicator(&self) -> Option<(f64, f64)> {
        self.touch_indicator
    }

    // ── Press / release ───────────────────────────────────────────────────────

    /// Handles a button press.  `button` uses the platform numbering and
    /// `n_press` is the platform's consecutive-press count.
    pub fn on_press(&mut self, button: u32, n_press: u32, x: f64, y: f64) {
        self.touch_indicator = Some((x, y));

        match PointerButton::from_platform(button) {
            Some(PointerButton::Primary) => self.press_primary(n_press, x, y),
            Some(PointerButton::Secondary) => {
                self.send(BackendCommand::click(PointerButton::Secondary));
            }
            _ => debug!(button, "ignoring press of unhandled button"),
        }
    }

    fn press_primary(&mut self, n_press: u32, x: f64, y: f64) {
        self.abandon_session();

        let mut session = GestureSession::new(x, y);
        session.pointer_origin = self.query_pointer();

        if n_press == 2 {
            self.send(BackendCommand::Click {
                button: PointerButton::Primary,
                repeat: 2,
            });
            // The release that follows must not add a third click.
            session.click_consumed = true;
        } else {
            let token = self.allocate_token();
            self.timer.schedule(token, self.config.hold_delay);
            session.hold_token = Some(token);
        }

        self.session = Some(session);
    }

    /// Handles a button release.  Only the primary button finishes a session.
    pub fn on_release(&mut self, button: u32, _x: f64, _y: f64) {
        self.touch_indicator = None;
        if PointerButton::from_platform(button) == Some(PointerButton::Primary) {
            self.finish_session();
        }
    }

    /// Handles expiry of the hold timer identified by `token`.
    pub fn on_hold_timer_fired(&mut self, token: TimerToken) {
        let threshold = self.config.movement_threshold;
        let Some(session) = self.session.as_mut() else {
            trace!(?token, "hold timer fired with no active contact");
            return;
        };
        if session.hold_token != Some(token) {
            trace!(?token, "ignoring stale hold timer");
            return;
        }
        session.hold_token = None;

        if session.movement < threshold {
            session.drag_button_held = true;
            self.send(BackendCommand::ButtonDown {
                button: PointerButton::Primary,
            });
        }
    }

    // ── Drag ──────────────────────────────────────────────────────────────────

    /// Starts a session at `(x, y)`, or re-anchors the live one there.
    pub fn on_drag_begin(&mut self, x: f64, y: f64) {
        self.touch_indicator = Some((x, y));

        let Some(session) = self.session.as_mut() else {
            self.session = Some(GestureSession::new(x, y));
            return;
        };
        if let Some(token) = session.hold_token.take() {
            self.timer.cancel(token);
        }
        session.start = (x, y);
        session.last = (x, y);
        session.movement = 0.0;
        session.crossed_threshold = false;
        session.pending = (0.0, 0.0);
    }

    /// Handles a drag update.  Offsets are relative to the session start.
    pub fn on_drag_update(&mut self, offset_x: f64, offset_y: f64) {
        let threshold = self.config.movement_threshold;
        let Some(session) = self.session.as_mut() else {
            trace!("drag update with no active contact");
            return;
        };

        let current = (session.start.0 + offset_x, session.start.1 + offset_y);
        let delta = (current.0 - session.last.0, current.1 - session.last.1);
        session.last = current;
        self.touch_indicator = Some(current);

        session.movement += delta.0.hypot(delta.1);
        session.pending.0 += delta.0;
        session.pending.1 += delta.1;

        if !session.crossed_threshold && session.movement >= threshold {
            session.crossed_threshold = true;
            if let Some(token) = session.hold_token.take() {
                self.timer.cancel(token);
            }
        }

        if !session.forwards_motion() {
            return;
        }

        let (raw_x, raw_y) = std::mem::take(&mut session.pending);
        let dx = self.config.scale_delta(raw_x);
        let dy = self.config.scale_delta(raw_y);
        if dx == 0 && dy == 0 {
            return;
        }
        self.send(BackendCommand::MoveRelative { dx, dy });
    }

    /// Handles the end of a drag.  Offsets are the total offset from start.
    pub fn on_drag_end(&mut self, offset_x: f64, offset_y: f64) {
        self.touch_indicator = None;
        let drag_end_threshold = self.config.drag_end_threshold();
        if let Some(session) = self.session.as_mut() {
            if offset_x.hypot(offset_y) > drag_end_threshold {
                session.crossed_threshold = true;
            }
        }
        self.finish_session();
    }

    // ── Zoom ──────────────────────────────────────────────────────────────────

    /// Starts a pinch.
    pub fn on_zoom_begin(&mut self) {
        self.zoom = ZoomSession::default();
    }

    /// Handles a pinch scale change, scrolling when it is large enough.
    pub fn on_zoom_update(&mut self, scale: f64) {
        if let Some(step) = self.config.scroll_step(self.zoom.last_scale, scale) {
            self.send(BackendCommand::Scroll {
                direction: step.direction,
                ticks: step.ticks,
            });
            self.zoom.last_scale = scale;
        }
    }

    // ── Teardown ──────────────────────────────────────────────────────────────

    /// Drops any live contact without clicking, releasing a held button.
    ///
    /// Called when input forwarding stops mid-gesture.
    pub fn reset(&mut self) {
        self.touch_indicator = None;
        self.abandon_session();
    }

    fn finish_session(&mut self) {
        let Some(session) = self.session.take() else {
            trace!("finish with no active contact");
            return;
        };
        if let Some(token) = session.hold_token {
            self.timer.cancel(token);
        }

        if session.drag_button_held {
            self.send(BackendCommand::ButtonUp {
                button: PointerButton::Primary,
            });
        } else if !session.crossed_threshold && !session.click_consumed {
            self.send(BackendCommand::click(PointerButton::Primary));
        }
    }

    fn abandon_session(&mut self) {
        let Some(session) = self.session.take() else {
            return;
        };
        if let Some(token) = session.hold_token {
            self.timer.cancel(token);
        }
        if session.drag_button_held {
            self.send(BackendCommand::ButtonUp {
                button: PointerButton::Primary,
            });
        }
    }

    fn allocate_token(&mut self) -> TimerToken {
        self.next_token += 1;
        TimerToken(self.next_token)
    }

    fn query_pointer(&self) -> (i32, i32) {
        self.backend.pointer_position().unwrap_or_else(|e| {
            warn!(error = %e, "could not read pointer position");
            (0, 0)
        })
    }

    fn send(&self, command: BackendCommand) {
        dispatch(self.backend.as_ref(), command);
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::input_backend::mock::MockInputBackend;
    use crate::infrastructure::timer::ManualHoldTimer;
    use extdisp_core::ScrollDirection;

    fn make_translator() -> (GestureTranslator, Arc<MockInputBackend>, ManualHoldTimer) {
        make_with_backend(MockInputBackend::new())
    }

    fn make_with_backend(
        backend: MockInputBackend,
    ) -> (GestureTranslator, Arc<MockInputBackend>, ManualHoldTimer) {
        let backend = Arc::new(backend);
        let timer = ManualHoldTimer::default();
        let translator = GestureTranslator::new(
            Arc::clone(&backend) as Arc<dyn SyntheticInput>,
            Box::new(timer.clone()),
            GestureConfig::default().with_sensitivity(2.0),
        );
        (translator, backend, timer)
    }

    fn primary_down() -> BackendCommand {
        BackendCommand::ButtonDown {
            button: PointerButton::Primary,
        }
    }

    fn primary_up() -> BackendCommand {
        BackendCommand::ButtonUp {
            button: PointerButton::Primary,
        }
    }

    // ── Press ─────────────────────────────────────────────────────────────────

    #[test]
    fn test_primary_press_arms_hold_timer_and_queries_pointer_once() {
        // Arrange
        let (mut gt, backend, timer) = make_translator();
        *backend.pointer.lock().unwrap() = Some((640, 360));

        // Act
        gt.on_press(1, 1, 100.0, 100.0);

        // Assert
        assert_eq!(timer.pending().len(), 1);
        assert_eq!(*backend.pointer_queries.lock().unwrap(), 1);
        assert_eq!(gt.session().map(|s| s.pointer_origin()), Some((640, 360)));
        assert!(backend.recorded().is_empty());
    }

    #[test]
    fn test_pointer_query_failure_falls_back_to_origin() {
        let (mut gt, backend, _timer) = make_translator();
        *backend.pointer.lock().unwrap() = None;

        gt.on_press(1, 1, 10.0, 10.0);

        assert_eq!(gt.session().map(|s| s.pointer_origin()), Some((0, 0)));
    }

    #[test]
    fn test_double_press_sends_double_click_without_timer() {
        // Arrange
        let (mut gt, backend, timer) = make_translator();

        // Act
        gt.on_press(1, 2, 50.0, 50.0);
        gt.on_release(1, 50.0, 50.0);

        // Assert: one double click, no extra click on release
        assert_eq!(
            backend.recorded(),
            vec![BackendCommand::Click {
                button: PointerButton::Primary,
                repeat: 2
            }]
        );
        assert!(timer.pending().is_empty());
    }

    #[test]
    fn test_secondary_press_clicks_immediately_without_session() {
        let (mut gt, backend, timer) = make_translator();

        gt.on_press(3, 1, 0.0, 0.0);

        assert_eq!(
            backend.recorded(),
            vec![BackendCommand::click(PointerButton::Secondary)]
        );
        assert!(gt.session().is_none());
        assert!(timer.pending().is_empty());
    }

    #[test]
    fn test_middle_press_is_ignored() {
        let (mut gt, backend, _timer) = make_translator();
        gt.on_press(2, 1, 0.0, 0.0);
        assert!(backend.recorded().is_empty());
        assert!(gt.session().is_none());
    }

    // ── Tap ───────────────────────────────────────────────────────────────────

    #[test]
    fn test_tap_clicks_once_and_cancels_timer() {
        // Arrange
        let (mut gt, backend, timer) = make_translator();
        gt.on_press(1, 1, 100.0, 100.0);
        let token = timer.pending()[0];

        // Act
        gt.on_release(1, 100.0, 100.0);

        // Assert
        assert_eq!(backend.recorded(), vec![BackendCommand::click(PointerButton::Primary)]);
        assert!(timer.cancelled().contains(&token));
        assert!(gt.session().is_none());
        assert!(gt.touch_indicator().is_none());
    }

    #[test]
    fn test_second_finisher_is_a_no_op() {
        let (mut gt, backend, _timer) = make_translator();
        gt.on_press(1, 1, 100.0, 100.0);

        gt.on_release(1, 100.0, 100.0);
        gt.on_drag_end(0.0, 0.0);

        assert_eq!(backend.clicks().len(), 1);
    }

    #[test]
    fn test_sub_threshold_movement_is_never_forwarded() {
        // Arrange
        let (mut gt, backend, _timer) = make_translator();
        gt.on_press(1, 1, 100.0, 100.0);

        // Act: 3 + 3 + 3 = 9 < 10
        gt.on_drag_update(3.0, 0.0);
        gt.on_drag_update(6.0, 0.0);
        gt.on_drag_update(9.0, 0.0);
        gt.on_release(1, 109.0, 100.0);

        // Assert
        assert!(backend.moves().is_empty());
        assert_eq!(backend.clicks().len(), 1);
    }

    // ── Move ──────────────────────────────────────────────────────────────────

    #[test]
    fn test_crossing_threshold_flushes_buffered_movement() {
        // Arrange
        let (mut gt, backend, timer) = make_translator();
        gt.on_press(1, 1, 100.0, 100.0);
        let token = timer.pending()[0];

        // Act: 6 units buffered, then 6 more crosses the threshold
        gt.on_drag_update(0.0, 6.0);
        gt.on_drag_update(0.0, 12.0);

        // Assert: one catch-up move of 12 * 2
        assert_eq!(
            backend.moves(),
            vec![BackendCommand::MoveRelative { dx: 0, dy: 24 }]
        );
        assert!(timer.cancelled().contains(&token));
        assert!(gt.session().is_some_and(|s| s.crossed_threshold()));
    }

    #[test]
    fn test_movement_exactly_at_threshold_counts_as_crossed() {
        let (mut gt, backend, _timer) = make_translator();
        gt.on_press(1, 1, 0.0, 0.0);

        gt.on_drag_update(6.0, 8.0); // hypot = 10
        gt.on_release(1, 6.0, 8.0);

        assert!(backend.clicks().is_empty());
        assert_eq!(backend.moves().len(), 1);
    }

    #[test]
    fn test_each_update_after_crossing_sends_its_own_delta() {
        let (mut gt, backend, _timer) = make_translator();
        gt.on_press(1, 1, 0.0, 0.0);

        gt.on_drag_update(20.0, 0.0);
        gt.on_drag_update(21.0, -1.0);

        assert_eq!(
            backend.moves(),
            vec![
                BackendCommand::MoveRelative { dx: 40, dy: 0 },
                BackendCommand::MoveRelative { dx: 2, dy: -2 },
            ]
        );
    }

    #[test]
    fn test_large_delta_is_clamped_to_max_step() {
        let (mut gt, backend, _timer) = make_translator();
        gt.on_press(1, 1, 0.0, 0.0);

        gt.on_drag_update(-200.0, 30.0);

        assert_eq!(
            backend.moves(),
            vec![BackendCommand::MoveRelative { dx: -50, dy: 50 }]
        );
    }

    #[test]
    fn test_tiny_delta_after_crossing_emits_nothing() {
        let (mut gt, backend, _timer) = make_translator();
        gt.on_press(1, 1, 0.0, 0.0);
        gt.on_drag_update(15.0, 0.0);
        backend.clear();

        gt.on_drag_update(15.2, 0.3);

        assert!(backend.moves().is_empty());
    }

    // ── Hold-drag ─────────────────────────────────────────────────────────────

    #[test]
    fn test_hold_fire_presses_button_and_release_lifts_it() {
        // Arrange
        let (mut gt, backend, timer) = make_translator();
        gt.on_press(1, 1, 100.0, 100.0);
        let token = timer.pending()[0];

        // Act
        gt.on_hold_timer_fired(token);
        gt.on_drag_update(2.0, 0.0);
        gt.on_release(1, 102.0, 100.0);

        // Assert: held drags forward even sub-threshold motion, and never click
        assert_eq!(
            backend.recorded(),
            vec![
                primary_down(),
                BackendCommand::MoveRelative { dx: 4, dy: 0 },
                primary_up(),
            ]
        );
    }

    #[test]
    fn test_stale_timer_token_is_ignored() {
        // Arrange: first contact finishes, second contact starts
        let (mut gt, backend, timer) = make_translator();
        gt.on_press(1, 1, 0.0, 0.0);
        let stale = timer.pending()[0];
        gt.on_release(1, 0.0, 0.0);
        gt.on_press(1, 1, 0.0, 0.0);
        backend.clear();

        // Act
        gt.on_hold_timer_fired(stale);

        // Assert
        assert!(backend.recorded().is_empty());
        assert!(gt.session().is_some_and(|s| !s.drag_button_held()));
    }

    #[test]
    fn test_fire_after_release_is_ignored() {
        let (mut gt, backend, timer) = make_translator();
        gt.on_press(1, 1, 0.0, 0.0);
        let token = timer.pending()[0];
        gt.on_release(1, 0.0, 0.0);
        backend.clear();

        gt.on_hold_timer_fired(token);

        assert!(backend.recorded().is_empty());
    }

    #[test]
    fn test_drag_end_lifts_held_button() {
        let (mut gt, backend, timer) = make_translator();
        gt.on_press(1, 1, 0.0, 0.0);
        gt.on_hold_timer_fired(timer.pending()[0]);

        gt.on_drag_end(1.0, 0.0);

        assert_eq!(backend.recorded(), vec![primary_down(), primary_up()]);
        assert!(gt.session().is_none());
    }

    // ── Drag-begin ────────────────────────────────────────────────────────────

    #[test]
    fn test_drag_begin_cancels_hold_timer_and_resets_movement() {
        // Arrange
        let (mut gt, _backend, timer) = make_translator();
        gt.on_press(1, 1, 0.0, 0.0);
        let token = timer.pending()[0];
        gt.on_drag_update(4.0, 0.0);

        // Act
        gt.on_drag_begin(4.0, 0.0);

        // Assert
        assert!(timer.cancelled().contains(&token));
        let session = gt.session().expect("session kept");
        assert_eq!(session.movement(), 0.0);
        assert_eq!(session.hold_token(), None);
    }

    #[test]
    fn test_drag_begin_without_press_starts_session() {
        let (mut gt, backend, timer) = make_translator();

        gt.on_drag_begin(10.0, 10.0);
        gt.on_drag_end(1.0, 1.0);

        assert!(timer.pending().is_empty());
        assert_eq!(backend.clicks().len(), 1);
    }

    #[test]
    fn test_press_then_drag_begin_tap_clicks_once() {
        // The platform reports press, drag-begin, release and drag-end for
        // one tap.
        let (mut gt, backend, _timer) = make_translator();

        gt.on_press(1, 1, 30.0, 30.0);
        gt.on_drag_begin(30.0, 30.0);
        gt.on_release(1, 30.0, 30.0);
        gt.on_drag_end(0.0, 0.0);

        assert_eq!(backend.recorded(), vec![BackendCommand::click(PointerButton::Primary)]);
    }

    // ── Drag-end threshold ────────────────────────────────────────────────────

    #[test]
    fn test_drag_end_offset_above_half_threshold_suppresses_click() {
        let (mut gt, backend, _timer) = make_translator();
        gt.on_drag_begin(0.0, 0.0);

        gt.on_drag_end(5.1, 0.0);

        assert!(backend.clicks().is_empty());
    }

    #[test]
    fn test_drag_end_offset_at_half_threshold_still_clicks() {
        let (mut gt, backend, _timer) = make_translator();
        gt.on_drag_begin(0.0, 0.0);

        gt.on_drag_end(3.0, 4.0); // exactly 5, not above

        assert_eq!(backend.clicks().len(), 1);
    }

    // ── Zoom ──────────────────────────────────────────────────────────────────

    #[test]
    fn test_zoom_scrolls_and_updates_last_scale() {
        // Arrange
        let (mut gt, backend, _timer) = make_translator();
        gt.on_zoom_begin();

        // Act
        gt.on_zoom_update(0.9);

        // Assert
        assert_eq!(
            backend.recorded(),
            vec![BackendCommand::Scroll {
                direction: ScrollDirection::Down,
                ticks: 1
            }]
        );
        assert_eq!(gt.zoom().last_scale, 0.9);
    }

    #[test]
    fn test_zoom_jitter_does_not_move_last_scale() {
        let (mut gt, backend, _timer) = make_translator();
        gt.on_zoom_begin();

        gt.on_zoom_update(1.03);
        gt.on_zoom_update(1.04);

        assert!(backend.recorded().is_empty());
        assert_eq!(gt.zoom().last_scale, 1.0);
    }

    #[test]
    fn test_zoom_begin_resets_scale() {
        let (mut gt, _backend, _timer) = make_translator();
        gt.on_zoom_begin();
        gt.on_zoom_update(1.5);

        gt.on_zoom_begin();

        assert_eq!(gt.zoom().last_scale, 1.0);
    }

    // ── Failures and teardown ─────────────────────────────────────────────────

    #[test]
    fn test_backend_failure_still_resets_session() {
        // Arrange
        let (mut gt, _backend, timer) = make_with_backend(MockInputBackend::failing());
        gt.on_press(1, 1, 0.0, 0.0);
        gt.on_hold_timer_fired(timer.pending()[0]);

        // Act
        gt.on_release(1, 0.0, 0.0);

        // Assert
        assert!(gt.session().is_none());
        assert!(gt.touch_indicator().is_none());
    }

    #[test]
    fn test_reset_releases_held_button_without_click() {
        let (mut gt, backend, timer) = make_translator();
        gt.on_press(1, 1, 0.0, 0.0);
        gt.on_hold_timer_fired(timer.pending()[0]);

        gt.reset();

        assert_eq!(backend.recorded(), vec![primary_down(), primary_up()]);
        assert!(gt.session().is_none());
    }

    #[test]
    fn test_touch_indicator_follows_contact() {
        let (mut gt, _backend, _timer) = make_translator();
        gt.on_press(1, 1, 10.0, 20.0);
        assert_eq!(gt.touch_indicator(), Some((10.0, 20.0)));

        gt.on_drag_update(5.0, -5.0);
        assert_eq!(gt.touch_indicator(), Some((15.0, 15.0)));
    }

    #[test]
    fn test_set_sensitivity_clamps() {
        let (mut gt, _backend, _timer) = make_translator();
        gt.set_sensitivity(10.0);
        assert_eq!(gt.config().sensitivity(), 3.0);
    }
}
