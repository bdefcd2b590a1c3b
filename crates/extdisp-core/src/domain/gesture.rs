//! Gesture tuning parameters and the arithmetic shared by the gesture
//! translator: delta scaling and pinch-to-scroll conversion.
//!
//! Everything here is a pure function of its inputs so the numeric
//! boundaries (clamp limits, jitter floor, tick cap) can be tested without
//! constructing a translator.

use std::time::Duration;

use super::command::ScrollDirection;

/// Lowest accepted pointer sensitivity.
pub const MIN_SENSITIVITY: f64 = 0.5;
/// Highest accepted pointer sensitivity.
pub const MAX_SENSITIVITY: f64 = 3.0;

/// Tuning knobs for tap / hold / drag / scroll disambiguation.
#[derive(Debug, Clone, PartialEq)]
pub struct GestureConfig {
    /// Cumulative distance a contact must travel before it counts as a move.
    pub movement_threshold: f64,
    /// How long a stationary contact must stay down to start a hold-drag.
    pub hold_delay: Duration,
    /// Multiplier applied to every movement delta.  Always within
    /// [`MIN_SENSITIVITY`, `MAX_SENSITIVITY`].
    sensitivity: f64,
    /// Largest per-axis step of a single relative move.
    pub max_step: f64,
    /// Scale changes at or below this magnitude are ignored.
    pub scroll_jitter: f64,
    /// Upper bound on wheel ticks emitted for one scale update.
    pub max_scroll_ticks: u8,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            movement_threshold: 10.0,
            hold_delay: Duration::from_millis(300),
            sensitivity: 2.0,
            max_step: 50.0,
            scroll_jitter: 0.05,
            max_scroll_ticks: 5,
        }
    }
}

/// One wheel scroll derived from a pinch update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrollStep {
    pub direction: ScrollDirection,
    pub ticks: u8,
}

impl GestureConfig {
    /// Returns a copy with `sensitivity` clamped into the accepted range.
    pub fn with_sensitivity(mut self, sensitivity: f64) -> Self {
        self.set_sensitivity(sensitivity);
        self
    }

    /// Updates the sensitivity, clamping into the accepted range.  A NaN
    /// leaves the current value in place.
    pub fn set_sensitivity(&mut self, sensitivity: f64) {
        if sensitivity.is_nan() {
            return;
        }
        self.sensitivity = sensitivity.clamp(MIN_SENSITIVITY, MAX_SENSITIVITY);
    }

    pub fn sensitivity(&self) -> f64 {
        self.sensitivity
    }

    /// Distance used at drag-end to decide whether the contact moved.
    ///
    /// Half of [`movement_threshold`](Self::movement_threshold).  The update
    /// path uses the full threshold; the two are kept separate on purpose.
    pub fn drag_end_threshold(&self) -> f64 {
        self.movement_threshold / 2.0
    }

    /// Scales one axis of a raw delta into an integer pointer step.
    ///
    /// The product is clamped to `±max_step` and truncated toward zero, so
    /// the result is zero exactly when `|raw * sensitivity| < 1`.
    pub fn scale_delta(&self, raw: f64) -> i32 {
        let scaled = (raw * self.sensitivity).clamp(-self.max_step, self.max_step);
        scaled.trunc() as i32
    }

    /// Converts a pinch scale change into a scroll, if it is large enough.
    ///
    /// Returns `None` when the change is within the jitter floor or rounds
    /// to zero ticks; the caller must then keep its previous `last_scale`.
    pub fn scroll_step(&self, last_scale: f64, scale: f64) -> Option<ScrollStep> {
        let delta = scale - last_scale;
        if delta.is_nan() || delta.abs() <= self.scroll_jitter {
            return None;
        }

        let direction = if delta < 0.0 {
            ScrollDirection::Down
        } else {
            ScrollDirection::Up
        };
        let ticks = (delta * 10.0).round().abs().min(f64::from(self.max_scroll_ticks)) as u8;
        if ticks == 0 {
            return None;
        }

        Some(ScrollStep { direction, ticks })
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
