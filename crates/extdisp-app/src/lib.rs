//! extdisp-app library entry point.
//!
//! Re-exports all public modules so that integration tests in `tests/`
//! and the binary entry point in `main.rs` share the same module tree.
//!
//! # What does External Displays do? (for beginners)
//!
//! A phone or tablet drives a second monitor through a USB display adapter.
//! The adapter needs a kernel driver, a display server bridge and a user
//! service running before the monitor lights up, and once it does the
//! monitor has no keyboard or mouse of its own.
//!
//! This application:
//!
//! 1. Starts and stops the adapter's services in the right order, waiting
//!    for the hardware and the connection in between.
//! 2. Turns the phone's touchscreen into a touchpad for the monitor: taps
//!    click, a held finger drags, a moving finger moves the pointer, and a
//!    pinch scrolls.
//! 3. Forwards key presses, including modifier chords, to the monitor.
//! 4. Reports the monitor's connection, power state, manufacturer and modes,
//!    and switches modes on request.
//!
//! The touch UI itself is a separate process that talks to this one over
//! JSON lines on stdin/stdout (see [`infrastructure::ui_bridge`]).

/// Application layer: translators and the service lifecycle.
pub mod application;

/// The task that owns the translators and reacts to UI, timer and worker
/// events.
pub mod event_loop;

/// Infrastructure layer: OS adapters, configuration and the UI bridge.
pub mod infrastructure;
