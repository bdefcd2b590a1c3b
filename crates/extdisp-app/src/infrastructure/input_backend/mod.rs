//! Synthetic input transports.
//!
//! - **`xdotool`** – the shipped transport.  Runs `xdotool` against the
//!   external display's X server on a background task.
//! - **`mock`** – records commands for tests.

pub mod mock;
pub mod xdotool;

pub use xdotool::XdotoolBackend;
