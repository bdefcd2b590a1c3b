//! Application layer use cases.
//!
//! - **`translate_keys`** – key events to key presses, chords and modifier
//!   holds.
//! - **`translate_gestures`** – touch primitives to clicks, drags, moves and
//!   scrolls.
//! - **`service_lifecycle`** – enable, disable and reconcile the display
//!   pipeline's services.
//! - **`display_status`** – the display snapshot shown to the UI.
//! - **`synthetic_input`** – the seam both translators send commands through.
//!
//! Every collaborator is a trait injected at construction time, so the whole
//! layer runs against in-memory mocks in tests.

pub mod display_status;
pub mod service_lifecycle;
pub mod synthetic_input;
pub mod translate_gestures;
pub mod translate_keys;
