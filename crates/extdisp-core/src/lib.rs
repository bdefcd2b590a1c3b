//! # extdisp-core
//!
//! Shared library for External Displays containing the synthetic input
//! command model, the pure gesture arithmetic, key classification, the
//! service set description, and small display helpers (EDID and mode lists).
//!
//! This crate is used by the `extdisp-app` binary crate.  It has zero
//! dependencies on OS APIs, D-Bus, child processes, or the async runtime.
//!
//! # Architecture overview (for beginners)
//!
//! External Displays turns a phone or tablet touchscreen into a touchpad and
//! keyboard for a monitor plugged in through a USB display adapter.  Touch and
//! key events from the UI are translated into *backend commands* ("move the
//! pointer by 12,-3", "press button 1", "type 'a'") which a synthetic input
//! backend executes on the external display's X server.
//!
//! This crate (`extdisp-core`) is the shared foundation.  It defines:
//!
//! - **`domain`** – Pure data and arithmetic with no I/O: the
//!   [`BackendCommand`] vocabulary, the modifier latch ([`ModifierSet`]), the
//!   gesture tuning and delta math ([`GestureConfig`]), and the set of system
//!   services that make up the display pipeline ([`ServiceSet`]).
//!
//! - **`keymap`** – Classification of platform key names (X keysym names such
//!   as `Return` or `Control_L`) into navigation keys, modifiers, and
//!   printable characters.
//!
//! - **`display`** – EDID manufacturer decoding and mode list normalisation
//!   used by the sysfs display state reader.

pub mod display;
pub mod domain;
pub mod keymap;

pub use domain::command::{
    BackendCommand, KeyChord, PointerButton, ScrollDirection, WheelMapping,
};
pub use domain::gesture::{GestureConfig, ScrollStep};
pub use domain::modifiers::{Modifier, ModifierSet, ModifierSnapshot};
pub use domain::service::{BusScope, ServiceRole, ServiceSet, ServiceUnit};
pub use keymap::{classify_key, KeyClass};
