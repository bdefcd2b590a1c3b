//! Infrastructure layer: adapters to the operating system and the UI.
//!
//! **Dependency rule**: this layer may depend on `application` and
//! `extdisp_core`, but MUST NOT be imported by the application layer outside
//! of tests.
//!
//! # Sub-modules
//!
//! - **`input_backend`** – `xdotool` synthetic input, plus a recording mock.
//! - **`service_manager`** – systemd over D-Bus, plus a recording mock.
//! - **`display_state`** – DRM sysfs and `xrandr`, plus an in-memory mock.
//! - **`storage`** – the TOML configuration file.
//! - **`timer`** – Tokio-backed and manually driven hold timers.
//! - **`ui_bridge`** – JSON-lines protocol on stdin/stdout and the status
//!   broadcast.

pub mod display_state;
pub mod input_backend;
pub mod service_manager;
pub mod storage;
pub mod timer;
pub mod ui_bridge;
