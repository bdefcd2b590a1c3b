//! Service manager adapters.
//!
//! - **`systemd`** – talks to systemd over D-Bus (zbus).  System units go to
//!   the system bus, per-user units to the session bus.
//! - **`mock`** – records calls in memory for tests.

pub mod mock;
pub mod systemd;

pub use systemd::SystemdServiceManager;
