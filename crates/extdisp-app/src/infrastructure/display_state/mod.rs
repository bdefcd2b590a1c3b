//! Display state adapters.
//!
//! The kernel's DRM sysfs tree answers "is something plugged in, is it
//! powered, who made it, which modes does it offer".  The X server answers
//! "which mode is it running" and performs mode switches, through `xrandr`.
//! [`LinuxDisplayState`] combines both behind [`DisplayStateSource`].

pub mod mock;
pub mod sysfs;
pub mod xrandr;

use crate::application::display_status::{
    DisplayStateError, DisplayStateSource, DisplayStatus, DisplayTarget,
};

pub use sysfs::{detect_connector, SysfsDisplay};
pub use xrandr::Xrandr;

/// Production display state: sysfs for the connector, `xrandr` for modes in
/// use.
pub struct LinuxDisplayState {
    sysfs: SysfsDisplay,
    xrandr: Xrandr,
}

impl LinuxDisplayState {
    pub fn new(sysfs: SysfsDisplay, xrandr: Xrandr) -> Self {
        Self { sysfs, xrandr }
    }
}

impl DisplayStateSource for LinuxDisplayState {
    fn status(&self, target: &DisplayTarget) -> DisplayStatus {
        self.sysfs.status(target)
    }

    fn available_modes(&self, target: &DisplayTarget) -> Vec<String> {
        self.sysfs.modes(target)
    }

    fn current_resolution(&self, connector: &str) -> Option<String> {
        self.xrandr.current_resolution(connector)
    }

    fn apply_mode(&self, connector: &str, mode: &str) -> Result<(), DisplayStateError> {
        self.xrandr.apply_mode(connector, mode)
    }
}
