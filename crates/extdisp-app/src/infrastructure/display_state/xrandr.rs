//! `xrandr` adapter: current resolution and mode switching.
//!
//! The current resolution comes from the geometry of the connected output in
//! `xrandr --query`:
//!
//! ```text
//! DVI-I-1-1 connected 1920x1080+0+0 (normal left inverted right) 531mm x 299mm
//! ```
//!
//! An output matches when its name contains the configured connector, since
//! the X server may add a suffix to the kernel's name.

use std::process::Command;

use tracing::{debug, info};

use crate::application::display_status::DisplayStateError;

const XRANDR: &str = "xrandr";

/// Runs `xrandr` against one X display.
#[derive(Debug, Clone)]
pub struct Xrandr {
    display: String,
}

impl Xrandr {
    pub fn new(display: impl Into<String>) -> Self {
        Self {
            display: display.into(),
        }
    }

    /// The `WxH` the connector is currently driven at, if any.
    pub fn current_resolution(&self, connector: &str) -> Option<String> {
        let output = Command::new(XRANDR)
            .arg("--query")
            .env("DISPLAY", &self.display)
            .output();
        match output {
            Ok(out) if out.status.success() => {
                parse_current_resolution(&String::from_utf8_lossy(&out.stdout), connector)
            }
            Ok(out) => {
                debug!(status = %out.status, "xrandr query failed");
                None
            }
            Err(e) => {
                debug!(error = %e, "xrandr not available");
                None
            }
        }
    }

    /// Switches `connector` to `mode`.
    pub fn apply_mode(&self, connector: &str, mode: &str) -> Result<(), DisplayStateError> {
        info!(connector, mode, "switching display mode");
        let out = Command::new(XRANDR)
            .args(["--output", connector, "--mode", mode])
            .env("DISPLAY", &self.display)
            .output()
            .map_err(|source| DisplayStateError::Launch {
                tool: XRANDR,
                source,
            })?;
        if out.status.success() {
            Ok(())
        } else {
            Err(DisplayStateError::Failed {
                tool: XRANDR,
                status: out.status.to_string(),
                stderr: String::from_utf8_lossy(&out.stderr).trim().to_string(),
            })
        }
    }
}

/// Extracts the active `WxH` of the first connected output whose name
/// contains `connector`.
pub fn parse_current_resolution(query: &str, connector: &str) -> Option<String> {
    query
        .lines()
        .filter(|line| !line.starts_with(char::is_whitespace))
        .filter_map(|line| {
            let mut fields = line.split_whitespace();
            let name = fields.next()?;
            if !name.contains(connector) || fields.next()? != "connected" {
                return None;
            }
            fields.find_map(geometry_size)
        })
        .next()
}

/// `1920x1080+0+0` -> `1920x1080`.
fn geometry_size(field: &str) -> Option<String> {
    let (size, offset) = field.split_once('+')?;
    let (w, h) = size.split_once('x')?;
    let valid = w.parse::<u32>().is_ok()
        && h.parse::<u32>().is_ok()
        && offset.split('+').all(|n| n.parse::<i32>().is_ok());
    valid.then(|| size.to_string())
}
