//! DRM connector state from sysfs.
//!
//! Each connector has a directory `<root>/<card>/<card>-<connector>/` with
//! plain-text `status`, `dpms` and `modes` files and a binary `edid` blob.
//! A missing or unreadable file means "unknown" and is reported as `None`.

use std::fs;
use std::path::{Path, PathBuf};

use extdisp_core::display::{dedup_modes, manufacturer_id};
use tracing::{debug, info};

use crate::application::display_status::{DisplayStatus, DisplayTarget};

/// Default sysfs DRM class directory.
pub const DRM_ROOT: &str = "/sys/class/drm";

/// Connector used when auto-detection finds nothing.
pub const DEFAULT_CONNECTOR: &str = "DVI-I-1";

const AUTO_PREFIX: &str = "DVI-I-";

/// Reader for one sysfs DRM tree.
#[derive(Debug, Clone)]
pub struct SysfsDisplay {
    root: PathBuf,
}

impl Default for SysfsDisplay {
    fn default() -> Self {
        Self::new(DRM_ROOT)
    }
}

impl SysfsDisplay {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory of `target`'s connector.
    pub fn connector_dir(&self, target: &DisplayTarget) -> PathBuf {
        connector_dir(&self.root, &target.card, &target.connector)
    }

    pub fn status(&self, target: &DisplayTarget) -> DisplayStatus {
        let dir = self.connector_dir(target);
        DisplayStatus {
            status: read_trimmed(&dir.join("status")),
            power_state: read_trimmed(&dir.join("dpms")),
            manufacturer: fs::read(dir.join("edid"))
                .ok()
                .and_then(|edid| manufacturer_id(&edid)),
        }
    }

    pub fn modes(&self, target: &DisplayTarget) -> Vec<String> {
        let path = self.connector_dir(target).join("modes");
        match fs::read_to_string(&path) {
            Ok(contents) => dedup_modes(contents.lines()),
            Err(e) => {
                debug!(path = %path.display(), error = %e, "modes unavailable");
                Vec::new()
            }
        }
    }
}

fn connector_dir(root: &Path, card: &str, connector: &str) -> PathBuf {
    root.join(card).join(format!("{card}-{connector}"))
}

fn read_trimmed(path: &Path) -> Option<String> {
    fs::read_to_string(path)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Picks the connector to drive on `card`.
///
/// `preferred` wins if its directory exists.  Otherwise the first
/// `<card>-DVI-I-*` entry (by name) is used, and failing that `preferred`
/// is returned unchanged.
pub fn detect_connector(root: &Path, card: &str, preferred: &str) -> String {
    if connector_dir(root, card, preferred).exists() {
        return preferred.to_string();
    }

    let prefix = format!("{card}-{AUTO_PREFIX}");
    let mut found: Vec<String> = fs::read_dir(root.join(card))
        .into_iter()
        .flatten()
        .flatten()
        .filter_map(|entry| entry.file_name().into_string().ok())
        .filter(|name| name.starts_with(&prefix))
        .collect();
    found.sort();

    match found.first().and_then(|name| name.strip_prefix(&format!("{card}-"))) {
        Some(connector) => {
            info!(connector, "preferred connector missing, using detected one");
            connector.to_string()
        }
        None => {
            info!(connector = preferred, "no DVI-I connector found, keeping default");
            preferred.to_string()
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
