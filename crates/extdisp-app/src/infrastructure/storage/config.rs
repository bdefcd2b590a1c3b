//! TOML-based configuration for External Displays.
//!
//! The file lives at `$XDG_CONFIG_HOME/external-displays/config.toml`, or
//! `~/.config/external-displays/config.toml` when `XDG_CONFIG_HOME` is unset.
//! A missing file means "all defaults".
//!
//! ```toml
//! log_level = "info"
//!
//! [display]
//! x_display = ":1"
//! card = "card1"
//! connector = "DVI-I-1"
//!
//! [input]
//! sensitivity = 2.0
//! wheel = "natural"
//!
//! [lifecycle]
//! connect_timeout_secs = 30
//!
//! [services.input_redirector]
//! name = "input-redirector.service"
//! bus = "session"
//! ```
//!
//! # Serde default values
//!
//! Every field carries `#[serde(default = "...")]` (or `#[serde(default)]`
//! on whole sections), so a file that sets a single key is valid and older
//! files keep working when new keys are added.

use std::path::{Path, PathBuf};
use std::time::Duration;

use extdisp_core::{GestureConfig, ServiceSet, ServiceUnit, WheelMapping};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::application::display_status::DisplayTarget;
use crate::application::service_lifecycle::LifecycleSettings;
use crate::infrastructure::display_state::sysfs::{DEFAULT_CONNECTOR, DRM_ROOT};

/// Error type for configuration file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The platform config directory could not be determined.
    #[error("could not determine platform config directory")]
    NoPlatformConfigDir,

    /// `$HOME` is unset and the marker path was not configured.
    #[error("could not determine home directory for the enable marker")]
    NoHomeDir,

    /// A file system I/O error occurred.
    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// The config could not be serialized to TOML.
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

// ── Config schema types ───────────────────────────────────────────────────────

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    /// `tracing` level used when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub display: DisplayConfig,
    #[serde(default)]
    pub input: InputConfig,
    #[serde(default)]
    pub lifecycle: LifecycleConfig,
    #[serde(default)]
    pub services: ServicesConfig,
}

/// Which display is driven and where its state is read.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DisplayConfig {
    /// X display of the external monitor, passed to `xdotool` and `xrandr`.
    #[serde(default = "default_x_display")]
    pub x_display: String,
    /// DRM card the adapter shows up as.
    #[serde(default = "default_card")]
    pub card: String,
    /// Preferred connector on `card`.
    #[serde(default = "default_connector")]
    pub connector: String,
    /// Fall back to the first `DVI-I-*` connector if `connector` is missing.
    #[serde(default = "default_true")]
    pub auto_detect_connector: bool,
    #[serde(default = "default_sysfs_root")]
    pub sysfs_root: PathBuf,
    /// Seconds between display info refreshes while waiting for a connection.
    #[serde(default = "default_refresh_secs")]
    pub refresh_interval_secs: u64,
}

/// Touchpad tuning.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InputConfig {
    /// Pointer speed multiplier, clamped to 0.5..=3.0.
    #[serde(default = "default_sensitivity")]
    pub sensitivity: f64,
    /// Movement (in UI units) that turns a touch into a pointer move.
    #[serde(default = "default_movement_threshold")]
    pub movement_threshold: f64,
    /// Touch duration before a still contact becomes a held button.
    #[serde(default = "default_hold_delay_ms")]
    pub hold_delay_ms: u64,
    /// Which X11 wheel button a pinch-in sends (`natural` = 4).
    #[serde(default)]
    pub wheel: WheelMapping,
}

/// Marker, readiness paths and timing of the enable sequence.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LifecycleConfig {
    /// Enable marker.  Defaults to `~/.enable_external_display`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub marker_path: Option<PathBuf>,
    /// Path that exists once the driver has bound the adapter.
    #[serde(default = "default_hardware_path")]
    pub hardware_path: PathBuf,
    #[serde(default = "default_wait_secs")]
    pub hardware_timeout_secs: u64,
    #[serde(default = "default_hardware_poll_ms")]
    pub hardware_poll_ms: u64,
    #[serde(default = "default_wait_secs")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_connect_poll_ms")]
    pub connect_poll_ms: u64,
}

/// Unit name and bus for each service in the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServicesConfig {
    #[serde(default = "default_driver")]
    pub driver: ServiceUnit,
    #[serde(default = "default_display_server_bridge")]
    pub display_server_bridge: ServiceUnit,
    #[serde(default = "default_external_display_service")]
    pub external_display_service: ServiceUnit,
    #[serde(default = "default_input_redirector")]
    pub input_redirector: ServiceUnit,
}

// ── Default helpers ───────────────────────────────────────────────────────────

const MARKER_FILE: &str = ".enable_external_display";

fn default_log_level() -> String {
    "info".to_string()
}
fn default_x_display() -> String {
    ":1".to_string()
}
fn default_card() -> String {
    "card1".to_string()
}
fn default_connector() -> String {
    DEFAULT_CONNECTOR.to_string()
}
fn default_true() -> bool {
    true
}
fn default_sysfs_root() -> PathBuf {
    PathBuf::from(DRM_ROOT)
}
fn default_refresh_secs() -> u64 {
    5
}
fn default_sensitivity() -> f64 {
    2.0
}
fn default_movement_threshold() -> f64 {
    10.0
}
fn default_hold_delay_ms() -> u64 {
    300
}
fn default_hardware_path() -> PathBuf {
    PathBuf::from(DRM_ROOT).join("card0")
}
fn default_wait_secs() -> u64 {
    30
}
fn default_hardware_poll_ms() -> u64 {
    500
}
fn default_connect_poll_ms() -> u64 {
    1000
}
fn default_driver() -> ServiceUnit {
    ServiceSet::default().driver
}
fn default_display_server_bridge() -> ServiceUnit {
    ServiceSet::default().display_server_bridge
}
fn default_external_display_service() -> ServiceUnit {
    ServiceSet::default().external_display_service
}
fn default_input_redirector() -> ServiceUnit {
    ServiceSet::default().input_redirector
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            display: DisplayConfig::default(),
            input: InputConfig::default(),
            lifecycle: LifecycleConfig::default(),
            services: ServicesConfig::default(),
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            x_display: default_x_display(),
            card: default_card(),
            connector: default_connector(),
            auto_detect_connector: default_true(),
            sysfs_root: default_sysfs_root(),
            refresh_interval_secs: default_refresh_secs(),
        }
    }
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            sensitivity: default_sensitivity(),
            movement_threshold: default_movement_threshold(),
            hold_delay_ms: default_hold_delay_ms(),
            wheel: WheelMapping::default(),
        }
    }
}

impl Default for ServicesConfig {
    fn default() -> Self {
        let set = ServiceSet::default();
        Self {
            driver: set.driver,
            display_server_bridge: set.display_server_bridge,
            external_display_service: set.external_display_service,
            input_redirector: set.input_redirector,
        }
    }
}

// ── Conversions ───────────────────────────────────────────────────────────────

impl InputConfig {
    pub fn gesture_config(&self) -> GestureConfig {
        let mut config = GestureConfig::default().with_sensitivity(self.sensitivity);
        config.movement_threshold = self.movement_threshold;
        config.hold_delay = Duration::from_millis(self.hold_delay_ms);
        config
    }
}

impl ServicesConfig {
    pub fn service_set(&self) -> ServiceSet {
        ServiceSet {
            driver: self.driver.clone(),
            display_server_bridge: self.display_server_bridge.clone(),
            external_display_service: self.external_display_service.clone(),
            input_redirector: self.input_redirector.clone(),
        }
    }
}

impl DisplayConfig {
    /// Target with the configured connector, without auto-detection.
    pub fn configured_target(&self) -> DisplayTarget {
        DisplayTarget {
            card: self.card.clone(),
            connector: self.connector.clone(),
        }
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs.max(1))
    }
}

impl LifecycleConfig {
    /// The configured marker path, or `~/.enable_external_display`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NoHomeDir`] when no path is configured and
    /// `$HOME` is unset.
    pub fn resolved_marker_path(&self) -> Result<PathBuf, ConfigError> {
        match &self.marker_path {
            Some(path) => Ok(path.clone()),
            None => std::env::var_os("HOME")
                .map(|home| PathBuf::from(home).join(MARKER_FILE))
                .ok_or(ConfigError::NoHomeDir),
        }
    }

    /// Builds controller settings for `target`.
    pub fn settings(&self, target: DisplayTarget) -> Result<LifecycleSettings, ConfigError> {
        Ok(LifecycleSettings {
            marker_path: self.resolved_marker_path()?,
            hardware_path: self.hardware_path.clone(),
            target,
            hardware_timeout: Duration::from_secs(self.hardware_timeout_secs),
            hardware_poll: Duration::from_millis(self.hardware_poll_ms),
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            connect_poll: Duration::from_millis(self.connect_poll_ms),
        })
    }
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            marker_path: None,
            hardware_path: default_hardware_path(),
            hardware_timeout_secs: default_wait_secs(),
            hardware_poll_ms: default_hardware_poll_ms(),
            connect_timeout_secs: default_wait_secs(),
            connect_poll_ms: default_connect_poll_ms(),
        }
    }
}

// ── Config repository ─────────────────────────────────────────────────────────

/// Determines the directory holding the config file.
///
/// # Errors
///
/// Returns [`ConfigError::NoPlatformConfigDir`] when neither
/// `XDG_CONFIG_HOME` nor `HOME` is set.
pub fn config_dir() -> Result<PathBuf, ConfigError> {
    platform_config_dir().ok_or(ConfigError::NoPlatformConfigDir)
}

/// Resolves the full path to the default config file.
pub fn config_file_path() -> Result<PathBuf, ConfigError> {
    Ok(config_dir()?.join("config.toml"))
}

/// Loads the config from the default location.
pub fn load_config() -> Result<AppConfig, ConfigError> {
    load_config_from(&config_file_path()?)
}

/// Loads `AppConfig` from `path`, returning `AppConfig::default()` if the
/// file does not exist.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system errors other than "not found",
/// and [`ConfigError::Parse`] if the TOML is malformed.
pub fn load_config_from(path: &Path) -> Result<AppConfig, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(toml::from_str(&content)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(AppConfig::default()),
        Err(source) => Err(ConfigError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Persists `config` to `path`, creating the parent directory if needed.
pub fn save_config_to(config: &AppConfig, path: &Path) -> Result<(), ConfigError> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|source| ConfigError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
    }

    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn platform_config_dir() -> Option<PathBuf> {
    let base = std::env::var_os("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))?;
    Some(base.join("external-displays"))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
