//! External Displays entry point.
//!
//! # Usage
//!
//! ```text
//! external-displays [OPTIONS] [COMMAND]
//!
//! Commands:
//!   serve      Run the touchpad bridge over stdin/stdout (default)
//!   enable     Start the display pipeline and exit
//!   disable    Stop the display pipeline and exit
//!   status     Print the display snapshot as JSON
//!   modes      List the modes the display offers
//!   set-mode   Switch the display to MODE
//!
//! Options:
//!   --display <DISPLAY>  X display of the external monitor
//!   --config  <PATH>     Config file [default: ~/.config/external-displays/config.toml]
//! ```
//!
//! # Environment variable overrides
//!
//! | Variable                 | Overrides                  |
//! |--------------------------|----------------------------|
//! | `EXTDISP_TARGET_DISPLAY` | `--display`                |
//! | `EXTDISP_CONFIG`         | `--config`                 |
//! | `RUST_LOG`               | `log_level` in the config  |
//!
//! # What happens in `serve`
//!
//! 1. Config is loaded and logging initialised (to stderr).
//! 2. The connector is detected and the adapters are built.
//! 3. `xdotool` is checked; without it there is nothing to drive.
//! 4. The stdin reader, stdout writer and event loop are started.
//! 5. A reconcile runs so the UI starts with the real pipeline state.
//! 6. On stdin close or Ctrl+C the loop releases held keys and buttons, and
//!    the process waits (briefly) for those releases to reach the display.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio::io::BufReader;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use extdisp_app::application::display_status::{
    DisplaySnapshot, DisplayStateSource, DisplayTarget,
};
use extdisp_app::application::service_lifecycle::{
    LifecycleController, LifecycleReport, LifecycleWorker, Transition,
};
use extdisp_app::application::synthetic_input::SyntheticInput;
use extdisp_app::application::translate_gestures::GestureTranslator;
use extdisp_app::application::translate_keys::KeyboardTranslator;
use extdisp_app::event_loop::{EventLoop, EventSources};
use extdisp_app::infrastructure::display_state::{
    detect_connector, LinuxDisplayState, SysfsDisplay, Xrandr,
};
use extdisp_app::infrastructure::input_backend::XdotoolBackend;
use extdisp_app::infrastructure::service_manager::SystemdServiceManager;
use extdisp_app::infrastructure::storage::config::{load_config, load_config_from, AppConfig};
use extdisp_app::infrastructure::timer::TokioHoldTimer;
use extdisp_app::infrastructure::ui_bridge::{spawn_reader, spawn_writer, StatusHub};

/// Capacity of the UI event queue between the stdin reader and the loop.
const UI_QUEUE: usize = 256;

/// Upper bound on waiting for queued input commands at exit.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(2);

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Touchpad and display pipeline control for an external monitor.
#[derive(Debug, Parser)]
#[command(name = "external-displays", version)]
struct Cli {
    /// X display of the external monitor (e.g. `:1`).
    #[arg(long, env = "EXTDISP_TARGET_DISPLAY")]
    display: Option<String>,

    /// Path of the TOML config file.
    #[arg(long, env = "EXTDISP_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
enum Command {
    /// Run the touchpad bridge over stdin/stdout.
    Serve,
    /// Start the display pipeline.
    Enable,
    /// Stop the display pipeline.
    Disable,
    /// Print the display snapshot as JSON.
    Status,
    /// List the modes the display offers.
    Modes,
    /// Switch the display to MODE (e.g. `1920x1080`).
    SetMode { mode: String },
}

impl Cli {
    fn load_config(&self) -> anyhow::Result<AppConfig> {
        let mut config = match &self.config {
            Some(path) => load_config_from(path)
                .with_context(|| format!("failed to load config from {}", path.display()))?,
            None => load_config().context("failed to load config")?,
        };
        if let Some(display) = &self.display {
            config.display.x_display = display.clone();
        }
        Ok(config)
    }
}

// ── Wiring ────────────────────────────────────────────────────────────────────

/// Adapters shared by every command.
struct Runtime {
    config: AppConfig,
    target: DisplayTarget,
    display: Arc<dyn DisplayStateSource>,
    controller: Arc<LifecycleController>,
}

impl Runtime {
    fn build(config: AppConfig) -> anyhow::Result<Self> {
        let sysfs = SysfsDisplay::new(&config.display.sysfs_root);
        let connector = if config.display.auto_detect_connector {
            detect_connector(sysfs.root(), &config.display.card, &config.display.connector)
        } else {
            config.display.connector.clone()
        };
        let target = DisplayTarget {
            card: config.display.card.clone(),
            connector,
        };
        info!(%target, x_display = %config.display.x_display, "display target");

        let display: Arc<dyn DisplayStateSource> = Arc::new(LinuxDisplayState::new(
            sysfs,
            Xrandr::new(&config.display.x_display),
        ));
        let settings = config
            .lifecycle
            .settings(target.clone())
            .context("invalid lifecycle settings")?;
        let controller = Arc::new(LifecycleController::new(
            config.services.service_set(),
            Arc::new(SystemdServiceManager::new()),
            Arc::clone(&display),
            settings,
        ));

        Ok(Self {
            config,
            target,
            display,
            controller,
        })
    }
}

fn init_logging(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = cli.load_config()?;
    init_logging(&config);

    let runtime = Runtime::build(config)?;
    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(runtime).await,
        Command::Enable => finish(runtime.controller.enable().await),
        Command::Disable => finish(runtime.controller.disable().await),
        Command::Status => {
            let snapshot = DisplaySnapshot::collect(runtime.display.as_ref(), &runtime.target);
            println!("{}", serde_json::to_string_pretty(&snapshot)?);
            Ok(())
        }
        Command::Modes => {
            for mode in runtime.display.available_modes(&runtime.target) {
                println!("{mode}");
            }
            Ok(())
        }
        Command::SetMode { mode } => {
            runtime
                .display
                .apply_mode(&runtime.target.connector, &mode)
                .with_context(|| format!("Failed to change mode to {mode}"))?;
            println!("Display mode changed to {mode}");
            Ok(())
        }
    }
}

/// Prints a one-shot transition's outcome and turns failure into an error.
fn finish(report: LifecycleReport) -> anyhow::Result<()> {
    for warning in &report.warnings {
        eprintln!("warning: {} ({})", warning.message, warning.cause);
    }
    match &report.failure {
        None => {
            println!("{}", report.message());
            Ok(())
        }
        Some(failure) => anyhow::bail!("{}: {}", failure.message, failure.cause),
    }
}

async fn serve(runtime: Runtime) -> anyhow::Result<()> {
    info!("External Displays starting");

    XdotoolBackend::check_available().context("xdotool is required to forward input")?;
    let xdotool = Arc::new(XdotoolBackend::spawn(
        &runtime.config.display.x_display,
        runtime.config.input.wheel,
    ));
    let backend: Arc<dyn SyntheticInput> = xdotool.clone();

    let (timer_tx, timer_rx) = mpsc::unbounded_channel();
    let (report_tx, report_rx) = mpsc::unbounded_channel();
    let (ui_tx, ui_rx) = mpsc::channel(UI_QUEUE);

    let keyboard = KeyboardTranslator::new(Arc::clone(&backend));
    let gestures = GestureTranslator::new(
        backend,
        Box::new(TokioHoldTimer::new(timer_tx)),
        runtime.config.input.gesture_config(),
    );
    let worker = LifecycleWorker::new(Arc::clone(&runtime.controller), report_tx);

    let hub = StatusHub::new();
    let writer = spawn_writer(&hub, tokio::io::stdout());
    let reader = spawn_reader(BufReader::new(tokio::io::stdin()), ui_tx);

    if let Err(e) = worker.request(Transition::Reconcile) {
        warn!(error = %e, "startup reconcile not started");
    }

    let event_loop = EventLoop::new(
        keyboard,
        gestures,
        worker,
        runtime.display,
        runtime.target,
        hub,
        runtime.config.display.refresh_interval(),
    );
    let sources = EventSources {
        ui: ui_rx,
        timer: timer_rx,
        reports: report_rx,
    };

    event_loop.run(sources, ctrl_c()).await;

    match tokio::time::timeout(DRAIN_TIMEOUT, xdotool.drain()).await {
        Ok(Ok(())) => debug!("input commands drained"),
        Ok(Err(e)) => warn!(error = %e, "input commands not drained"),
        Err(_) => warn!(timeout = ?DRAIN_TIMEOUT, "timed out draining input commands"),
    }

    reader.abort();
    writer.abort();
    info!("External Displays stopped");
    Ok(())
}

/// Resolves on Ctrl+C.  If the signal cannot be watched, never resolves and
/// the process ends when stdin closes.
async fn ctrl_c() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("received Ctrl+C, shutting down"),
        Err(e) => {
            warn!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
