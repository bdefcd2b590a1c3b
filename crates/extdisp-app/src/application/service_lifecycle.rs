//! Service lifecycle: bringing the external display pipeline up and down.
//!
//! # Enable sequence
//!
//! | # | Step                                   | Required |
//! |---|----------------------------------------|----------|
//! | 1 | create the enable marker               | yes      |
//! | 2 | start the driver                       | yes      |
//! | 3 | wait for the hardware path to appear   | yes      |
//! | 4 | wait for the connector to be connected | yes      |
//! | 5 | start the display-server bridge        | yes      |
//! | 6 | start the external display service     | yes      |
//! | 7 | start the input redirector             | no       |
//!
//! A required step only runs if every earlier required step succeeded.  The
//! input redirector is independent of the chain and is always attempted; its
//! failure is reported as a warning.  If any required step fails the marker
//! is removed once, after the sequence, and the report cites that step.
//!
//! # Disable sequence
//!
//! Remove the marker, then stop the redirector, the external display service,
//! the bridge and the driver.  Every step runs regardless of the others and
//! failures only produce warnings, so a disable always succeeds.
//!
//! # One transition at a time
//!
//! [`LifecycleWorker`] runs transitions on a spawned task behind a single
//! gate.  A request that arrives while one is in flight is rejected with
//! [`LifecycleError::Busy`].  Finished reports are sent over a channel to the
//! event loop, which turns them into status events for the UI.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use extdisp_core::{BusScope, ServiceRole, ServiceSet, ServiceUnit};
use thiserror::Error;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use super::display_status::{DisplayStateSource, DisplayTarget};

// ── Service manager seam ──────────────────────────────────────────────────────

/// Error type for service manager calls.
#[derive(Debug, Error)]
pub enum ServiceManagerError {
    /// The bus for the unit's scope could not be reached.
    #[error("could not connect to the {bus} bus: {message}")]
    Connection { bus: BusScope, message: String },
    /// The service manager rejected the call.
    #[error("{method} {unit} failed: {message}")]
    Call {
        method: &'static str,
        unit: String,
        message: String,
    },
}

/// Starts, stops and inspects service units.
///
/// Starting a running unit and stopping a stopped one both succeed.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ServiceManager: Send + Sync {
    async fn start(&self, unit: &ServiceUnit) -> Result<(), ServiceManagerError>;
    async fn stop(&self, unit: &ServiceUnit) -> Result<(), ServiceManagerError>;
    async fn is_active(&self, unit: &ServiceUnit) -> Result<bool, ServiceManagerError>;
}

// ── Errors and reports ────────────────────────────────────────────────────────

/// Error type for lifecycle steps.
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("enable marker {}: {source}", path.display())]
    Marker {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("service {unit}: {source}")]
    Service {
        unit: String,
        #[source]
        source: ServiceManagerError,
    },
    #[error("timed out after {after:?} waiting for {what}")]
    Timeout { what: String, after: Duration },
    #[error("a display service change is already in progress")]
    Busy,
}

/// Which transition a report describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Enable,
    Disable,
    /// Startup check of the marker against the running services.
    Reconcile,
}

/// What a lifecycle step does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepAction {
    CreateMarker,
    RemoveMarker,
    Start(ServiceRole),
    Stop(ServiceRole),
    AwaitHardware,
    AwaitConnection,
}

impl StepAction {
    /// Message shown to the user when this step fails.
    pub fn failure_message(self) -> String {
        match self {
            Self::CreateMarker => "Failed to enable display services".into(),
            Self::RemoveMarker => "Failed to disable display services".into(),
            Self::Start(ServiceRole::Driver) => "Failed to start displaylink driver".into(),
            Self::Start(ServiceRole::DisplayServerBridge) => "Failed to start display server".into(),
            Self::Start(role) => format!("Failed to start {}", role.label()),
            Self::Stop(role) => format!("Failed to stop {}", role.label()),
            Self::AwaitHardware => "Timeout waiting for display".into(),
            Self::AwaitConnection => "Timeout waiting for display connection".into(),
        }
    }
}

impl fmt::Display for StepAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CreateMarker => f.write_str("create enable marker"),
            Self::RemoveMarker => f.write_str("remove enable marker"),
            Self::Start(role) => write!(f, "start {}", role.label()),
            Self::Stop(role) => write!(f, "stop {}", role.label()),
            Self::AwaitHardware => f.write_str("wait for display hardware"),
            Self::AwaitConnection => f.write_str("wait for display connection"),
        }
    }
}

/// One entry of a transition plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Step {
    pub action: StepAction,
    /// A failed required step skips the remaining required steps.
    pub required: bool,
}

impl Step {
    const fn required(action: StepAction) -> Self {
        Self {
            action,
            required: true,
        }
    }

    const fn independent(action: StepAction) -> Self {
        Self {
            action,
            required: false,
        }
    }
}

/// The enable plan, in execution order.
pub fn enable_plan() -> Vec<Step> {
    vec![
        Step::required(StepAction::CreateMarker),
        Step::required(StepAction::Start(ServiceRole::Driver)),
        Step::required(StepAction::AwaitHardware),
        Step::required(StepAction::AwaitConnection),
        Step::required(StepAction::Start(ServiceRole::DisplayServerBridge)),
        Step::required(StepAction::Start(ServiceRole::ExternalDisplayService)),
        Step::independent(StepAction::Start(ServiceRole::InputRedirector)),
    ]
}

/// The disable plan.  No step is required: every one is attempted.
pub fn disable_plan() -> Vec<Step> {
    std::iter::once(Step::independent(StepAction::RemoveMarker))
        .chain(
            ServiceSet::stop_order()
                .into_iter()
                .map(|role| Step::independent(StepAction::Stop(role))),
        )
        .collect()
}

/// A step that failed, with the user-facing message and the cause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepFailure {
    pub action: StepAction,
    pub message: String,
    pub cause: String,
}

impl StepFailure {
    fn new(action: StepAction, error: &LifecycleError) -> Self {
        Self {
            action,
            message: action.failure_message(),
            cause: error.to_string(),
        }
    }
}

/// Outcome of one transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LifecycleReport {
    pub transition: Transition,
    /// The required step that failed, if any.
    pub failure: Option<StepFailure>,
    /// Failures of independent steps.
    pub warnings: Vec<StepFailure>,
    /// Whether the pipeline should now be shown as enabled.
    pub enabled: bool,
}

impl LifecycleReport {
    fn new(transition: Transition) -> Self {
        Self {
            transition,
            failure: None,
            warnings: Vec::new(),
            enabled: false,
        }
    }

    pub fn succeeded(&self) -> bool {
        self.failure.is_none()
    }

    /// One-line summary for a toast.
    pub fn message(&self) -> String {
        if let Some(failure) = &self.failure {
            return failure.message.clone();
        }
        match self.transition {
            Transition::Enable => "Display services enabled successfully".into(),
            Transition::Disable => "Display services stopped successfully".into(),
            Transition::Reconcile if self.enabled => "Display services are running".into(),
            Transition::Reconcile => "Display services are stopped".into(),
        }
    }
}

// ── Controller ────────────────────────────────────────────────────────────────

/// Paths, target and timing used by the controller.
#[derive(Debug, Clone, PartialEq)]
pub struct LifecycleSettings {
    /// File whose existence records "intended enabled".
    pub marker_path: PathBuf,
    /// Path that appears once the driver has bound the hardware.
    pub hardware_path: PathBuf,
    pub target: DisplayTarget,
    pub hardware_timeout: Duration,
    pub hardware_poll: Duration,
    pub connect_timeout: Duration,
    pub connect_poll: Duration,
}

/// Runs the enable, disable and reconcile sequences.
pub struct LifecycleController {
    services: ServiceSet,
    manager: Arc<dyn ServiceManager>,
    display: Arc<dyn DisplayStateSource>,
    settings: LifecycleSettings,
}

impl LifecycleController {
    pub fn new(
        services: ServiceSet,
        manager: Arc<dyn ServiceManager>,
        display: Arc<dyn DisplayStateSource>,
        settings: LifecycleSettings,
    ) -> Self {
        Self {
            services,
            manager,
            display,
            settings,
        }
    }

    pub fn settings(&self) -> &LifecycleSettings {
        &self.settings
    }

    /// Brings the pipeline up.  Never panics; all outcomes are in the report.
    pub async fn enable(&self) -> LifecycleReport {
        info!("enabling display services");
        let mut report = LifecycleReport::new(Transition::Enable);

        for step in enable_plan() {
            if step.required && report.failure.is_some() {
                debug!(step = %step.action, "skipped after earlier failure");
                continue;
            }
            let Err(e) = self.run(step.action).await else {
                debug!(step = %step.action, "step done");
                continue;
            };
            if step.required {
                error!(step = %step.action, error = %e, "required step failed");
                report.failure = Some(StepFailure::new(step.action, &e));
            } else {
                warn!(step = %step.action, error = %e, "independent step failed");
                report.warnings.push(StepFailure::new(step.action, &e));
            }
        }

        if report.failure.is_some() {
            if let Err(e) = self.remove_marker().await {
                warn!(error = %e, "could not roll back enable marker");
            }
        } else {
            report.enabled = true;
            info!("display services enabled");
        }
        report
    }

    /// Brings the pipeline down, attempting every step.
    pub async fn disable(&self) -> LifecycleReport {
        info!("disabling display services");
        let mut report = LifecycleReport::new(Transition::Disable);
        for step in disable_plan() {
            if let Err(e) = self.run(step.action).await {
                warn!(step = %step.action, error = %e, "teardown step failed");
                report.warnings.push(StepFailure::new(step.action, &e));
            }
        }
        info!(warnings = report.warnings.len(), "display services stopped");
        report
    }

    /// Makes the marker agree with the services at startup.
    ///
    /// The pipeline counts as enabled when both the driver and the bridge are
    /// active.  A missing marker is then created; otherwise a stale marker is
    /// removed.
    pub async fn reconcile(&self) -> LifecycleReport {
        let driver = self.is_active(ServiceRole::Driver).await;
        let bridge = self.is_active(ServiceRole::DisplayServerBridge).await;
        let enabled = driver && bridge;
        let marker = self.marker_exists().await;

        let mut report = LifecycleReport::new(Transition::Reconcile);
        report.enabled = enabled;

        let fix = match (enabled, marker) {
            (true, false) => Some((StepAction::CreateMarker, self.create_marker().await)),
            (false, true) => Some((StepAction::RemoveMarker, self.remove_marker().await)),
            _ => None,
        };
        if let Some((action, Err(e))) = fix {
            warn!(step = %action, error = %e, "could not reconcile enable marker");
            report.warnings.push(StepFailure::new(action, &e));
        }

        info!(enabled, marker, "reconciled display service state");
        report
    }

    async fn run(&self, action: StepAction) -> Result<(), LifecycleError> {
        match action {
            StepAction::CreateMarker => self.create_marker().await,
            StepAction::RemoveMarker => self.remove_marker().await,
            StepAction::Start(role) => {
                let unit = self.services.unit(role);
                info!(%unit, "starting service");
                self.manager.start(unit).await.map_err(|source| LifecycleError::Service {
                    unit: unit.name.clone(),
                    source,
                })
            }
            StepAction::Stop(role) => {
                let unit = self.services.unit(role);
                info!(%unit, "stopping service");
                self.manager.stop(unit).await.map_err(|source| LifecycleError::Service {
                    unit: unit.name.clone(),
                    source,
                })
            }
            StepAction::AwaitHardware => self.await_hardware().await,
            StepAction::AwaitConnection => self.await_connection().await,
        }
    }

    async fn is_active(&self, role: ServiceRole) -> bool {
        let unit = self.services.unit(role);
        self.manager.is_active(unit).await.unwrap_or_else(|e| {
            warn!(%unit, error = %e, "could not read service state");
            false
        })
    }

    // ── Marker ────────────────────────────────────────────────────────────────

    async fn marker_exists(&self) -> bool {
        tokio::fs::try_exists(&self.settings.marker_path)
            .await
            .unwrap_or(false)
    }

    async fn create_marker(&self) -> Result<(), LifecycleError> {
        let path = &self.settings.marker_path;
        tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .await
            .map(drop)
            .map_err(|source| LifecycleError::Marker {
                path: path.clone(),
                source,
            })
    }

    async fn remove_marker(&self) -> Result<(), LifecycleError> {
        let path = &self.settings.marker_path;
        match tokio::fs::remove_file(path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(LifecycleError::Marker {
                path: path.clone(),
                source,
            }),
        }
    }

    // ── Readiness waits ───────────────────────────────────────────────────────

    async fn await_hardware(&self) -> Result<(), LifecycleError> {
        let path = &self.settings.hardware_path;
        let what = format!("{}", path.display());
        poll_until(&what, self.settings.hardware_timeout, self.settings.hardware_poll, || async {
            tokio::fs::try_exists(path).await.unwrap_or(false)
        })
        .await
    }

    async fn await_connection(&self) -> Result<(), LifecycleError> {
        let target = &self.settings.target;
        let what = format!("{target} to connect");
        poll_until(&what, self.settings.connect_timeout, self.settings.connect_poll, || async {
            self.display.status(target).is_connected()
        })
        .await
    }
}

/// Polls `check` every `interval` until it returns `true` or `timeout`
/// elapses.  The check always runs at least once.
async fn poll_until<F, Fut>(
    what: &str,
    timeout: Duration,
    interval: Duration,
    mut check: F,
) -> Result<(), LifecycleError>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    let deadline = Instant::now() + timeout;
    loop {
        if check().await {
            return Ok(());
        }
        if Instant::now() >= deadline {
            return Err(LifecycleError::Timeout {
                what: what.to_string(),
                after: timeout,
            });
        }
        debug!(what, "not ready yet");
        tokio::time::sleep(interval).await;
    }
}

// ── Worker ────────────────────────────────────────────────────────────────────

/// Runs transitions off the event loop, one at a time.
#[derive(Clone)]
pub struct LifecycleWorker {
    controller: Arc<LifecycleController>,
    gate: Arc<Mutex<()>>,
    reports: mpsc::UnboundedSender<LifecycleReport>,
}

impl LifecycleWorker {
    /// Creates a worker that sends finished reports on `reports`.
    pub fn new(
        controller: Arc<LifecycleController>,
        reports: mpsc::UnboundedSender<LifecycleReport>,
    ) -> Self {
        Self {
            controller,
            gate: Arc::new(Mutex::new(())),
            reports,
        }
    }

    /// Starts `transition` on a new task.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::Busy`] if a transition is already running.
    pub fn request(&self, transition: Transition) -> Result<JoinHandle<()>, LifecycleError> {
        let permit = Arc::clone(&self.gate)
            .try_lock_owned()
            .map_err(|_| LifecycleError::Busy)?;

        let controller = Arc::clone(&self.controller);
        let reports = self.reports.clone();
        Ok(tokio::spawn(async move {
            let _permit = permit;
            let report = match transition {
                Transition::Enable => controller.enable().await,
                Transition::Disable => controller.disable().await,
                Transition::Reconcile => controller.reconcile().await,
            };
            if reports.send(report).is_err() {
                debug!("lifecycle report dropped: receiver closed");
            }
        }))
    }

    /// Returns `true` while a transition is running.
    pub fn is_busy(&self) -> bool {
        self.gate.try_lock().is_err()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::display_state::mock::MockDisplayState;
    use crate::infrastructure::service_manager::mock::RecordingServiceManager;
    use std::path::Path;

    struct Fixture {
        dir: PathBuf,
        settings: LifecycleSettings,
    }

    impl Fixture {
        fn new() -> Self {
            let dir = std::env::temp_dir().join(format!("extdisp_lifecycle_{}", uuid::Uuid::new_v4()));
            std::fs::create_dir_all(dir.join("drm/card0")).unwrap();
            let settings = LifecycleSettings {
                marker_path: dir.join(".enable_external_display"),
                hardware_path: dir.join("drm/card0"),
                target: DisplayTarget {
                    card: "card1".into(),
                    connector: "DVI-I-1".into(),
                },
                hardware_timeout: Duration::from_millis(100),
                hardware_poll: Duration::from_millis(10),
                connect_timeout: Duration::from_millis(100),
                connect_poll: Duration::from_millis(10),
            };
            Self { dir, settings }
        }

        fn controller(
            &self,
            manager: Arc<dyn ServiceManager>,
            display: Arc<dyn DisplayStateSource>,
        ) -> LifecycleController {
            LifecycleController::new(ServiceSet::default(), manager, display, self.settings.clone())
        }

        fn marker(&self) -> &Path {
            &self.settings.marker_path
        }
    }

    impl Drop for Fixture {
        fn drop(&mut self) {
            std::fs::remove_dir_all(&self.dir).ok();
        }
    }

    // ── Plans ─────────────────────────────────────────────────────────────────

    #[test]
    fn test_enable_plan_only_redirector_is_independent() {
        let plan = enable_plan();
        assert_eq!(plan.len(), 7);
        let independent: Vec<_> = plan.iter().filter(|s| !s.required).collect();
        assert_eq!(independent.len(), 1);
        assert_eq!(
            independent[0].action,
            StepAction::Start(ServiceRole::InputRedirector)
        );
    }

    #[test]
    fn test_disable_plan_removes_marker_first_and_stops_driver_last() {
        let plan = disable_plan();
        assert_eq!(plan.len(), 5);
        assert_eq!(plan[0].action, StepAction::RemoveMarker);
        assert_eq!(plan[4].action, StepAction::Stop(ServiceRole::Driver));
        assert!(plan.iter().all(|s| !s.required));
    }

    // ── Enable ────────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_enable_happy_path_starts_all_and_keeps_marker() {
        // Arrange
        let fx = Fixture::new();
        let manager = Arc::new(RecordingServiceManager::new());
        let controller = fx.controller(manager.clone(), Arc::new(MockDisplayState::connected()));

        // Act
        let report = controller.enable().await;

        // Assert
        assert!(report.succeeded());
        assert!(report.enabled);
        assert!(fx.marker().exists());
        assert_eq!(
            manager.started(),
            vec![
                "displaylink-driver.service",
                "external-display-display-server.service",
                "externaldisplay.service",
                "input-redirector.service",
            ]
        );
    }

    #[tokio::test]
    async fn test_driver_failure_rolls_back_marker_and_still_tries_redirector() {
        // Arrange
        let fx = Fixture::new();
        let manager = Arc::new(RecordingServiceManager::new());
        manager.fail_start("displaylink-driver.service");
        let controller = fx.controller(manager.clone(), Arc::new(MockDisplayState::connected()));

        // Act
        let report = controller.enable().await;

        // Assert
        assert!(!report.succeeded());
        assert!(!report.enabled);
        assert!(!fx.marker().exists());
        let failure = report.failure.expect("failure");
        assert_eq!(failure.action, StepAction::Start(ServiceRole::Driver));
        assert_eq!(failure.message, "Failed to start displaylink driver");
        assert_eq!(
            manager.started(),
            vec!["displaylink-driver.service", "input-redirector.service"]
        );
    }

    #[tokio::test]
    async fn test_connection_timeout_is_distinct_failure() {
        let fx = Fixture::new();
        let manager = Arc::new(RecordingServiceManager::new());
        let controller =
            fx.controller(manager.clone(), Arc::new(MockDisplayState::disconnected()));

        let report = controller.enable().await;

        let failure = report.failure.expect("failure");
        assert_eq!(failure.action, StepAction::AwaitConnection);
        assert_eq!(failure.message, "Timeout waiting for display connection");
        assert!(failure.cause.contains("timed out"));
        assert!(!manager.started().contains(&"externaldisplay.service".to_string()));
        assert!(!fx.marker().exists());
    }

    #[tokio::test]
    async fn test_missing_hardware_path_times_out() {
        let mut fx = Fixture::new();
        fx.settings.hardware_path = fx.dir.join("drm/card9");
        let controller = fx.controller(
            Arc::new(RecordingServiceManager::new()),
            Arc::new(MockDisplayState::connected()),
        );

        let report = controller.enable().await;

        assert_eq!(
            report.failure.map(|f| f.action),
            Some(StepAction::AwaitHardware)
        );
    }

    #[tokio::test]
    async fn test_connection_that_arrives_late_is_waited_for() {
        let fx = Fixture::new();
        let display = MockDisplayState::disconnected();
        *display.connect_after.lock().unwrap() = Some(3);
        let display = Arc::new(display);
        let controller = fx.controller(Arc::new(RecordingServiceManager::new()), display.clone());

        let report = controller.enable().await;

        assert!(report.succeeded());
        assert_eq!(*display.status_queries.lock().unwrap(), 3);
    }

    #[tokio::test]
    async fn test_redirector_failure_is_only_a_warning() {
        let fx = Fixture::new();
        let manager = Arc::new(RecordingServiceManager::new());
        manager.fail_start("input-redirector.service");
        let controller = fx.controller(manager, Arc::new(MockDisplayState::connected()));

        let report = controller.enable().await;

        assert!(report.succeeded());
        assert!(fx.marker().exists());
        assert_eq!(report.warnings.len(), 1);
        assert_eq!(report.warnings[0].message, "Failed to start input redirector");
        assert_eq!(report.message(), "Display services enabled successfully");
    }

    #[tokio::test]
    async fn test_marker_failure_skips_every_required_step() {
        let mut fx = Fixture::new();
        fx.settings.marker_path = fx.dir.join("no/such/dir/marker");
        let manager = Arc::new(RecordingServiceManager::new());
        let controller = fx.controller(manager.clone(), Arc::new(MockDisplayState::connected()));

        let report = controller.enable().await;

        assert_eq!(report.failure.map(|f| f.action), Some(StepAction::CreateMarker));
        assert_eq!(manager.started(), vec!["input-redirector.service"]);
    }

    // ── Disable ───────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_enable_then_disable_leaves_nothing_running() {
        // Arrange
        let fx = Fixture::new();
        let manager = Arc::new(RecordingServiceManager::new());
        let controller = fx.controller(manager.clone(), Arc::new(MockDisplayState::connected()));

        // Act
        controller.enable().await;
        let report = controller.disable().await;

        // Assert
        assert!(report.succeeded());
        assert!(!report.enabled);
        assert!(!fx.marker().exists());
        assert!(manager.running().is_empty());
        assert_eq!(report.message(), "Display services stopped successfully");
    }

    #[tokio::test]
    async fn test_disable_attempts_every_stop_even_when_all_fail() {
        // Arrange: expectation-style mock, every stop fails
        let fx = Fixture::new();
        let mut mock = MockServiceManager::new();
        mock.expect_stop().times(4).returning(|unit| {
            Err(ServiceManagerError::Call {
                method: "StopUnit",
                unit: unit.name.clone(),
                message: "access denied".into(),
            })
        });
        mock.expect_start().never();
        let controller = fx.controller(Arc::new(mock), Arc::new(MockDisplayState::connected()));

        // Act
        let report = controller.disable().await;

        // Assert
        assert!(report.succeeded());
        assert_eq!(report.warnings.len(), 4);
        assert_eq!(
            report.warnings[3].action,
            StepAction::Stop(ServiceRole::Driver)
        );
    }

    #[tokio::test]
    async fn test_disable_without_marker_is_fine() {
        let fx = Fixture::new();
        let controller = fx.controller(
            Arc::new(RecordingServiceManager::new()),
            Arc::new(MockDisplayState::default()),
        );

        let report = controller.disable().await;

        assert!(report.warnings.is_empty());
    }

    // ── Reconcile ─────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_reconcile_creates_missing_marker_when_services_run() {
        let fx = Fixture::new();
        let mut mock = MockServiceManager::new();
        mock.expect_is_active().times(2).returning(|_| Ok(true));
        let controller = fx.controller(Arc::new(mock), Arc::new(MockDisplayState::connected()));

        let report = controller.reconcile().await;

        assert!(report.enabled);
        assert!(fx.marker().exists());
    }

    #[tokio::test]
    async fn test_reconcile_removes_stale_marker_when_bridge_is_down() {
        let fx = Fixture::new();
        std::fs::write(fx.marker(), b"").unwrap();
        let mut mock = MockServiceManager::new();
        mock.expect_is_active()
            .withf(|unit| unit.name == "displaylink-driver.service")
            .returning(|_| Ok(true));
        mock.expect_is_active()
            .withf(|unit| unit.name == "external-display-display-server.service")
            .returning(|_| Ok(false));
        let controller = fx.controller(Arc::new(mock), Arc::new(MockDisplayState::connected()));

        let report = controller.reconcile().await;

        assert!(!report.enabled);
        assert!(!fx.marker().exists());
        assert_eq!(report.message(), "Display services are stopped");
    }

    #[tokio::test]
    async fn test_reconcile_treats_bus_errors_as_inactive() {
        let fx = Fixture::new();
        let mut mock = MockServiceManager::new();
        mock.expect_is_active().returning(|_| {
            Err(ServiceManagerError::Connection {
                bus: BusScope::System,
                message: "no bus".into(),
            })
        });
        let controller = fx.controller(Arc::new(mock), Arc::new(MockDisplayState::connected()));

        assert!(!controller.reconcile().await.enabled);
    }

    // ── Worker ────────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_worker_rejects_second_request_while_busy() {
        // Arrange: slow starts keep the first enable in flight
        let fx = Fixture::new();
        let manager = Arc::new(RecordingServiceManager::with_delay(Duration::from_millis(50)));
        let controller = Arc::new(fx.controller(manager.clone(), Arc::new(MockDisplayState::connected())));
        let (tx, mut rx) = mpsc::unbounded_channel();
        let worker = LifecycleWorker::new(controller, tx);

        // Act
        let first = worker.request(Transition::Enable).expect("first request accepted");
        let second = worker.request(Transition::Enable);
        first.await.unwrap();

        // Assert
        assert!(matches!(second, Err(LifecycleError::Busy)));
        let report = rx.recv().await.expect("report");
        assert!(report.succeeded());
        assert!(fx.marker().exists());
        assert_eq!(manager.start_count("displaylink-driver.service"), 1);
        assert!(!worker.is_busy());
    }

    #[tokio::test]
    async fn test_worker_accepts_new_request_after_finish() {
        let fx = Fixture::new();
        let controller = Arc::new(fx.controller(
            Arc::new(RecordingServiceManager::new()),
            Arc::new(MockDisplayState::connected()),
        ));
        let (tx, mut rx) = mpsc::unbounded_channel();
        let worker = LifecycleWorker::new(controller, tx);

        worker.request(Transition::Enable).unwrap().await.unwrap();
        worker.request(Transition::Disable).unwrap().await.unwrap();

        assert_eq!(rx.recv().await.map(|r| r.transition), Some(Transition::Enable));
        assert_eq!(rx.recv().await.map(|r| r.transition), Some(Transition::Disable));
    }
}
