//! systemd service manager over D-Bus.
//!
//! # How units are driven (for beginners)
//!
//! systemd exposes one `org.freedesktop.systemd1.Manager` object per bus.
//! Starting and stopping are method calls on it (`StartUnit` / `StopUnit`
//! with mode `replace`).  To read whether a unit is running we ask the
//! manager for the unit's object path (`GetUnit`) and then read the
//! `ActiveState` property of that object.
//!
//! `GetUnit` fails with `NoSuchUnit` when systemd has never loaded the unit.
//! That is reported as "not active" rather than an error.
//!
//! Each bus connection is opened lazily on first use and then shared.

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::{debug, info};
use zbus::zvariant::OwnedObjectPath;
use zbus::{proxy, Connection};

use extdisp_core::{BusScope, ServiceUnit};

use crate::application::service_lifecycle::{ServiceManager, ServiceManagerError};

const NO_SUCH_UNIT: &str = "org.freedesktop.systemd1.NoSuchUnit";

/// Job mode passed to `StartUnit` / `StopUnit`.
const JOB_MODE: &str = "replace";

#[proxy(
    interface = "org.freedesktop.systemd1.Manager",
    default_service = "org.freedesktop.systemd1",
    default_path = "/org/freedesktop/systemd1"
)]
trait SystemdManager {
    #[zbus(name = "StartUnit")]
    fn start_unit(&self, name: &str, mode: &str) -> zbus::Result<OwnedObjectPath>;

    #[zbus(name = "StopUnit")]
    fn stop_unit(&self, name: &str, mode: &str) -> zbus::Result<OwnedObjectPath>;

    #[zbus(name = "GetUnit")]
    fn get_unit(&self, name: &str) -> zbus::Result<OwnedObjectPath>;
}

#[proxy(
    interface = "org.freedesktop.systemd1.Unit",
    default_service = "org.freedesktop.systemd1"
)]
trait SystemdUnit {
    #[zbus(property)]
    fn active_state(&self) -> zbus::Result<String>;
}

/// [`ServiceManager`] backed by systemd.
#[derive(Default)]
pub struct SystemdServiceManager {
    system: OnceCell<Connection>,
    session: OnceCell<Connection>,
}

impl SystemdServiceManager {
    pub fn new() -> Self {
        Self::default()
    }

    async fn connection(&self, bus: BusScope) -> Result<&Connection, ServiceManagerError> {
        let cell = match bus {
            BusScope::System => &self.system,
            BusScope::Session => &self.session,
        };
        cell.get_or_try_init(|| async {
            debug!(%bus, "connecting to D-Bus");
            match bus {
                BusScope::System => Connection::system().await,
                BusScope::Session => Connection::session().await,
            }
        })
        .await
        .map_err(|e| ServiceManagerError::Connection {
            bus,
            message: e.to_string(),
        })
    }

    async fn manager(&self, bus: BusScope) -> Result<SystemdManagerProxy<'_>, ServiceManagerError> {
        let conn = self.connection(bus).await?;
        SystemdManagerProxy::new(conn)
            .await
            .map_err(|e| ServiceManagerError::Connection {
                bus,
                message: e.to_string(),
            })
    }
}

fn call_error(method: &'static str, unit: &ServiceUnit, e: zbus::Error) -> ServiceManagerError {
    ServiceManagerError::Call {
        method,
        unit: unit.name.clone(),
        message: e.to_string(),
    }
}

fn is_no_such_unit(e: &zbus::Error) -> bool {
    matches!(e, zbus::Error::MethodError(name, _, _) if name.as_str() == NO_SUCH_UNIT)
}

#[async_trait]
impl ServiceManager for SystemdServiceManager {
    async fn start(&self, unit: &ServiceUnit) -> Result<(), ServiceManagerError> {
        let manager = self.manager(unit.bus).await?;
        let job = manager
            .start_unit(&unit.name, JOB_MODE)
            .await
            .map_err(|e| call_error("StartUnit", unit, e))?;
        info!(%unit, job = %job.as_str(), "start job queued");
        Ok(())
    }

    async fn stop(&self, unit: &ServiceUnit) -> Result<(), ServiceManagerError> {
        let manager = self.manager(unit.bus).await?;
        let job = manager
            .stop_unit(&unit.name, JOB_MODE)
            .await
            .map_err(|e| call_error("StopUnit", unit, e))?;
        info!(%unit, job = %job.as_str(), "stop job queued");
        Ok(())
    }

    async fn is_active(&self, unit: &ServiceUnit) -> Result<bool, ServiceManagerError> {
        let manager = self.manager(unit.bus).await?;
        let path = match manager.get_unit(&unit.name).await {
            Ok(path) => path,
            Err(e) if is_no_such_unit(&e) => {
                debug!(%unit, "unit not loaded");
                return Ok(false);
            }
            Err(e) => return Err(call_error("GetUnit", unit, e)),
        };

        let conn = self.connection(unit.bus).await?;
        let proxy = SystemdUnitProxy::builder(conn)
            .path(path)
            .map_err(|e| call_error("GetUnit", unit, e))?
            .build()
            .await
            .map_err(|e| call_error("GetUnit", unit, e))?;
        let state = proxy
            .active_state()
            .await
            .map_err(|e| call_error("ActiveState", unit, e))?;

        debug!(%unit, %state, "unit state");
        Ok(state == "active")
    }
}
