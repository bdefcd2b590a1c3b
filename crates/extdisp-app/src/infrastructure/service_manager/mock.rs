//! Recording service manager for tests.
//!
//! Units behave like real ones: a started unit is running until stopped,
//! starting a running unit and stopping a stopped one both succeed.  Use
//! [`RecordingServiceManager::fail_start`] / [`fail_stop`] to make a specific
//! unit fail, and [`with_delay`] to keep a transition in flight long enough
//! to race a second request against it.
//!
//! [`fail_stop`]: RecordingServiceManager::fail_stop
//! [`with_delay`]: RecordingServiceManager::with_delay

use std::collections::HashSet;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use extdisp_core::ServiceUnit;

use crate::application::service_lifecycle::{ServiceManager, ServiceManagerError};

/// One recorded call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceCall {
    Start(String),
    Stop(String),
    IsActive(String),
}

/// A service manager that keeps unit state in memory.
#[derive(Default)]
pub struct RecordingServiceManager {
    /// Every call, in order.
    pub calls: Mutex<Vec<ServiceCall>>,
    active: Mutex<HashSet<String>>,
    failing_start: Mutex<HashSet<String>>,
    failing_stop: Mutex<HashSet<String>>,
    delay: Option<Duration>,
}

impl RecordingServiceManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every start and stop sleeps for `delay` before completing.
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    pub fn fail_start(&self, unit: &str) {
        self.failing_start.lock().unwrap().insert(unit.to_string());
    }

    pub fn fail_stop(&self, unit: &str) {
        self.failing_stop.lock().unwrap().insert(unit.to_string());
    }

    /// Marks `unit` as already running.
    pub fn set_running(&self, unit: &str) {
        self.active.lock().unwrap().insert(unit.to_string());
    }

    /// Names passed to `start`, in order, including failed attempts.
    pub fn started(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter_map(|call| match call {
                ServiceCall::Start(name) => Some(name.clone()),
                _ => None,
            })
            .collect()
    }

    /// Names passed to `stop`, in order.
    pub fn stopped(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter_map(|call| match call {
                ServiceCall::Stop(name) => Some(name.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn start_count(&self, unit: &str) -> usize {
        self.started().iter().filter(|name| *name == unit).count()
    }

    /// Units currently running.
    pub fn running(&self) -> HashSet<String> {
        self.active.lock().unwrap().clone()
    }

    async fn pause(&self) {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl ServiceManager for RecordingServiceManager {
    async fn start(&self, unit: &ServiceUnit) -> Result<(), ServiceManagerError> {
        self.calls.lock().unwrap().push(ServiceCall::Start(unit.name.clone()));
        self.pause().await;
        if self.failing_start.lock().unwrap().contains(&unit.name) {
            return Err(ServiceManagerError::Call {
                method: "StartUnit",
                unit: unit.name.clone(),
                message: "mock failure".into(),
            });
        }
        self.active.lock().unwrap().insert(unit.name.clone());
        Ok(())
    }

    async fn stop(&self, unit: &ServiceUnit) -> Result<(), ServiceManagerError> {
        self.calls.lock().unwrap().push(ServiceCall::Stop(unit.name.clone()));
        self.pause().await;
        if self.failing_stop.lock().unwrap().contains(&unit.name) {
            return Err(ServiceManagerError::Call {
                method: "StopUnit",
                unit: unit.name.clone(),
                message: "mock failure".into(),
            });
        }
        self.active.lock().unwrap().remove(&unit.name);
        Ok(())
    }

    async fn is_active(&self, unit: &ServiceUnit) -> Result<bool, ServiceManagerError> {
        self.calls
            .lock()
            .unwrap()
            .push(ServiceCall::IsActive(unit.name.clone()));
        Ok(self.active.lock().unwrap().contains(&unit.name))
    }
}
