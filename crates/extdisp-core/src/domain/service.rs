//! The system services that together make the external display pipeline live.
//!
//! Start order is driver → display-server bridge → external display service.
//! The input redirector is independent of that chain: it is started and
//! stopped alongside it but neither gates nor is gated by the others.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Which service manager instance owns a unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BusScope {
    /// The system-wide service manager (root-owned units).
    System,
    /// The per-user service manager.
    Session,
}

impl fmt::Display for BusScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::System => f.write_str("system"),
            Self::Session => f.write_str("session"),
        }
    }
}

/// The part a unit plays in the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServiceRole {
    Driver,
    DisplayServerBridge,
    ExternalDisplayService,
    InputRedirector,
}

impl ServiceRole {
    /// Human-readable name used in reports and toasts.
    pub fn label(self) -> &'static str {
        match self {
            Self::Driver => "driver",
            Self::DisplayServerBridge => "display server bridge",
            Self::ExternalDisplayService => "external display service",
            Self::InputRedirector => "input redirector",
        }
    }
}

/// A service unit name together with the bus it lives on.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ServiceUnit {
    pub name: String,
    pub bus: BusScope,
}

impl ServiceUnit {
    pub fn new(name: impl Into<String>, bus: BusScope) -> Self {
        Self {
            name: name.into(),
            bus,
        }
    }
}

impl fmt::Display for ServiceUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.bus)
    }
}

/// The four units of the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceSet {
    pub driver: ServiceUnit,
    pub display_server_bridge: ServiceUnit,
    pub external_display_service: ServiceUnit,
    pub input_redirector: ServiceUnit,
}

impl Default for ServiceSet {
    fn default() -> Self {
        Self {
            driver: ServiceUnit::new("displaylink-driver.service", BusScope::System),
            display_server_bridge: ServiceUnit::new(
                "external-display-display-server.service",
                BusScope::System,
            ),
            external_display_service: ServiceUnit::new("externaldisplay.service", BusScope::Session),
            input_redirector: ServiceUnit::new("input-redirector.service", BusScope::Session),
        }
    }
}

impl ServiceSet {
    /// Returns the unit that plays `role`.
    pub fn unit(&self, role: ServiceRole) -> &ServiceUnit {
        match role {
            ServiceRole::Driver => &self.driver,
            ServiceRole::DisplayServerBridge => &self.display_server_bridge,
            ServiceRole::ExternalDisplayService => &self.external_display_service,
            ServiceRole::InputRedirector => &self.input_redirector,
        }
    }

    /// Roles in teardown order: the reverse of the start chain, redirector
    /// first.
    pub fn stop_order() -> [ServiceRole; 4] {
        [
            ServiceRole::InputRedirector,
            ServiceRole::ExternalDisplayService,
            ServiceRole::DisplayServerBridge,
            ServiceRole::Driver,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_units_and_scopes() {
        let set = ServiceSet::default();
        assert_eq!(set.driver.bus, BusScope::System);
        assert_eq!(set.display_server_bridge.bus, BusScope::System);
        assert_eq!(set.external_display_service.bus, BusScope::Session);
        assert_eq!(set.input_redirector.name, "input-redirector.service");
    }

    #[test]
    fn test_unit_lookup_by_role() {
        let set = ServiceSet::default();
        assert_eq!(set.unit(ServiceRole::Driver).name, "displaylink-driver.service");
        assert_eq!(
            set.unit(ServiceRole::ExternalDisplayService).name,
            "externaldisplay.service"
        );
    }

    #[test]
    fn test_stop_order_ends_with_driver() {
        let order = ServiceSet::stop_order();
        assert_eq!(order[0], ServiceRole::InputRedirector);
        assert_eq!(order[3], ServiceRole::Driver);
    }

    #[test]
    fn test_unit_display_includes_bus() {
        let unit = ServiceUnit::new("a.service", BusScope::Session);
        assert_eq!(unit.to_string(), "a.service (session)");
    }
}
