//! Zone and diagnostic types

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Session-scoped zone identity
///
/// Independent of the display name; not stable across reloads.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ZoneId(String);

impl ZoneId {
    /// Generate a fresh identity
    #[must_use]
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ZoneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An availability zone of the cluster being configured
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Zone {
    pub id: ZoneId,
    pub name: String,
    /// Assigned server addresses, in entry order
    pub servers: Vec<String>,
    /// Coordinator (rootservice) address
    pub rootservice: Option<String>,
}

impl Zone {
    pub(crate) fn new(name: String) -> Self {
        Self {
            id: ZoneId::generate(),
            name,
            servers: Vec::new(),
            rootservice: None,
        }
    }

    /// No servers and no coordinator: deletable without confirmation
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.servers.is_empty() && self.rootservice.is_none()
    }
}

/// Pools derived from the current zone state
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DerivedPools {
    /// Every assigned address, zone order then entry order
    pub all_servers: Vec<String>,
    /// Addresses per zone
    pub zone_servers: HashMap<ZoneId, Vec<String>>,
    /// Suggested proxy node selection
    pub default_proxy_servers: Vec<String>,
    /// Suggested console node
    pub default_console_server: Option<String>,
}

/// Location of a form field a diagnostic is attached to
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "field", content = "zone", rename_all = "camelCase")]
pub enum FieldPath {
    /// The zone list as a whole
    Zones,
    ZoneName(ZoneId),
    ZoneServers(ZoneId),
    ZoneRootservice(ZoneId),
    ProxyServers,
    ConsoleServers,
    AuthUser,
    AuthPort,
    HomePath,
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Zones => write!(f, "zones"),
            Self::ZoneName(id) => write!(f, "{id}.name"),
            Self::ZoneServers(id) => write!(f, "{id}.servers"),
            Self::ZoneRootservice(id) => write!(f, "{id}.rootservice"),
            Self::ProxyServers => write!(f, "obproxy.servers"),
            Self::ConsoleServers => write!(f, "ocpexpress.servers"),
            Self::AuthUser => write!(f, "auth.user"),
            Self::AuthPort => write!(f, "auth.port"),
            Self::HomePath => write!(f, "home_path"),
        }
    }
}

/// A validation diagnostic attached to a field
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: FieldPath,
    pub error: CoreError,
}

impl FieldError {
    #[must_use]
    pub fn new(field: FieldPath, error: CoreError) -> Self {
        Self { field, error }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.error)
    }
}

/// Result of a `set_zone_servers` edit
///
/// Rejected entries never fail the edit; they are dropped and reported here.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServersEdit {
    /// Addresses the zone held before the edit and no longer holds
    pub removed: Vec<String>,
    /// Dropped entries (`InvalidAddress` / `DuplicateAddress`)
    pub rejected: Vec<CoreError>,
}

impl ServersEdit {
    /// Whether any entry was dropped as a duplicate
    #[must_use]
    pub fn has_duplicates(&self) -> bool {
        self.rejected
            .iter()
            .any(|e| matches!(e, CoreError::DuplicateAddress(_)))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn generated_ids_are_unique() {
        assert_ne!(ZoneId::generate(), ZoneId::generate());
    }

    #[test]
    fn new_zone_is_blank() {
        let mut zone = Zone::new("zone1".to_string());
        assert!(zone.is_blank());
        zone.rootservice = Some("10.0.0.1".to_string());
        assert!(!zone.is_blank());
    }

    #[test]
    fn field_path_display() {
        assert_eq!(FieldPath::ProxyServers.to_string(), "obproxy.servers");
        let id = ZoneId("abc".to_string());
        assert_eq!(FieldPath::ZoneName(id).to_string(), "abc.name");
    }

    #[test]
    fn servers_edit_reports_duplicates() {
        let edit = ServersEdit {
            removed: vec!["10.0.0.1".into(), "10.0.0.2".into()],
            rejected: vec![CoreError::DuplicateAddress("10.0.0.3".into())],
        };
        assert!(edit.has_duplicates());
    }
}
