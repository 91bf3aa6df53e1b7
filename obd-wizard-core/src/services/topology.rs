//! Topology consistency engine
//!
//! Owns the ordered zone list and keeps zone names, server assignments and
//! coordinators mutually consistent under arbitrary edit order:
//! - a coordinator, if set, is one of its zone's servers
//! - zone names are unique
//! - an address is assigned to at most one zone
//! - at least one zone exists

use std::collections::{HashMap, HashSet};

use crate::error::{CoreError, CoreResult};
use crate::types::{
    DerivedPools, FieldError, FieldPath, ServerEntry, ServersEdit, Zone, ZoneConfig, ZoneId,
};
use crate::utils::{is_ipv4, is_valid_zone_name};

/// Zones created for a fresh deployment
const DEFAULT_ZONE_COUNT: u32 = 3;

/// Topology consistency engine
#[derive(Debug, Clone)]
pub struct Topology {
    zones: Vec<Zone>,
    /// Next `zone{N}` default name
    next_name_index: u32,
}

impl Default for Topology {
    fn default() -> Self {
        Self::new()
    }
}

impl Topology {
    /// Fresh topology with `zone1`..`zone3`, all empty
    #[must_use]
    pub fn new() -> Self {
        let mut topology = Self {
            zones: Vec::new(),
            next_name_index: 1,
        };
        for _ in 0..DEFAULT_ZONE_COUNT {
            topology.add_zone(None);
        }
        topology
    }

    /// Rebuild from a serialized topology, assigning fresh ids
    ///
    /// An empty list yields the default three zones.
    #[must_use]
    pub fn from_config(zones: &[ZoneConfig]) -> Self {
        if zones.is_empty() {
            return Self::new();
        }
        let zones: Vec<Zone> = zones
            .iter()
            .map(|z| Zone {
                id: ZoneId::generate(),
                name: z.name.clone(),
                servers: z.servers.iter().map(|s| s.ip.trim().to_string()).collect(),
                rootservice: z.rootservice.clone().filter(|r| !r.is_empty()),
            })
            .collect();
        let next_name_index = u32::try_from(zones.len()).unwrap_or(u32::MAX).saturating_add(1);
        Self {
            zones,
            next_name_index,
        }
    }

    /// Serialize into the payload shape
    #[must_use]
    pub fn to_config(&self) -> Vec<ZoneConfig> {
        self.zones
            .iter()
            .map(|z| ZoneConfig {
                name: z.name.clone(),
                servers: z
                    .servers
                    .iter()
                    .map(|ip| ServerEntry { ip: ip.clone() })
                    .collect(),
                rootservice: z.rootservice.clone(),
            })
            .collect()
    }

    #[must_use]
    pub fn zones(&self) -> &[Zone] {
        &self.zones
    }

    #[must_use]
    pub fn zone(&self, id: &ZoneId) -> Option<&Zone> {
        self.zones.iter().find(|z| &z.id == id)
    }

    #[must_use]
    pub fn zone_by_name(&self, name: &str) -> Option<&Zone> {
        self.zones.iter().find(|z| z.name == name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.zones.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }

    fn position(&self, id: &ZoneId) -> CoreResult<usize> {
        self.zones
            .iter()
            .position(|z| &z.id == id)
            .ok_or_else(|| CoreError::ZoneNotFound(id.to_string()))
    }

    /// Append a zone
    ///
    /// Without a name the next free `zone{N}` is used. Always succeeds; a
    /// caller-supplied name that collides is reported by [`Self::validate_all`].
    pub fn add_zone(&mut self, name: Option<String>) -> ZoneId {
        let name = name.unwrap_or_else(|| self.next_default_name());
        let zone = Zone::new(name);
        let id = zone.id.clone();
        log::debug!("Zone added: {} ({id})", zone.name);
        self.zones.push(zone);
        id
    }

    fn next_default_name(&mut self) -> String {
        loop {
            let candidate = format!("zone{}", self.next_name_index);
            self.next_name_index = self.next_name_index.saturating_add(1);
            if self.zone_by_name(&candidate).is_none() {
                return candidate;
            }
        }
    }

    /// Remove a zone that holds no servers and no coordinator
    ///
    /// Returns `ConfirmationRequired` otherwise; use
    /// [`Self::remove_zone_confirmed`] once the user has confirmed.
    pub fn remove_zone(&mut self, id: &ZoneId) -> CoreResult<Zone> {
        let index = self.position(id)?;
        if self.zones.len() == 1 {
            return Err(CoreError::LastZoneGuard);
        }
        let zone = &self.zones[index];
        if !zone.is_blank() {
            return Err(CoreError::ConfirmationRequired(zone.name.clone()));
        }
        Ok(self.zones.remove(index))
    }

    /// Remove a zone after explicit confirmation
    pub fn remove_zone_confirmed(&mut self, id: &ZoneId) -> CoreResult<Zone> {
        let index = self.position(id)?;
        if self.zones.len() == 1 {
            return Err(CoreError::LastZoneGuard);
        }
        let zone = self.zones.remove(index);
        log::debug!(
            "Zone removed: {} ({} servers released)",
            zone.name,
            zone.servers.len()
        );
        Ok(zone)
    }

    /// Rename a zone in place
    pub fn set_zone_name(&mut self, id: &ZoneId, name: &str) -> CoreResult<()> {
        let index = self.position(id)?;
        if !is_valid_zone_name(name) {
            return Err(CoreError::InvalidFormat(name.to_string()));
        }
        if self.zones.iter().any(|z| &z.id != id && z.name == name) {
            return Err(CoreError::DuplicateName(name.to_string()));
        }
        self.zones[index].name = name.to_string();
        Ok(())
    }

    /// Replace a zone's server list
    ///
    /// Entries are trimmed. Malformed entries and addresses already held by
    /// another zone (or repeated within `addresses`) are dropped and reported
    /// in [`ServersEdit::rejected`]; the rest is stored. An address removed
    /// from this zone may be re-added in the same edit.
    ///
    /// Afterwards the coordinator is cleared if it is no longer a member, and
    /// auto-assigned when exactly one address remains.
    pub fn set_zone_servers<S: AsRef<str>>(
        &mut self,
        id: &ZoneId,
        addresses: &[S],
    ) -> CoreResult<ServersEdit> {
        let index = self.position(id)?;
        let occupied: HashSet<&str> = self
            .zones
            .iter()
            .filter(|z| &z.id != id)
            .flat_map(|z| z.servers.iter().map(String::as_str))
            .collect();

        let mut accepted: Vec<String> = Vec::with_capacity(addresses.len());
        let mut rejected = Vec::new();
        for raw in addresses {
            let address = raw.as_ref().trim();
            if !is_ipv4(address) {
                rejected.push(CoreError::InvalidAddress(address.to_string()));
            } else if occupied.contains(address) || accepted.iter().any(|a| a == address) {
                log::warn!("Duplicate node dropped: {address}");
                rejected.push(CoreError::DuplicateAddress(address.to_string()));
            } else {
                accepted.push(address.to_string());
            }
        }

        let zone = &mut self.zones[index];
        let removed: Vec<String> = zone
            .servers
            .iter()
            .filter(|s| !accepted.contains(*s))
            .cloned()
            .collect();

        if zone
            .rootservice
            .as_ref()
            .is_some_and(|r| !accepted.contains(r))
        {
            zone.rootservice = None;
        }
        if zone.rootservice.is_none() && accepted.len() == 1 {
            zone.rootservice = Some(accepted[0].clone());
        }
        zone.servers = accepted;

        Ok(ServersEdit { removed, rejected })
    }

    /// Designate a zone's coordinator
    ///
    /// A syntactically invalid address is refused. An address outside the
    /// zone's server list is still stored so it can be corrected, and
    /// `NotInZone` is returned; [`Self::validate_all`] keeps reporting it.
    pub fn set_zone_coordinator(&mut self, id: &ZoneId, address: &str) -> CoreResult<()> {
        let index = self.position(id)?;
        let address = address.trim();
        if !is_ipv4(address) {
            return Err(CoreError::InvalidAddress(address.to_string()));
        }
        let zone = &mut self.zones[index];
        zone.rootservice = Some(address.to_string());
        if zone.servers.iter().any(|s| s == address) {
            Ok(())
        } else {
            Err(CoreError::NotInZone(address.to_string()))
        }
    }

    /// Clear a zone's coordinator
    pub fn clear_zone_coordinator(&mut self, id: &ZoneId) -> CoreResult<()> {
        let index = self.position(id)?;
        self.zones[index].rootservice = None;
        Ok(())
    }

    /// Every assigned address, zone order then entry order
    #[must_use]
    pub fn all_servers(&self) -> Vec<String> {
        self.zones
            .iter()
            .flat_map(|z| z.servers.iter().cloned())
            .collect()
    }

    /// Pools offered to dependent fields
    #[must_use]
    pub fn recompute_derived_fields(&self) -> DerivedPools {
        let all_servers = self.all_servers();
        let zone_servers: HashMap<ZoneId, Vec<String>> = self
            .zones
            .iter()
            .map(|z| (z.id.clone(), z.servers.clone()))
            .collect();
        let first = all_servers.first().cloned();
        DerivedPools {
            default_proxy_servers: first.iter().cloned().collect(),
            default_console_server: first,
            all_servers,
            zone_servers,
        }
    }

    /// Re-check every zone invariant
    ///
    /// Diagnostics come in zone order; within a zone: name, servers, coordinator.
    #[must_use]
    pub fn validate_all(&self) -> Vec<FieldError> {
        let mut errors = Vec::new();
        if self.zones.is_empty() {
            errors.push(FieldError::new(FieldPath::Zones, CoreError::LastZoneGuard));
            return errors;
        }

        let mut seen_servers: HashSet<&str> = HashSet::new();
        for zone in &self.zones {
            let name_field = FieldPath::ZoneName(zone.id.clone());
            if zone.name.is_empty() {
                errors.push(FieldError::new(name_field, CoreError::Required));
            } else if !is_valid_zone_name(&zone.name) {
                errors.push(FieldError::new(
                    name_field,
                    CoreError::InvalidFormat(zone.name.clone()),
                ));
            } else if self
                .zones
                .iter()
                .any(|other| other.id != zone.id && other.name == zone.name)
            {
                errors.push(FieldError::new(
                    name_field,
                    CoreError::DuplicateName(zone.name.clone()),
                ));
            }

            let servers_field = FieldPath::ZoneServers(zone.id.clone());
            if zone.servers.is_empty() {
                errors.push(FieldError::new(servers_field.clone(), CoreError::Required));
            }
            for server in &zone.servers {
                if !is_ipv4(server) {
                    errors.push(FieldError::new(
                        servers_field.clone(),
                        CoreError::InvalidAddress(server.clone()),
                    ));
                } else if !seen_servers.insert(server.as_str()) {
                    errors.push(FieldError::new(
                        servers_field.clone(),
                        CoreError::DuplicateAddress(server.clone()),
                    ));
                }
            }

            let root_field = FieldPath::ZoneRootservice(zone.id.clone());
            match &zone.rootservice {
                None if !zone.servers.is_empty() => {
                    errors.push(FieldError::new(root_field, CoreError::Required));
                }
                None => {}
                Some(root) if !is_ipv4(root) => {
                    errors.push(FieldError::new(
                        root_field,
                        CoreError::InvalidAddress(root.clone()),
                    ));
                }
                Some(root) if !zone.servers.contains(root) => {
                    errors.push(FieldError::new(root_field, CoreError::NotInZone(root.clone())));
                }
                Some(_) => {}
            }
        }
        errors
    }
}
