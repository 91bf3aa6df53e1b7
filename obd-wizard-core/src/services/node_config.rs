//! Node configuration step
//!
//! Wraps the [`Topology`] engine together with the fields that depend on it
//! (proxy and console nodes) and the deploy user settings. Every edit that
//! changes the server pool re-derives the dependent fields.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::types::{
    Auth, ComponentKind, DeploymentConfig, FieldError, FieldPath, ObagentConfig, ObproxyConfig,
    OcpExpressConfig, ServiceInfo, ZoneId,
};
use crate::utils::{default_home_path, is_ipv4, is_valid_home_path, is_valid_user};

use super::reconcile::{collapse_single, reconcile_selection, Reconciled};
use super::topology::Topology;

/// Which optional components are part of the deployment
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentSelection {
    #[serde(default)]
    pub selected: Vec<ComponentKind>,
    /// Database version predates the management console
    #[serde(default)]
    pub low_version: bool,
}

impl ComponentSelection {
    #[must_use]
    pub fn new(selected: Vec<ComponentKind>, low_version: bool) -> Self {
        Self {
            selected,
            low_version,
        }
    }

    /// Whether a component is deployed
    #[must_use]
    pub fn is_enabled(&self, kind: ComponentKind) -> bool {
        if kind == ComponentKind::Console && self.low_version {
            return false;
        }
        self.selected.contains(&kind)
    }
}

/// Node configuration form state
#[derive(Debug, Clone)]
pub struct NodeConfigForm {
    topology: Topology,
    selection: ComponentSelection,
    appname: String,
    proxy_servers: Vec<String>,
    console_servers: Vec<String>,
    auth: Auth,
    /// Without the `/{appname}` suffix
    home_path: Option<String>,
}

impl NodeConfigForm {
    /// Build the form from the current draft
    ///
    /// The stored home path has its `/{appname}` suffix stripped; dependent
    /// fields are reconciled once against the loaded pool.
    #[must_use]
    pub fn from_config(config: &DeploymentConfig, selection: ComponentSelection) -> Self {
        let components = &config.components;
        let appname = components.oceanbase.appname.clone();
        let suffix = format!("/{appname}");
        let home_path = config
            .home_path
            .as_deref()
            .map(|p| p.strip_suffix(suffix.as_str()).unwrap_or(p).to_string())
            .filter(|p| !p.is_empty());

        let mut form = Self {
            topology: Topology::from_config(&components.oceanbase.topology),
            selection,
            appname,
            proxy_servers: components
                .obproxy
                .as_ref()
                .map(|c| c.servers.clone())
                .unwrap_or_default(),
            console_servers: components
                .ocpexpress
                .as_ref()
                .and_then(|c| c.servers.first().cloned())
                .into_iter()
                .collect(),
            auth: config.auth.clone().unwrap_or_default(),
            home_path,
        };
        form.reconcile_dependents(&[]);
        form
    }

    #[must_use]
    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    #[must_use]
    pub fn selection(&self) -> &ComponentSelection {
        &self.selection
    }

    #[must_use]
    pub fn proxy_servers(&self) -> &[String] {
        &self.proxy_servers
    }

    #[must_use]
    pub fn console_servers(&self) -> &[String] {
        &self.console_servers
    }

    #[must_use]
    pub fn auth(&self) -> &Auth {
        &self.auth
    }

    #[must_use]
    pub fn home_path(&self) -> Option<&str> {
        self.home_path.as_deref()
    }

    pub fn add_zone(&mut self, name: Option<String>) -> ZoneId {
        self.topology.add_zone(name)
    }

    /// Remove a blank zone
    pub fn remove_zone(&mut self, id: &ZoneId) -> CoreResult<Vec<FieldError>> {
        let zone = self.topology.remove_zone(id)?;
        Ok(self.reconcile_dependents(&zone.servers))
    }

    /// Remove a zone after the user confirmed
    pub fn remove_zone_confirmed(&mut self, id: &ZoneId) -> CoreResult<Vec<FieldError>> {
        let zone = self.topology.remove_zone_confirmed(id)?;
        Ok(self.reconcile_dependents(&zone.servers))
    }

    pub fn set_zone_name(&mut self, id: &ZoneId, name: &str) -> CoreResult<()> {
        self.topology.set_zone_name(id, name)
    }

    /// Replace a zone's servers and re-derive dependent fields
    ///
    /// Returns the dropped entries and any dependent-field diagnostics.
    pub fn set_zone_servers<S: AsRef<str>>(
        &mut self,
        id: &ZoneId,
        addresses: &[S],
    ) -> CoreResult<Vec<FieldError>> {
        let edit = self.topology.set_zone_servers(id, addresses)?;
        let mut diagnostics: Vec<FieldError> = edit
            .rejected
            .into_iter()
            .map(|e| FieldError::new(FieldPath::ZoneServers(id.clone()), e))
            .collect();
        diagnostics.extend(self.reconcile_dependents(&edit.removed));
        Ok(diagnostics)
    }

    pub fn set_zone_coordinator(&mut self, id: &ZoneId, address: &str) -> CoreResult<()> {
        self.topology.set_zone_coordinator(id, address)
    }

    /// Set the proxy nodes; entries are trimmed and de-duplicated
    pub fn set_proxy_servers<S: AsRef<str>>(&mut self, values: &[S]) -> Vec<FieldError> {
        self.proxy_servers = normalize(values);
        self.proxy_servers
            .iter()
            .filter(|v| !is_ipv4(v))
            .map(|v| {
                FieldError::new(
                    FieldPath::ProxyServers,
                    CoreError::InvalidAddress(v.clone()),
                )
            })
            .collect()
    }

    /// Set the console node; only the last entry is kept
    pub fn set_console_servers<S: AsRef<str>>(&mut self, values: &[S]) -> Vec<FieldError> {
        let Reconciled { values, errors } = collapse_single(normalize(values));
        self.console_servers = values;
        let mut diagnostics: Vec<FieldError> = errors
            .into_iter()
            .map(|e| FieldError::new(FieldPath::ConsoleServers, e))
            .collect();
        diagnostics.extend(
            self.console_servers
                .iter()
                .filter(|v| !is_ipv4(v))
                .map(|v| {
                    FieldError::new(
                        FieldPath::ConsoleServers,
                        CoreError::InvalidAddress(v.clone()),
                    )
                }),
        );
        diagnostics
    }

    /// Set the deploy user; the home path follows it
    pub fn set_user(&mut self, user: &str) {
        user.trim().clone_into(&mut self.auth.user);
        if !self.auth.user.is_empty() {
            self.home_path = Some(default_home_path(&self.auth.user));
        }
    }

    pub fn set_password(&mut self, password: Option<String>) {
        self.auth.password = password.filter(|p| !p.is_empty());
    }

    pub fn set_port(&mut self, port: u16) {
        self.auth.port = port;
    }

    pub fn set_home_path(&mut self, home_path: &str) {
        let trimmed = home_path.trim();
        self.home_path = (!trimmed.is_empty()).then(|| trimmed.to_string());
    }

    /// Pre-fill the deploy user from the deployer's environment info
    ///
    /// Only applies when no user was entered yet.
    pub fn apply_service_info(&mut self, info: &ServiceInfo) {
        if self.auth.user.is_empty() && !info.user.is_empty() {
            self.set_user(&info.user);
        }
    }

    /// Pre-advance gate: every diagnostic of the step
    #[must_use]
    pub fn validate(&self) -> Vec<FieldError> {
        let mut errors = self.topology.validate_all();

        if self.selection.is_enabled(ComponentKind::Console) {
            let field = FieldPath::ConsoleServers;
            if self.console_servers.is_empty() {
                errors.push(FieldError::new(field.clone(), CoreError::Required));
            } else if self.console_servers.len() > 1 {
                errors.push(FieldError::new(field.clone(), CoreError::MultipleSelection));
            }
            errors.extend(invalid_addresses(&self.console_servers, &field));
        }

        if self.selection.is_enabled(ComponentKind::Proxy) {
            let field = FieldPath::ProxyServers;
            if self.proxy_servers.is_empty() {
                errors.push(FieldError::new(field.clone(), CoreError::Required));
            }
            errors.extend(invalid_addresses(&self.proxy_servers, &field));
        }

        if self.auth.user.is_empty() {
            errors.push(FieldError::new(FieldPath::AuthUser, CoreError::Required));
        } else if !is_valid_user(&self.auth.user) {
            errors.push(FieldError::new(
                FieldPath::AuthUser,
                CoreError::ValidationError(
                    "only letters, digits and dots, at most 20 characters".to_string(),
                ),
            ));
        }

        if self.auth.port == 0 {
            errors.push(FieldError::new(FieldPath::AuthPort, CoreError::Required));
        }

        match self.home_path.as_deref() {
            None => errors.push(FieldError::new(FieldPath::HomePath, CoreError::Required)),
            Some(path) if !is_valid_home_path(path) => errors.push(FieldError::new(
                FieldPath::HomePath,
                CoreError::ValidationError(format!("{path} is not an absolute path")),
            )),
            Some(_) => {}
        }

        errors
    }

    /// Serialize the form into the deployment draft
    ///
    /// Sections of deselected components are dropped; settings this step does
    /// not own (versions, ports) are carried over.
    pub fn write_into(&self, config: &mut DeploymentConfig) {
        let components = &mut config.components;
        components.oceanbase.topology = self.topology.to_config();

        components.obproxy = self
            .selection
            .is_enabled(ComponentKind::Proxy)
            .then(|| ObproxyConfig {
                servers: self.proxy_servers.clone(),
                ..components.obproxy.take().unwrap_or_default()
            });
        components.ocpexpress = self
            .selection
            .is_enabled(ComponentKind::Console)
            .then(|| OcpExpressConfig {
                servers: self.console_servers.clone(),
                ..components.ocpexpress.take().unwrap_or_default()
            });
        components.obagent = self
            .selection
            .is_enabled(ComponentKind::Agent)
            .then(|| ObagentConfig {
                servers: self.topology.all_servers(),
                ..components.obagent.take().unwrap_or_default()
            });
        if !self.selection.is_enabled(ComponentKind::ConfigServer) {
            components.obconfigserver = None;
        }

        config.auth = Some(self.auth.clone());
        config.home_path = self
            .home_path
            .as_ref()
            .map(|p| format!("{p}/{}", self.appname));
    }

    fn reconcile_dependents(&mut self, removed: &[String]) -> Vec<FieldError> {
        let pool = self.topology.all_servers();
        let mut diagnostics = Vec::new();

        let proxy = reconcile_selection(&self.proxy_servers, &pool, removed);
        self.proxy_servers = proxy.values;
        diagnostics.extend(
            proxy
                .errors
                .into_iter()
                .map(|e| FieldError::new(FieldPath::ProxyServers, e)),
        );

        let console = reconcile_selection(&self.console_servers, &pool, removed);
        let collapsed = collapse_single(console.values);
        self.console_servers = collapsed.values;
        diagnostics.extend(
            console
                .errors
                .into_iter()
                .chain(collapsed.errors)
                .map(|e| FieldError::new(FieldPath::ConsoleServers, e)),
        );

        diagnostics
    }
}

fn normalize<S: AsRef<str>>(values: &[S]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(values.len());
    for value in values {
        let value = value.as_ref().trim();
        if !value.is_empty() && !out.iter().any(|v| v == value) {
            out.push(value.to_string());
        }
    }
    out
}

fn invalid_addresses<'a>(
    values: &'a [String],
    field: &'a FieldPath,
) -> impl Iterator<Item = FieldError> + 'a {
    values
        .iter()
        .filter(|v| !is_ipv4(v))
        .map(move |v| FieldError::new(field.clone(), CoreError::InvalidAddress(v.clone())))
}
