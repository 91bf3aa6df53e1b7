//! Wizard file
//!
//! A TOML file holding everything the operator would enter in the wizard:
//! deployer endpoint, deployment settings, zones and component nodes.

use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use obd_wizard_client::DEFAULT_REQUEST_TIMEOUT_SECS;
use obd_wizard_core::services::ComponentSelection;
use obd_wizard_core::types::{
    ComponentKind, Components, DeploymentConfig, ObConfigServerConfig, ObagentConfig,
    ObproxyConfig, OceanbaseConfig, OcpExpressConfig, DEFAULT_SSH_PORT,
};
use serde::Deserialize;

/// Wizard file contents
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WizardFile {
    pub server: ServerConfig,
    pub deployment: DeploymentSection,
    pub zones: Vec<ZoneSection>,
    pub obproxy: Option<NodeSection>,
    pub obagent: Option<NodeSection>,
    pub ocpexpress: Option<NodeSection>,
    pub obconfigserver: Option<NodeSection>,
}

/// Deployer service endpoint
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    pub base_url: String,
    pub timeout_secs: u64,
    pub poll_interval_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8680".to_string(),
            timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            poll_interval_ms: 1000,
        }
    }
}

impl ServerConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// Deployment settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DeploymentSection {
    pub appname: String,
    pub version: String,
    pub mysql_port: Option<u16>,
    pub rpc_port: Option<u16>,
    pub components: Vec<ComponentKind>,
    pub low_version: bool,
    /// Without the `/{appname}` suffix; derived from the user when absent
    pub home_path: Option<String>,
    pub auth: AuthSection,
}

impl Default for DeploymentSection {
    fn default() -> Self {
        Self {
            appname: "myoceanbase".to_string(),
            version: String::new(),
            mysql_port: None,
            rpc_port: None,
            components: Vec::new(),
            low_version: false,
            home_path: None,
            auth: AuthSection::default(),
        }
    }
}

/// Deploy user; an empty user is taken from the deployer service
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AuthSection {
    pub user: String,
    pub password: Option<String>,
    pub port: u16,
}

impl Default for AuthSection {
    fn default() -> Self {
        Self {
            user: String::new(),
            password: None,
            port: DEFAULT_SSH_PORT,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ZoneSection {
    pub name: String,
    pub servers: Vec<String>,
    pub rootservice: Option<String>,
}

/// Component section; ports that do not apply to a component are ignored
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NodeSection {
    pub version: String,
    pub servers: Vec<String>,
    pub listen_port: Option<u16>,
    pub prometheus_listen_port: Option<u16>,
    pub monagent_http_port: Option<u16>,
    pub mgragent_http_port: Option<u16>,
    pub port: Option<u16>,
}

impl WizardFile {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read wizard file {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("invalid wizard file {}", path.display()))
    }

    pub fn parse(text: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(text)?)
    }

    pub fn selection(&self) -> ComponentSelection {
        ComponentSelection::new(
            self.deployment.components.clone(),
            self.deployment.low_version,
        )
    }

    /// Draft the wizard starts from
    ///
    /// Carries versions and ports only; zones, node lists and the deploy user
    /// are entered through the node configuration form.
    pub fn draft(&self) -> DeploymentConfig {
        let d = &self.deployment;
        DeploymentConfig {
            auth: None,
            components: Components {
                oceanbase: OceanbaseConfig {
                    appname: d.appname.clone(),
                    version: d.version.clone(),
                    mysql_port: d.mysql_port,
                    rpc_port: d.rpc_port,
                    topology: Vec::new(),
                },
                obproxy: self.obproxy.as_ref().map(|s| ObproxyConfig {
                    version: s.version.clone(),
                    servers: Vec::new(),
                    listen_port: s.listen_port,
                    prometheus_listen_port: s.prometheus_listen_port,
                }),
                obagent: self.obagent.as_ref().map(|s| ObagentConfig {
                    version: s.version.clone(),
                    servers: Vec::new(),
                    monagent_http_port: s.monagent_http_port,
                    mgragent_http_port: s.mgragent_http_port,
                }),
                ocpexpress: self.ocpexpress.as_ref().map(|s| OcpExpressConfig {
                    version: s.version.clone(),
                    servers: Vec::new(),
                    port: s.port,
                }),
                obconfigserver: self.obconfigserver.as_ref().map(|s| ObConfigServerConfig {
                    version: s.version.clone(),
                    servers: s.servers.clone(),
                    listen_port: s.listen_port,
                }),
            },
            home_path: None,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
[server]
base_url = "http://10.0.0.100:8680"

[deployment]
appname = "demo"
version = "4.2.2.0"
mysql_port = 2881
components = ["obproxy", "obagent", "ocp-express"]

[deployment.auth]
user = "admin"
password = "secret"

[[zones]]
name = "zone1"
servers = ["10.0.0.1", "10.0.0.2"]
rootservice = "10.0.0.1"

[[zones]]
name = "zone2"
servers = ["10.0.0.3"]

[obproxy]
version = "4.2.3.0"
servers = ["10.0.0.1"]
listen_port = 2883
"#;

    #[test]
    fn parses_sample() {
        let file = WizardFile::parse(SAMPLE).unwrap();
        assert_eq!(file.server.base_url, "http://10.0.0.100:8680");
        assert_eq!(file.server.poll_interval(), Duration::from_secs(1));
        assert_eq!(file.deployment.auth.port, 22);
        assert_eq!(file.zones.len(), 2);
        assert_eq!(file.zones[0].rootservice.as_deref(), Some("10.0.0.1"));

        let selection = file.selection();
        assert!(selection.is_enabled(ComponentKind::Console));
        assert!(!selection.is_enabled(ComponentKind::ConfigServer));
    }

    #[test]
    fn draft_carries_ports_not_nodes() {
        let draft = WizardFile::parse(SAMPLE).unwrap().draft();
        let obproxy = draft.components.obproxy.as_ref().unwrap();
        assert_eq!(obproxy.listen_port, Some(2883));
        assert!(obproxy.servers.is_empty());
        assert!(draft.components.oceanbase.topology.is_empty());
        assert_eq!(draft.name(), "demo");
    }

    #[test]
    fn empty_file_uses_defaults() {
        let file = WizardFile::parse("").unwrap();
        assert_eq!(file.deployment.appname, "myoceanbase");
        assert_eq!(file.server.timeout(), Duration::from_secs(30));
        assert!(file.zones.is_empty());
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(WizardFile::parse("[server]\nbase = \"x\"\n").is_err());
    }
}
