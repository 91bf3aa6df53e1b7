//! Deployment configuration payload types

use serde::{Deserialize, Serialize};

/// Default SSH port for the deploy user
pub const DEFAULT_SSH_PORT: u16 = 22;

/// Optional component that can be deployed next to the database
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ComponentKind {
    #[serde(rename = "obproxy")]
    Proxy,
    #[serde(rename = "obagent")]
    Agent,
    #[serde(rename = "ocp-express")]
    Console,
    #[serde(rename = "obconfigserver")]
    ConfigServer,
}

impl ComponentKind {
    /// Component key used by the deployer service
    #[must_use]
    pub fn key(self) -> &'static str {
        match self {
            Self::Proxy => "obproxy",
            Self::Agent => "obagent",
            Self::Console => "ocp-express",
            Self::ConfigServer => "obconfigserver",
        }
    }

    /// Human readable name
    #[must_use]
    pub fn display_name(self) -> &'static str {
        match self {
            Self::Proxy => "OBProxy",
            Self::Agent => "OBAgent",
            Self::Console => "OCP Express",
            Self::ConfigServer => "OB ConfigServer",
        }
    }
}

/// SSH credentials of the deploy user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Auth {
    pub user: String,
    /// Empty means key based login
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    pub port: u16,
}

impl Default for Auth {
    fn default() -> Self {
        Self {
            user: String::new(),
            password: None,
            port: DEFAULT_SSH_PORT,
        }
    }
}

/// Server entry of a zone in the payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerEntry {
    pub ip: String,
}

/// Serialized zone
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneConfig {
    pub name: String,
    #[serde(default)]
    pub servers: Vec<ServerEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rootservice: Option<String>,
}

/// Database component configuration
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct OceanbaseConfig {
    pub appname: String,
    #[serde(default)]
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mysql_port: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rpc_port: Option<u16>,
    #[serde(default)]
    pub topology: Vec<ZoneConfig>,
}

/// Proxy component configuration
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ObproxyConfig {
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub servers: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub listen_port: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prometheus_listen_port: Option<u16>,
}

/// Monitoring agent configuration
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ObagentConfig {
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub servers: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub monagent_http_port: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mgragent_http_port: Option<u16>,
}

/// Management console configuration
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct OcpExpressConfig {
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub servers: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
}

/// Config server configuration
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ObConfigServerConfig {
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub servers: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub listen_port: Option<u16>,
}

/// All component sections of a deployment
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Components {
    #[serde(default)]
    pub oceanbase: OceanbaseConfig,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub obproxy: Option<ObproxyConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub obagent: Option<ObagentConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ocpexpress: Option<OcpExpressConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub obconfigserver: Option<ObConfigServerConfig>,
}

/// Request payload of the "create deployment configuration" endpoint
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DeploymentConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth: Option<Auth>,
    pub components: Components,
    /// Includes the `/{appname}` suffix
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub home_path: Option<String>,
}

impl DeploymentConfig {
    /// Deployment name used to address the deployer endpoints
    #[must_use]
    pub fn name(&self) -> &str {
        &self.components.oceanbase.appname
    }
}
