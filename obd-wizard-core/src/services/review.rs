//! Pre-install review summary

use serde::Serialize;

use crate::types::{ComponentKind, DeploymentConfig};

/// One deployed component in the review
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentSummary {
    /// `None` for the database itself
    pub kind: Option<ComponentKind>,
    pub name: String,
    pub version: String,
    pub servers: Vec<String>,
}

/// One zone in the review
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoneSummary {
    pub name: String,
    pub servers: Vec<String>,
    pub rootservice: Option<String>,
}

/// What the operator confirms before installing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewSummary {
    pub appname: String,
    pub user: Option<String>,
    pub home_path: Option<String>,
    /// `{home_path}/oceanbase/store`
    pub data_dir: Option<String>,
    pub mysql_port: Option<u16>,
    pub rpc_port: Option<u16>,
    pub components: Vec<ComponentSummary>,
    pub zones: Vec<ZoneSummary>,
}

impl ReviewSummary {
    #[must_use]
    pub fn from_config(config: &DeploymentConfig) -> Self {
        let c = &config.components;
        let ob = &c.oceanbase;

        let zones: Vec<ZoneSummary> = ob
            .topology
            .iter()
            .map(|z| ZoneSummary {
                name: z.name.clone(),
                servers: z.servers.iter().map(|s| s.ip.clone()).collect(),
                rootservice: z.rootservice.clone(),
            })
            .collect();

        let mut components = vec![ComponentSummary {
            kind: None,
            name: "OceanBase".to_string(),
            version: ob.version.clone(),
            servers: zones.iter().flat_map(|z| z.servers.iter().cloned()).collect(),
        }];
        let optional = [
            c.obproxy
                .as_ref()
                .map(|s| (ComponentKind::Proxy, &s.version, &s.servers)),
            c.obagent
                .as_ref()
                .map(|s| (ComponentKind::Agent, &s.version, &s.servers)),
            c.ocpexpress
                .as_ref()
                .map(|s| (ComponentKind::Console, &s.version, &s.servers)),
            c.obconfigserver
                .as_ref()
                .map(|s| (ComponentKind::ConfigServer, &s.version, &s.servers)),
        ];
        components.extend(optional.into_iter().flatten().map(
            |(kind, version, servers)| ComponentSummary {
                kind: Some(kind),
                name: kind.display_name().to_string(),
                version: version.clone(),
                servers: servers.clone(),
            },
        ));

        Self {
            appname: ob.appname.clone(),
            user: config.auth.as_ref().map(|a| a.user.clone()),
            home_path: config.home_path.clone(),
            data_dir: config
                .home_path
                .as_ref()
                .map(|p| format!("{p}/oceanbase/store")),
            mysql_port: ob.mysql_port,
            rpc_port: ob.rpc_port,
            components,
            zones,
        }
    }
}
