//! 类型定义模块

mod deployment;
mod response;
mod topology;

pub use deployment::{
    Auth, ComponentKind, Components, DeploymentConfig, ObConfigServerConfig, ObagentConfig,
    ObproxyConfig, OceanbaseConfig, OcpExpressConfig, ServerEntry, ZoneConfig, DEFAULT_SSH_PORT,
};
pub use response::{ApiResponse, InstallLog, InstallStatus, ServiceInfo, TaskInfo, TaskStep};
pub use topology::{DerivedPools, FieldError, FieldPath, ServersEdit, Zone, ZoneId};
