//! Deployer service response types

use serde::{Deserialize, Serialize};

/// API 响应包装类型
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
    /// 是否成功
    pub success: bool,
    /// 响应数据
    pub data: Option<T>,
    /// 失败原因
    #[serde(default, alias = "msg", skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

/// Installation environment info
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceInfo {
    /// User the deployer service runs as
    #[serde(default)]
    pub user: String,
}

/// Install task status
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InstallStatus {
    Running,
    Successful,
    Failed,
    /// Any status string this client does not know
    #[serde(untagged)]
    Other(String),
}

impl InstallStatus {
    /// Anything but `RUNNING` ends polling
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Running)
    }
}

/// Install task progress
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskInfo {
    pub status: InstallStatus,
    #[serde(default)]
    pub finished: u32,
    #[serde(default)]
    pub total: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub msg: Option<String>,
    #[serde(default)]
    pub info: Vec<TaskStep>,
}

/// One step of the install task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskStep {
    #[serde(default)]
    pub component: String,
    pub status: InstallStatus,
    #[serde(default)]
    pub result: String,
}

/// Install log chunk
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallLog {
    #[serde(default)]
    pub log: String,
    #[serde(default)]
    pub offset: u64,
}
