use async_trait::async_trait;
use obd_wizard_core::types::{DeploymentConfig, InstallLog, ServiceInfo, TaskInfo};

use crate::error::Result;

/// 部署服务 Trait
///
/// The deployer service does the actual provisioning; the wizard only
/// submits configuration and reads back progress.
#[async_trait]
pub trait DeployerApi: Send + Sync {
    /// 安装环境信息（部署用户等）
    async fn service_info(&self) -> Result<ServiceInfo>;

    /// 创建部署配置
    async fn create_deployment_config(&self, name: &str, config: &DeploymentConfig)
    -> Result<()>;

    /// 安装任务状态
    async fn install_status(&self, name: &str) -> Result<TaskInfo>;

    /// 安装日志，从 `offset` 开始
    async fn install_log(&self, name: &str, offset: u64) -> Result<InstallLog>;
}
