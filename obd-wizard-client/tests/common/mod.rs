//! 共享测试工具和辅助函数

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use obd_wizard_client::{ClientError, DeployerApi, Result};
use obd_wizard_core::types::{DeploymentConfig, InstallLog, InstallStatus, ServiceInfo, TaskInfo};
use tokio::sync::RwLock;
use tokio::time::Instant;

/// 断言 `Result` 为 `Ok`，并解包返回内部值（失败则直接让测试失败）。
#[macro_export]
macro_rules! require_ok {
    ($expr:expr $(,)?) => {{
        let res = $expr;
        assert!(res.is_ok(), "expected Ok(..), got {res:?}");
        let Ok(val) = res else {
            return;
        };
        val
    }};
}

pub fn task(status: InstallStatus, finished: u32, total: u32) -> TaskInfo {
    TaskInfo {
        status,
        finished,
        total,
        current: None,
        msg: None,
        info: Vec::new(),
    }
}

pub fn network_error() -> ClientError {
    ClientError::Network {
        detail: "connection refused".to_string(),
    }
}

/// Scripted deployer service
///
/// Status and log answers are consumed in order; the last one repeats.
#[derive(Default)]
pub struct MockDeployer {
    statuses: RwLock<VecDeque<Result<TaskInfo>>>,
    logs: RwLock<VecDeque<Result<InstallLog>>>,
    status_calls: RwLock<Vec<Instant>>,
    log_offsets: RwLock<Vec<u64>>,
    submitted: RwLock<Vec<(String, DeploymentConfig)>>,
}

impl MockDeployer {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub async fn push_status(&self, answer: Result<TaskInfo>) {
        self.statuses.write().await.push_back(answer);
    }

    pub async fn push_log(&self, answer: Result<InstallLog>) {
        self.logs.write().await.push_back(answer);
    }

    pub async fn status_calls(&self) -> Vec<Instant> {
        self.status_calls.read().await.clone()
    }

    pub async fn log_offsets(&self) -> Vec<u64> {
        self.log_offsets.read().await.clone()
    }

    pub async fn submitted(&self) -> Vec<(String, DeploymentConfig)> {
        self.submitted.read().await.clone()
    }
}

async fn next_answer<T: Clone>(queue: &RwLock<VecDeque<Result<T>>>, fallback: T) -> Result<T> {
    let mut queue = queue.write().await;
    if queue.len() > 1 {
        queue.pop_front().unwrap_or(Ok(fallback))
    } else {
        queue.front().cloned().unwrap_or(Ok(fallback))
    }
}

#[async_trait]
impl DeployerApi for MockDeployer {
    async fn service_info(&self) -> Result<ServiceInfo> {
        Ok(ServiceInfo {
            user: "admin".to_string(),
        })
    }

    async fn create_deployment_config(
        &self,
        name: &str,
        config: &DeploymentConfig,
    ) -> Result<()> {
        self.submitted
            .write()
            .await
            .push((name.to_string(), config.clone()));
        Ok(())
    }

    async fn install_status(&self, _name: &str) -> Result<TaskInfo> {
        self.status_calls.write().await.push(Instant::now());
        next_answer(&self.statuses, task(InstallStatus::Running, 0, 0)).await
    }

    async fn install_log(&self, _name: &str, offset: u64) -> Result<InstallLog> {
        self.log_offsets.write().await.push(offset);
        next_answer(
            &self.logs,
            InstallLog {
                log: String::new(),
                offset,
            },
        )
        .await
    }
}
