//! Deployer service HTTP client

use std::time::Duration;

use async_trait::async_trait;
use obd_wizard_core::types::{ApiResponse, DeploymentConfig, InstallLog, ServiceInfo, TaskInfo};
use reqwest::Client;
use serde::de::DeserializeOwned;
use url::Url;

use crate::error::{ClientError, Result};
use crate::http_client::HttpUtils;
use crate::traits::DeployerApi;
use crate::utils::log_sanitizer::sanitize_for_log;

/// 默认连接超时（秒）
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
/// 默认请求超时（秒）
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
/// Retries for a single request; the install monitor polls on top of this
pub const DEFAULT_MAX_RETRIES: u32 = 2;

const API_PREFIX: &str = "/api/v1";

/// HTTP implementation of [`DeployerApi`]
#[derive(Debug, Clone)]
pub struct HttpDeployerClient {
    client: Client,
    base_url: String,
    max_retries: u32,
}

impl HttpDeployerClient {
    /// Create a client for the service at `base_url`
    ///
    /// The URL must be absolute (`http` or `https`); a trailing slash is ignored.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let parsed = Url::parse(base_url).map_err(|e| ClientError::InvalidConfig {
            detail: format!("base URL '{base_url}': {e}"),
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ClientError::InvalidConfig {
                detail: format!("unsupported scheme '{}'", parsed.scheme()),
            });
        }

        let client = Client::builder()
            .connect_timeout(Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS))
            .timeout(timeout)
            .build()
            .map_err(|e| ClientError::InvalidConfig {
                detail: format!("failed to create HTTP client: {e}"),
            })?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            max_retries: DEFAULT_MAX_RETRIES,
        })
    }

    #[must_use]
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Copy for the install monitor
    ///
    /// Each request is sent once; the monitor retries failed polls on its
    /// own interval.
    #[must_use]
    pub fn polling(&self) -> Self {
        self.clone().with_max_retries(0)
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{API_PREFIX}{path}", self.base_url)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<Option<T>> {
        let url = self.endpoint(path);
        let (_, text) = HttpUtils::execute_request_with_retry(
            self.client.get(&url),
            "GET",
            &url,
            self.max_retries,
        )
        .await?;
        unwrap_envelope(&format!("GET {path}"), HttpUtils::parse_json(&text)?)
    }

    async fn post<B, T>(&self, path: &str, body: &B) -> Result<Option<T>>
    where
        B: serde::Serialize + Sync,
        T: DeserializeOwned,
    {
        let url = self.endpoint(path);
        let payload = serde_json::to_string(body).map_err(|e| ClientError::Serialization {
            detail: e.to_string(),
        })?;
        log::debug!("Request Body: {}", sanitize_for_log(&payload));
        let request = self
            .client
            .post(&url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(payload);
        let (_, text) =
            HttpUtils::execute_request_with_retry(request, "POST", &url, self.max_retries).await?;
        unwrap_envelope(&format!("POST {path}"), HttpUtils::parse_json(&text)?)
    }
}

fn deployment_path(name: &str) -> String {
    format!("/deployments/{}", urlencoding::encode(name))
}

/// Unwrap the `{ success, data, msg }` envelope
fn unwrap_envelope<T>(endpoint: &str, response: ApiResponse<T>) -> Result<Option<T>> {
    if response.success {
        return Ok(response.data);
    }
    let message = response
        .error_message
        .unwrap_or_else(|| "Unknown error".to_string());
    log::warn!("[{endpoint}] request refused: {message}");
    Err(ClientError::Api {
        endpoint: endpoint.to_string(),
        message,
    })
}

fn require_data<T>(endpoint: &str, data: Option<T>) -> Result<T> {
    data.ok_or_else(|| ClientError::Parse {
        detail: format!("{endpoint}: response has no data"),
    })
}

#[async_trait]
impl DeployerApi for HttpDeployerClient {
    async fn service_info(&self) -> Result<ServiceInfo> {
        let data = self.get("/info").await?;
        require_data("GET /info", data)
    }

    async fn create_deployment_config(
        &self,
        name: &str,
        config: &DeploymentConfig,
    ) -> Result<()> {
        let _: Option<serde_json::Value> = self.post(&deployment_path(name), config).await?;
        log::info!("Deployment config '{name}' created");
        Ok(())
    }

    async fn install_status(&self, name: &str) -> Result<TaskInfo> {
        let path = format!("{}/install", deployment_path(name));
        let data = self.get(&path).await?;
        require_data(&path, data)
    }

    async fn install_log(&self, name: &str, offset: u64) -> Result<InstallLog> {
        let path = format!("{}/install/log?offset={offset}", deployment_path(name));
        let data = self.get(&path).await?;
        Ok(data.unwrap_or(InstallLog {
            log: String::new(),
            offset,
        }))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_joins_prefix() {
        let client =
            HttpDeployerClient::new("http://127.0.0.1:8680/", Duration::from_secs(5)).unwrap();
        assert_eq!(client.base_url(), "http://127.0.0.1:8680");
        assert_eq!(
            client.endpoint("/info"),
            "http://127.0.0.1:8680/api/v1/info"
        );
    }

    #[test]
    fn polling_copy_disables_request_retry() {
        let client = HttpDeployerClient::new("http://127.0.0.1:8680", Duration::from_secs(5))
            .unwrap()
            .with_max_retries(4);
        assert_eq!(client.polling().max_retries, 0);
        assert_eq!(client.max_retries, 4);
    }

    #[test]
    fn rejects_bad_base_url() {
        let err = HttpDeployerClient::new("127.0.0.1:8680", Duration::from_secs(5)).unwrap_err();
        assert!(matches!(err, ClientError::InvalidConfig { .. }));

        let err = HttpDeployerClient::new("ftp://host", Duration::from_secs(5)).unwrap_err();
        assert!(matches!(err, ClientError::InvalidConfig { .. }));
    }

    #[test]
    fn deployment_name_is_encoded() {
        assert_eq!(deployment_path("my ob"), "/deployments/my%20ob");
    }

    #[test]
    fn envelope_failure_maps_to_api_error() {
        let response: ApiResponse<ServiceInfo> =
            serde_json::from_str(r#"{"success":false,"msg":"not ready"}"#).unwrap();
        let err = unwrap_envelope("GET /info", response).unwrap_err();
        assert_eq!(
            err,
            ClientError::Api {
                endpoint: "GET /info".to_string(),
                message: "not ready".to_string(),
            }
        );
    }

    #[test]
    fn envelope_success_returns_data() {
        let response: ApiResponse<ServiceInfo> =
            serde_json::from_str(r#"{"success":true,"data":{"user":"admin"}}"#).unwrap();
        let data = unwrap_envelope("GET /info", response).unwrap();
        assert_eq!(data.unwrap().user, "admin");
    }

    #[test]
    fn missing_data_is_parse_error() {
        let err = require_data::<ServiceInfo>("GET /info", None).unwrap_err();
        assert!(matches!(err, ClientError::Parse { .. }));
    }
}
