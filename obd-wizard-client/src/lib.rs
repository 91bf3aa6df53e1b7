//! # obd-wizard-client
//!
//! Talks to the OceanBase deployer service on behalf of the deployment wizard:
//! submits the deployment configuration and follows the install task.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use obd_wizard_client::{DeployerApi, HttpDeployerClient, InstallEvent, InstallMonitor};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = HttpDeployerClient::new("http://127.0.0.1:8680", Duration::from_secs(30))?;
//!     let info = client.service_info().await?;
//!     println!("deployer runs as {}", info.user);
//!
//!     let mut handle = InstallMonitor::new(Arc::new(client), "myoceanbase").spawn();
//!     while let Some(event) = handle.next_event().await {
//!         if let InstallEvent::Finished(status) = event {
//!             println!("install finished: {status:?}");
//!         }
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Error Handling
//!
//! Every call returns [`Result<T, ClientError>`](ClientError). Transient
//! failures (`Network`, `Timeout`, HTTP 429/502-504) are retried with
//! exponential backoff; the install monitor additionally keeps polling
//! through any error until the task ends or it is cancelled.

mod client;
mod error;
mod http_client;
mod monitor;
mod traits;
mod utils;

pub use client::{DEFAULT_MAX_RETRIES, DEFAULT_REQUEST_TIMEOUT_SECS, HttpDeployerClient};
pub use error::{ClientError, Result};
pub use monitor::{
    DEFAULT_FINISH_DELAY, DEFAULT_POLL_INTERVAL, InstallEvent, InstallHandle, InstallMonitor,
    InstallOutcome, MonitorOptions,
};
pub use traits::DeployerApi;
