//! OceanBase Deploy Wizard Core Library
//!
//! Platform-independent state behind the deployment wizard:
//! - Topology engine (zones, servers, RootServer per zone)
//! - Dependent node fields (OBProxy / OCP Express) kept in sync with the server pool
//! - Node configuration form and wizard step model
//! - Deployment payload and deployer response types
//!
//! Nothing here performs I/O; the HTTP client lives in `obd-wizard-client`.

pub mod error;
pub mod services;
pub mod types;
pub mod utils;

// Re-export common types
pub use error::{CoreError, CoreResult};
pub use services::{NodeConfigForm, Topology, Wizard, WizardStep};
