//! 业务逻辑服务层

mod node_config;
mod progress;
mod reconcile;
mod review;
mod topology;
mod wizard;

pub use node_config::{ComponentSelection, NodeConfigForm};
pub use progress::{progress_ratio, ProgressAnimator, ANIMATION_FRAMES};
pub use reconcile::{collapse_single, reconcile_selection, Reconciled};
pub use review::{ComponentSummary, ReviewSummary, ZoneSummary};
pub use topology::Topology;
pub use wizard::{ErrorEntry, Wizard, WizardStep};
