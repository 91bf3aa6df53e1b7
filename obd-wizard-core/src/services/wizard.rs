//! Deployment wizard step model
//!
//! The wizard owns the deployment draft. The node configuration form is
//! built when that step is entered and serialized back into the draft when it
//! is left, in either direction. Only advancing is gated on validation.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::types::{DeploymentConfig, InstallStatus};

use super::node_config::{ComponentSelection, NodeConfigForm};
use super::review::ReviewSummary;

/// Wizard step, numbered as shown to the operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum WizardStep {
    DeployConfig = 1,
    NodeConfig = 2,
    ClusterConfig = 3,
    CheckInfo = 4,
    Install = 5,
    Finished = 6,
}

impl WizardStep {
    #[must_use]
    pub fn number(self) -> u8 {
        self as u8
    }

    #[must_use]
    pub fn from_number(n: u8) -> Option<Self> {
        match n {
            1 => Some(Self::DeployConfig),
            2 => Some(Self::NodeConfig),
            3 => Some(Self::ClusterConfig),
            4 => Some(Self::CheckInfo),
            5 => Some(Self::Install),
            6 => Some(Self::Finished),
            _ => None,
        }
    }
}

impl fmt::Display for WizardStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::DeployConfig => "deploy config",
            Self::NodeConfig => "node config",
            Self::ClusterConfig => "cluster config",
            Self::CheckInfo => "check info",
            Self::Install => "install",
            Self::Finished => "finished",
        };
        write!(f, "{}. {name}", self.number())
    }
}

/// Entry of the running error list
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorEntry {
    pub message: String,
    pub at: DateTime<Utc>,
}

impl ErrorEntry {
    /// Entry stamped with the current time
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            at: Utc::now(),
        }
    }
}

/// Wizard state
#[derive(Debug, Clone)]
pub struct Wizard {
    step: WizardStep,
    config: DeploymentConfig,
    selection: ComponentSelection,
    errors: Vec<ErrorEntry>,
    node_form: Option<NodeConfigForm>,
}

impl Wizard {
    #[must_use]
    pub fn new(config: DeploymentConfig, selection: ComponentSelection) -> Self {
        Self {
            step: WizardStep::DeployConfig,
            config,
            selection,
            errors: Vec::new(),
            node_form: None,
        }
    }

    #[must_use]
    pub fn step(&self) -> WizardStep {
        self.step
    }

    #[must_use]
    pub fn config(&self) -> &DeploymentConfig {
        &self.config
    }

    #[must_use]
    pub fn selection(&self) -> &ComponentSelection {
        &self.selection
    }

    #[must_use]
    pub fn errors(&self) -> &[ErrorEntry] {
        &self.errors
    }

    /// Replace the component selection, only while on the first step
    pub fn set_selection(&mut self, selection: ComponentSelection) -> CoreResult<()> {
        if self.step != WizardStep::DeployConfig {
            return Err(CoreError::InvalidStep(format!(
                "components are chosen in step 1, current step is {}",
                self.step
            )));
        }
        self.selection = selection;
        Ok(())
    }

    /// Node form, present while on the node config step
    #[must_use]
    pub fn node_form(&self) -> Option<&NodeConfigForm> {
        self.node_form.as_ref()
    }

    pub fn node_form_mut(&mut self) -> Option<&mut NodeConfigForm> {
        self.node_form.as_mut()
    }

    /// Advance one step
    ///
    /// Leaving the node config step requires a valid form; otherwise the
    /// diagnostics are returned in [`CoreError::FormInvalid`] and the wizard
    /// stays put. The install step only advances through
    /// [`Wizard::finish_install`].
    pub fn next_step(&mut self) -> CoreResult<WizardStep> {
        let next = match self.step {
            WizardStep::Install | WizardStep::Finished => {
                return Err(CoreError::InvalidStep(format!(
                    "cannot advance from {}",
                    self.step
                )));
            }
            step => WizardStep::from_number(step.number() + 1).ok_or_else(|| {
                CoreError::InvalidStep(format!("no step after {step}"))
            })?,
        };

        if let Some(form) = &self.node_form {
            let errors = form.validate();
            if !errors.is_empty() {
                log::warn!(
                    "Node config has {} invalid field(s), staying on {}",
                    errors.len(),
                    self.step
                );
                return Err(CoreError::FormInvalid(errors));
            }
        }

        self.enter(next);
        Ok(next)
    }

    /// Go back one step without validating
    pub fn prev_step(&mut self) -> CoreResult<WizardStep> {
        let prev = match self.step {
            WizardStep::DeployConfig | WizardStep::Install | WizardStep::Finished => {
                return Err(CoreError::InvalidStep(format!(
                    "cannot go back from {}",
                    self.step
                )));
            }
            step => WizardStep::from_number(step.number() - 1).ok_or_else(|| {
                CoreError::InvalidStep(format!("no step before {step}"))
            })?,
        };
        self.enter(prev);
        Ok(prev)
    }

    /// Leave the install step once the task reached a terminal status
    pub fn finish_install(&mut self, status: &InstallStatus) -> CoreResult<WizardStep> {
        if self.step != WizardStep::Install {
            return Err(CoreError::InvalidStep(format!(
                "install is not running in {}",
                self.step
            )));
        }
        if !status.is_terminal() {
            return Err(CoreError::InvalidStep("install is running".into()));
        }
        self.enter(WizardStep::Finished);
        Ok(WizardStep::Finished)
    }

    pub fn push_error(&mut self, message: impl Into<String>) {
        self.errors.push(ErrorEntry::new(message));
    }

    pub fn clear_errors(&mut self) {
        self.errors.clear();
    }

    /// Summary of the current draft
    #[must_use]
    pub fn review(&self) -> ReviewSummary {
        ReviewSummary::from_config(&self.config)
    }

    fn enter(&mut self, step: WizardStep) {
        if let Some(form) = self.node_form.take() {
            form.write_into(&mut self.config);
        }
        if step == WizardStep::NodeConfig {
            self.node_form = Some(NodeConfigForm::from_config(
                &self.config,
                self.selection.clone(),
            ));
        }
        log::info!("Wizard step {} -> {step}", self.step);
        self.step = step;
        self.errors.clear();
    }
}
