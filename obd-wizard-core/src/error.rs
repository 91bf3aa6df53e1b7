//! Unified error type definition

use serde::Serialize;
use thiserror::Error;

use crate::types::FieldError;

/// Topology and form validation outcome
///
/// Every variant is recoverable by correcting the offending field; none of
/// them ends the editing session.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "code", content = "details")]
pub enum CoreError {
    /// Zone name does not match the naming pattern
    #[error("Invalid zone name '{0}': must start with a letter, end with a letter or digit, contain only letters, digits and underscores, and be 2-32 characters long")]
    InvalidFormat(String),

    /// Another zone already holds this name
    #[error("Zone name already occupied: {0}")]
    DuplicateName(String),

    /// Not an IPv4 dotted-quad address
    #[error("Invalid IP address: {0}")]
    InvalidAddress(String),

    /// Address is already assigned to a zone
    #[error("Duplicate node: {0} is already assigned")]
    DuplicateAddress(String),

    /// Coordinator is not one of the zone's servers
    #[error("RootServer {0} is not a server of this zone")]
    NotInZone(String),

    /// The only remaining zone cannot be removed
    #[error("Keep at least one zone")]
    LastZoneGuard,

    /// Zone still holds servers or a coordinator
    #[error("Zone {0} has node configuration, confirmation required")]
    ConfirmationRequired(String),

    /// Zone not found
    #[error("Zone not found: {0}")]
    ZoneNotFound(String),

    /// Required field left empty
    #[error("This item is required")]
    Required,

    /// Single-valued field received more than one entry
    #[error("Only one node can be selected or entered")]
    MultipleSelection,

    /// Generic field validation error
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Step cannot be left while fields are invalid
    #[error("{} field(s) need attention", .0.len())]
    FormInvalid(Vec<FieldError>),

    /// Wizard step transition not allowed
    #[error("Invalid step transition: {0}")]
    InvalidStep(String),
}

impl CoreError {
    /// Whether it is expected behavior (user input), used for log classification.
    ///
    /// Level `warn` should be used when returning `true` and level `error` when returning `false`.
    /// **Please update this method simultaneously when new variants are added. **
    #[must_use]
    pub fn is_expected(&self) -> bool {
        !matches!(self, Self::InvalidStep(_))
    }
}

/// Core layer Result type alias
pub type CoreResult<T> = std::result::Result<T, CoreError>;
