//! Dependent node field reconciliation
//!
//! Proxy and console node fields offer the global server pool as options but
//! also accept addresses typed by hand. When the pool changes, entries that
//! came from the pool and left it are pruned, hand-typed entries are kept.
//! The addresses removed by the edit that triggered the change are passed in
//! explicitly: they still look like custom entries (absent from the new
//! pool) but must be pruned.

use crate::error::CoreError;
use crate::utils::is_ipv4;

/// Reconciled field value plus the diagnostics produced on the way
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reconciled {
    pub values: Vec<String>,
    pub errors: Vec<CoreError>,
}

/// Re-derive a multi-valued dependent field against a new pool
///
/// - an empty field gets the first pool address
/// - entries in the pool are kept
/// - entries outside the pool are custom and kept, unless listed in `removed`
/// - if nothing survives, the first pool address is used; when that default is
///   not a valid address an error is emitted alongside
///
/// Entry order is preserved: custom entries are not moved ahead of pool
/// entries, so [`collapse_single`] keeps the last entry as typed. With an
/// empty pool only custom entries remain.
#[must_use]
pub fn reconcile_selection(current: &[String], pool: &[String], removed: &[String]) -> Reconciled {
    let Some(first) = pool.first() else {
        return Reconciled {
            values: current
                .iter()
                .filter(|v| !removed.contains(*v))
                .cloned()
                .collect(),
            errors: Vec::new(),
        };
    };

    if current.is_empty() {
        return Reconciled {
            values: vec![first.clone()],
            errors: Vec::new(),
        };
    }

    let values: Vec<String> = current
        .iter()
        .filter(|v| pool.contains(*v) || !removed.contains(*v))
        .cloned()
        .collect();
    if !values.is_empty() {
        return Reconciled {
            values,
            errors: Vec::new(),
        };
    }

    let mut errors = Vec::new();
    if !is_ipv4(first) {
        errors.push(CoreError::InvalidAddress(first.clone()));
    }
    Reconciled {
        values: vec![first.clone()],
        errors,
    }
}

/// Reduce a single-valued field to its most recent entry
///
/// More than one entry keeps only the last one and reports
/// `MultipleSelection` together with it.
#[must_use]
pub fn collapse_single(values: Vec<String>) -> Reconciled {
    if values.len() <= 1 {
        return Reconciled {
            values,
            errors: Vec::new(),
        };
    }
    let last = values.into_iter().last();
    Reconciled {
        values: last.into_iter().collect(),
        errors: vec![CoreError::MultipleSelection],
    }
}
