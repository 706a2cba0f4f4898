//! Error types for tryfit core.

use crate::ids::IdError;

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;

/// Errors that can occur in core type construction and validation.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// The category is not part of the closed set.
    #[error("unknown category: {value}")]
    UnknownCategory {
        /// The rejected value.
        value: String,
    },

    /// An amount failed validation (wrong sign, zero where nonzero required).
    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    /// A ledger entry's balances do not reconcile with its amount.
    ///
    /// This is fatal: it means either a bug in entry construction or
    /// corrupted stored state, and must never be silently continued past.
    #[error(
        "ledger inconsistency on entry {entry_id}: {balance_before} + {amount} != {balance_after}"
    )]
    LedgerInconsistency {
        /// The offending entry.
        entry_id: String,
        /// Balance recorded before the change.
        balance_before: i64,
        /// The signed amount.
        amount: i64,
        /// Balance recorded after the change.
        balance_after: i64,
    },

    /// Invalid identifier.
    #[error("invalid identifier: {0}")]
    InvalidId(#[from] IdError),
}
