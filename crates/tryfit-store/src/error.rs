//! Error types for tryfit storage.

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors that can occur in storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Database operation failed.
    #[error("database error: {0}")]
    Database(String),

    /// Serialization/deserialization failed.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Record not found.
    #[error("not found")]
    NotFound,

    /// Neither a free trial nor a paid credit is available.
    #[error(
        "no balance: credits={credits}, free_trials={free_trials_used}/{free_trials_limit}"
    )]
    NoBalance {
        /// Current credit balance.
        credits: i64,
        /// Free trials consumed.
        free_trials_used: i64,
        /// The account's free-trial allowance.
        free_trials_limit: i64,
    },

    /// The contact address is already attached to a different account.
    #[error("email already attached to another account: {email}")]
    EmailTaken {
        /// The normalized address that collided.
        email: String,
    },

    /// The operation's arguments were rejected before any write.
    #[error("invalid operation: {0}")]
    Invalid(String),

    /// A ledger entry failed its arithmetic check.
    ///
    /// Nothing is written when this fires; it indicates a bug or corrupted
    /// stored state and must be surfaced loudly, never swallowed.
    #[error("ledger integrity violation: {0}")]
    Inconsistency(String),
}
