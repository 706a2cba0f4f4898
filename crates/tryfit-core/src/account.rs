//! Account types for tryfit.
//!
//! An account tracks the paid credit balance and the free-trial counters for
//! one user. Balances change only through ledger operations, each of which
//! records a matching `LedgerEntry`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::UserId;

/// Default number of free try-on generations granted to a new account.
pub const DEFAULT_FREE_TRIAL_LIMIT: i64 = 3;

/// A credit account for a user.
///
/// Invariants, enforced by the ledger operations in the store:
/// `credits >= 0` and `free_trials_used <= free_trials_limit` at all times.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    /// The user ID (from the auth layer's `sub` claim).
    pub user_id: UserId,

    /// Current credit balance. 1 credit = one generation.
    pub credits: i64,

    /// Free-trial generations consumed so far.
    pub free_trials_used: i64,

    /// Free-trial generations this account may consume in total.
    pub free_trials_limit: i64,

    /// Contact address, if one has been attached.
    ///
    /// Accounts start anonymous; the payment reconciler may attach the
    /// buyer's address opportunistically after a paid order.
    pub email: Option<String>,

    /// When the account was created.
    pub created_at: DateTime<Utc>,

    /// When the account was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Account {
    /// Create a new anonymous account with zero credits and a fresh trial allowance.
    #[must_use]
    pub fn new(user_id: UserId, free_trials_limit: i64) -> Self {
        let now = Utc::now();
        Self {
            user_id,
            credits: 0,
            free_trials_used: 0,
            free_trials_limit,
            email: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Free-trial generations still available.
    #[must_use]
    pub fn free_trials_remaining(&self) -> i64 {
        (self.free_trials_limit - self.free_trials_used).max(0)
    }

    /// Whether a free trial can still be consumed.
    #[must_use]
    pub fn has_free_trial(&self) -> bool {
        self.free_trials_used < self.free_trials_limit
    }

    /// Whether at least one paid credit is available.
    #[must_use]
    pub fn has_credits(&self) -> bool {
        self.credits > 0
    }

    /// Whether a generation can be paid for at all (trial or credit).
    #[must_use]
    pub fn can_generate(&self) -> bool {
        self.has_free_trial() || self.has_credits()
    }
}
