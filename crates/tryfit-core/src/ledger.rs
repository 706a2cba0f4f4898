//! Ledger entry types for tryfit.
//!
//! Every balance or trial-counter change appends exactly one entry. Entries
//! are immutable once written and double as the idempotency record: an entry
//! carrying a given external order id may exist at most once.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{CoreError, EntryId, UserId};

/// Cost of one generation, in credits.
pub const GENERATION_COST: i64 = 1;

/// An append-only record of a balance change.
///
/// `balance_after` always equals `balance_before + amount`; the constructors
/// compute it, and [`LedgerEntry::verify`] re-checks stored entries so a
/// mismatch is caught instead of silently propagated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// Unique entry ID (ULID for time-ordering).
    pub id: EntryId,

    /// The account whose balance was affected.
    pub account_id: UserId,

    /// Signed amount. Positive = credit, negative = debit, zero only for
    /// free-trial tagging.
    pub amount: i64,

    /// Credit balance before this entry.
    pub balance_before: i64,

    /// Credit balance after this entry.
    pub balance_after: i64,

    /// Why the balance changed.
    pub reason: EntryReason,

    /// External order id for paid credits; the deduplication key.
    pub order_id: Option<String>,

    /// Human-readable description.
    pub description: String,

    /// When the entry was created.
    pub created_at: DateTime<Utc>,
}

impl LedgerEntry {
    /// Record a free-trial consumption. The credit balance is untouched; the
    /// zero-amount entry keeps the audit trail complete.
    #[must_use]
    pub fn free_trial(account_id: UserId, balance: i64) -> Self {
        Self {
            id: EntryId::generate(),
            account_id,
            amount: 0,
            balance_before: balance,
            balance_after: balance,
            reason: EntryReason::FreeTrial,
            order_id: None,
            description: "free trial generation".to_string(),
            created_at: Utc::now(),
        }
    }

    /// Record a paid generation debit of [`GENERATION_COST`].
    #[must_use]
    pub fn generation(account_id: UserId, balance_before: i64) -> Self {
        Self {
            id: EntryId::generate(),
            account_id,
            amount: -GENERATION_COST,
            balance_before,
            balance_after: balance_before - GENERATION_COST,
            reason: EntryReason::Generation,
            order_id: None,
            description: "try-on generation".to_string(),
            created_at: Utc::now(),
        }
    }

    /// Record a credit purchase tied to an external order.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidAmount`] unless `amount > 0`.
    pub fn purchase(
        account_id: UserId,
        amount: i64,
        balance_before: i64,
        order_id: String,
    ) -> Result<Self, CoreError> {
        if amount <= 0 {
            return Err(CoreError::InvalidAmount(format!(
                "purchase amount must be positive, got {amount}"
            )));
        }
        Ok(Self {
            id: EntryId::generate(),
            account_id,
            amount,
            balance_before,
            balance_after: balance_before + amount,
            reason: EntryReason::Purchase,
            order_id: Some(order_id),
            description: format!("purchase of {amount} credits"),
            created_at: Utc::now(),
        })
    }

    /// Record a manual adjustment (operator grant or correction).
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidAmount`] unless `amount > 0`.
    pub fn adjustment(
        account_id: UserId,
        amount: i64,
        balance_before: i64,
        description: String,
        order_id: Option<String>,
    ) -> Result<Self, CoreError> {
        if amount <= 0 {
            return Err(CoreError::InvalidAmount(format!(
                "adjustment amount must be positive, got {amount}"
            )));
        }
        Ok(Self {
            id: EntryId::generate(),
            account_id,
            amount,
            balance_before,
            balance_after: balance_before + amount,
            reason: EntryReason::Adjustment,
            order_id,
            description,
            created_at: Utc::now(),
        })
    }

    /// Check the arithmetic invariant and the non-negative balance rule.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::LedgerInconsistency`] when
    /// `balance_before + amount != balance_after` or either balance is
    /// negative.
    pub fn verify(&self) -> Result<(), CoreError> {
        let consistent = self.balance_before + self.amount == self.balance_after
            && self.balance_before >= 0
            && self.balance_after >= 0;
        if consistent {
            Ok(())
        } else {
            Err(CoreError::LedgerInconsistency {
                entry_id: self.id.to_string(),
                balance_before: self.balance_before,
                amount: self.amount,
                balance_after: self.balance_after,
            })
        }
    }
}

/// Why a ledger entry exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryReason {
    /// Free-trial generation (zero-amount tag entry).
    FreeTrial,

    /// Paid generation debit.
    Generation,

    /// Credits bought through the payment provider.
    Purchase,

    /// Manual operator grant or correction.
    Adjustment,
}

impl EntryReason {
    /// The wire/storage name of the reason.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::FreeTrial => "free_trial",
            Self::Generation => "generation",
            Self::Purchase => "purchase",
            Self::Adjustment => "adjustment",
        }
    }

    /// Human-readable label for history views.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::FreeTrial => "Free trial",
            Self::Generation => "Generation",
            Self::Purchase => "Credit purchase",
            Self::Adjustment => "Adjustment",
        }
    }

    /// Whether entries with this reason add credits.
    #[must_use]
    pub const fn is_credit(&self) -> bool {
        matches!(self, Self::Purchase | Self::Adjustment)
    }

    /// Whether entries with this reason remove credits.
    #[must_use]
    pub const fn is_debit(&self) -> bool {
        matches!(self, Self::Generation)
    }
}

/// How a generation debit was satisfied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DebitKind {
    /// A free-trial allowance was consumed; credits untouched.
    FreeTrial,

    /// One paid credit was consumed.
    Credit,
}
