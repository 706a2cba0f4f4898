//! `RocksDB` storage layer for tryfit.
//!
//! This crate provides persistent storage for accounts, ledger entries, and
//! generation records using `RocksDB` with column families for indexing.
//!
//! # Architecture
//!
//! The storage uses the following column families:
//!
//! - `accounts`: Primary account records, keyed by `user_id`
//! - `ledger`: Ledger entries, keyed by `entry_id` (ULID)
//! - `ledger_by_user`: Index for listing a user's entries in time order
//! - `orders`: Index from external order id to `entry_id`, enforcing
//!   at-most-once credit application per order
//! - `generations` / `generations_by_user`: Generation history and its index
//! - `emails`: Index from attached contact address to `user_id`
//!
//! # Balance mutation
//!
//! Balances change only through [`Store::debit_generation`] and
//! [`Store::credit_account`]. Both run under a per-account lock (so a
//! concurrent debit/credit pair on one account cannot interleave) and commit
//! the account update together with its ledger entry in a single `WriteBatch`.
//!
//! # Example
//!
//! ```no_run
//! use tryfit_store::{RocksStore, Store};
//! use tryfit_core::{Account, UserId, DEFAULT_FREE_TRIAL_LIMIT};
//!
//! let store = RocksStore::open("/tmp/tryfit-db").unwrap();
//!
//! let user_id = UserId::generate();
//! let account = Account::new(user_id, DEFAULT_FREE_TRIAL_LIMIT);
//! let account = store.create_account_if_absent(&account).unwrap();
//!
//! // Consume the first free trial
//! let receipt = store.debit_generation(&user_id).unwrap();
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod keys;
mod locks;
pub mod rocks;
pub mod schema;

pub use error::{Result, StoreError};
pub use rocks::RocksStore;

use tryfit_core::{
    Account, DebitKind, EntryId, EntryReason, GenerationRecord, LedgerEntry, UserId,
};

/// Outcome of a successful generation debit.
#[derive(Debug, Clone)]
pub struct DebitReceipt {
    /// Whether a free trial or a paid credit was consumed.
    pub kind: DebitKind,

    /// The ledger entry that was appended.
    pub entry: LedgerEntry,

    /// Credit balance after the debit.
    pub credits: i64,

    /// Free trials consumed after the debit.
    pub free_trials_used: i64,

    /// The account's free-trial allowance.
    pub free_trials_limit: i64,
}

/// Outcome of a credit application.
#[derive(Debug, Clone)]
pub struct CreditReceipt {
    /// The ledger entry recording the credit (pre-existing when `duplicate`).
    pub entry_id: EntryId,

    /// The balance resulting from the credit.
    pub new_balance: i64,

    /// True when the order id had already been applied and no state changed.
    pub duplicate: bool,
}

/// The storage trait defining all database operations.
///
/// This trait abstracts the storage layer, allowing for different
/// implementations (e.g., `RocksDB`, in-memory for testing).
pub trait Store: Send + Sync {
    // =========================================================================
    // Account Operations
    // =========================================================================

    /// Insert or update an account record.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn put_account(&self, account: &Account) -> Result<()>;

    /// Get an account by user ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_account(&self, user_id: &UserId) -> Result<Option<Account>>;

    /// Insert the account unless one already exists; returns the stored row.
    ///
    /// Runs under the per-account lock so two concurrent creates (say, a
    /// first request racing a payment webhook) cannot clobber each other.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn create_account_if_absent(&self, account: &Account) -> Result<Account>;

    /// Attach a contact address to an account, enforcing global uniqueness.
    ///
    /// Attaching the address the account already holds is a no-op.
    ///
    /// # Errors
    ///
    /// - `StoreError::NotFound` if the account doesn't exist.
    /// - `StoreError::EmailTaken` if another account holds the address.
    fn attach_email(&self, user_id: &UserId, email: &str) -> Result<()>;

    // =========================================================================
    // Ledger Operations
    // =========================================================================

    /// Get a ledger entry by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_entry(&self, entry_id: &EntryId) -> Result<Option<LedgerEntry>>;

    /// Look up the ledger entry recorded for an external order id, if any.
    ///
    /// This is the deduplication probe for webhook redeliveries.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn find_entry_by_order(&self, order_id: &str) -> Result<Option<LedgerEntry>>;

    /// List ledger entries for a user, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn list_entries(
        &self,
        user_id: &UserId,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<LedgerEntry>>;

    // =========================================================================
    // Generation History
    // =========================================================================

    /// Append a generation record and its user index entry.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn put_generation(&self, record: &GenerationRecord) -> Result<()>;

    /// List generation records for a user, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn list_generations(
        &self,
        user_id: &UserId,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<GenerationRecord>>;

    // =========================================================================
    // Compound Operations
    // =========================================================================

    /// Debit one generation: free trial first, then one paid credit.
    ///
    /// Serialized per account; the account update and the ledger entry commit
    /// in one atomic batch.
    ///
    /// # Errors
    ///
    /// - `StoreError::NotFound` if the account doesn't exist.
    /// - `StoreError::NoBalance` if neither a trial nor a credit is available.
    fn debit_generation(&self, user_id: &UserId) -> Result<DebitReceipt>;

    /// Credit an account, idempotent on `order_id` when one is given.
    ///
    /// A replayed order returns the previously recorded resulting balance
    /// with `duplicate = true` and mutates nothing. `reason` must be a
    /// credit-bearing reason and `amount` must be positive.
    ///
    /// # Errors
    ///
    /// - `StoreError::NotFound` if the account doesn't exist.
    /// - `StoreError::Invalid` for non-positive amounts or a debit reason.
    fn credit_account(
        &self,
        user_id: &UserId,
        amount: i64,
        order_id: Option<&str>,
        reason: EntryReason,
        description: &str,
    ) -> Result<CreditReceipt>;
}
