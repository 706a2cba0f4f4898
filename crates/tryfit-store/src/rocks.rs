//! `RocksDB` storage implementation.
//!
//! This module provides the `RocksStore` implementation of the `Store` trait.

use std::path::Path;
use std::sync::{Arc, PoisonError};

use rocksdb::{
    BoundColumnFamily, ColumnFamilyDescriptor, DBWithThreadMode, IteratorMode, MultiThreaded,
    Options, WriteBatch,
};
use tracing::debug;

use tryfit_core::{
    Account, DebitKind, EntryId, EntryReason, GenerationRecord, LedgerEntry, UserId,
    GENERATION_COST,
};

use crate::error::{Result, StoreError};
use crate::keys;
use crate::locks::AccountLocks;
use crate::schema::{all_column_families, cf};
use crate::{CreditReceipt, DebitReceipt, Store};

/// RocksDB-backed storage implementation.
pub struct RocksStore {
    db: Arc<DBWithThreadMode<MultiThreaded>>,
    locks: AccountLocks,
}

impl RocksStore {
    /// Open or create a `RocksDB` database at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or created.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_descriptors: Vec<_> = all_column_families()
            .into_iter()
            .map(|name| ColumnFamilyDescriptor::new(name, Options::default()))
            .collect();

        let db = DBWithThreadMode::open_cf_descriptors(&opts, path, cf_descriptors)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(Self {
            db: Arc::new(db),
            locks: AccountLocks::default(),
        })
    }

    /// Get a column family handle.
    fn cf(&self, name: &str) -> Result<Arc<BoundColumnFamily<'_>>> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| StoreError::Database(format!("column family not found: {name}")))
    }

    /// Serialize a value using CBOR.
    fn serialize<T: serde::Serialize>(value: &T) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        ciborium::into_writer(value, &mut buf)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        Ok(buf)
    }

    /// Deserialize a value from CBOR.
    fn deserialize<T: serde::de::DeserializeOwned>(data: &[u8]) -> Result<T> {
        ciborium::from_reader(data).map_err(|e| StoreError::Serialization(e.to_string()))
    }

    /// Collect index keys under `prefix`, newest first, honoring pagination.
    fn page_index_keys(
        &self,
        cf_name: &str,
        prefix: &[u8],
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Vec<u8>>> {
        let cf = self.cf(cf_name)?;
        let iter = self
            .db
            .iterator_cf(&cf, IteratorMode::From(prefix, rocksdb::Direction::Forward));

        // Collect matching keys first; ULID suffixes make them time-ordered.
        let mut all_keys: Vec<Vec<u8>> = Vec::new();
        for item in iter {
            let (key, _) = item.map_err(|e| StoreError::Database(e.to_string()))?;

            if !key.starts_with(prefix) {
                break;
            }

            all_keys.push(key.to_vec());
        }

        // Reverse to get newest first.
        all_keys.reverse();

        Ok(all_keys.into_iter().skip(offset).take(limit).collect())
    }
}

impl Store for RocksStore {
    // =========================================================================
    // Account Operations
    // =========================================================================

    fn put_account(&self, account: &Account) -> Result<()> {
        let cf = self.cf(cf::ACCOUNTS)?;
        let key = keys::account_key(&account.user_id);
        let value = Self::serialize(account)?;

        self.db
            .put_cf(&cf, key, value)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(())
    }

    fn get_account(&self, user_id: &UserId) -> Result<Option<Account>> {
        let cf = self.cf(cf::ACCOUNTS)?;
        let key = keys::account_key(user_id);

        self.db
            .get_cf(&cf, key)
            .map_err(|e| StoreError::Database(e.to_string()))?
            .map(|data| Self::deserialize(&data))
            .transpose()
    }

    fn create_account_if_absent(&self, account: &Account) -> Result<Account> {
        let handle = self.locks.handle(&account.user_id);
        let _guard = handle.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(existing) = self.get_account(&account.user_id)? {
            return Ok(existing);
        }

        self.put_account(account)?;
        debug!(user_id = %account.user_id, "created account");
        Ok(account.clone())
    }

    fn attach_email(&self, user_id: &UserId, email: &str) -> Result<()> {
        let normalized = email.trim().to_lowercase();
        if normalized.is_empty() {
            return Err(StoreError::Invalid("empty email".to_string()));
        }

        let handle = self.locks.handle(user_id);
        let _guard = handle.lock().unwrap_or_else(PoisonError::into_inner);

        let mut account = self.get_account(user_id)?.ok_or(StoreError::NotFound)?;

        if account.email.as_deref() == Some(normalized.as_str()) {
            return Ok(());
        }

        let cf_emails = self.cf(cf::EMAILS)?;
        let email_key = keys::email_key(&normalized);
        let owner = self
            .db
            .get_cf(&cf_emails, &email_key)
            .map_err(|e| StoreError::Database(e.to_string()))?;
        if let Some(owner) = owner {
            if owner.as_slice() != user_id.as_bytes() {
                return Err(StoreError::EmailTaken { email: normalized });
            }
        }

        account.email = Some(normalized.clone());
        account.updated_at = chrono::Utc::now();

        let cf_accounts = self.cf(cf::ACCOUNTS)?;
        let account_key = keys::account_key(user_id);
        let account_value = Self::serialize(&account)?;

        let mut batch = WriteBatch::default();
        batch.put_cf(&cf_accounts, &account_key, &account_value);
        batch.put_cf(&cf_emails, &email_key, user_id.as_bytes());

        self.db
            .write(batch)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        debug!(user_id = %user_id, "attached contact address");
        Ok(())
    }

    // =========================================================================
    // Ledger Operations
    // =========================================================================

    fn get_entry(&self, entry_id: &EntryId) -> Result<Option<LedgerEntry>> {
        let cf = self.cf(cf::LEDGER)?;
        let key = keys::entry_key(entry_id);

        self.db
            .get_cf(&cf, key)
            .map_err(|e| StoreError::Database(e.to_string()))?
            .map(|data| Self::deserialize(&data))
            .transpose()
    }

    fn find_entry_by_order(&self, order_id: &str) -> Result<Option<LedgerEntry>> {
        let cf = self.cf(cf::ORDERS)?;
        let key = keys::order_key(order_id);

        let Some(id_bytes) = self
            .db
            .get_cf(&cf, key)
            .map_err(|e| StoreError::Database(e.to_string()))?
        else {
            return Ok(None);
        };

        let mut bytes = [0u8; 16];
        if id_bytes.len() != 16 {
            return Err(StoreError::Inconsistency(format!(
                "order index for {order_id} holds {} bytes, want 16",
                id_bytes.len()
            )));
        }
        bytes.copy_from_slice(&id_bytes);
        let entry_id =
            EntryId::from_bytes(bytes).map_err(|e| StoreError::Inconsistency(e.to_string()))?;

        // An indexed order whose entry row is missing means a broken batch
        // guarantee; refuse to treat it as "not yet credited".
        match self.get_entry(&entry_id)? {
            Some(entry) => Ok(Some(entry)),
            None => Err(StoreError::Inconsistency(format!(
                "order index for {order_id} points at missing entry {entry_id}"
            ))),
        }
    }

    fn list_entries(
        &self,
        user_id: &UserId,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<LedgerEntry>> {
        let prefix = keys::user_prefix(user_id);
        let page = self.page_index_keys(cf::LEDGER_BY_USER, &prefix, limit, offset)?;

        let mut entries = Vec::with_capacity(page.len());
        for key in page {
            let entry_id = keys::extract_entry_id_from_user_key(&key);
            if let Some(entry) = self.get_entry(&entry_id)? {
                entries.push(entry);
            }
        }

        Ok(entries)
    }

    // =========================================================================
    // Generation History
    // =========================================================================

    fn put_generation(&self, record: &GenerationRecord) -> Result<()> {
        let cf_gen = self.cf(cf::GENERATIONS)?;
        let cf_by_user = self.cf(cf::GENERATIONS_BY_USER)?;

        let gen_key = keys::generation_key(&record.id);
        let user_gen_key = keys::user_generation_key(&record.account_id, &record.id);
        let value = Self::serialize(record)?;

        let mut batch = WriteBatch::default();
        batch.put_cf(&cf_gen, &gen_key, &value);
        batch.put_cf(&cf_by_user, &user_gen_key, []); // Index entry (empty value)

        self.db
            .write(batch)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(())
    }

    fn list_generations(
        &self,
        user_id: &UserId,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<GenerationRecord>> {
        let cf_gen = self.cf(cf::GENERATIONS)?;
        let prefix = keys::user_prefix(user_id);
        let page = self.page_index_keys(cf::GENERATIONS_BY_USER, &prefix, limit, offset)?;

        let mut records = Vec::with_capacity(page.len());
        for key in page {
            let generation_id = keys::extract_generation_id_from_user_key(&key);
            let gen_key = keys::generation_key(&generation_id);
            if let Some(data) = self
                .db
                .get_cf(&cf_gen, gen_key)
                .map_err(|e| StoreError::Database(e.to_string()))?
            {
                records.push(Self::deserialize(&data)?);
            }
        }

        Ok(records)
    }

    // =========================================================================
    // Compound Operations
    // =========================================================================

    fn debit_generation(&self, user_id: &UserId) -> Result<DebitReceipt> {
        let handle = self.locks.handle(user_id);
        let _guard = handle.lock().unwrap_or_else(PoisonError::into_inner);

        let mut account = self.get_account(user_id)?.ok_or(StoreError::NotFound)?;

        let (kind, entry) = if account.has_free_trial() {
            account.free_trials_used += 1;
            (
                DebitKind::FreeTrial,
                LedgerEntry::free_trial(account.user_id, account.credits),
            )
        } else if account.has_credits() {
            let entry = LedgerEntry::generation(account.user_id, account.credits);
            account.credits -= GENERATION_COST;
            (DebitKind::Credit, entry)
        } else {
            return Err(StoreError::NoBalance {
                credits: account.credits,
                free_trials_used: account.free_trials_used,
                free_trials_limit: account.free_trials_limit,
            });
        };

        entry
            .verify()
            .map_err(|e| StoreError::Inconsistency(e.to_string()))?;
        account.updated_at = chrono::Utc::now();

        let cf_accounts = self.cf(cf::ACCOUNTS)?;
        let cf_ledger = self.cf(cf::LEDGER)?;
        let cf_by_user = self.cf(cf::LEDGER_BY_USER)?;

        let account_key = keys::account_key(user_id);
        let entry_key = keys::entry_key(&entry.id);
        let user_entry_key = keys::user_entry_key(user_id, &entry.id);

        let account_value = Self::serialize(&account)?;
        let entry_value = Self::serialize(&entry)?;

        // Write atomically
        let mut batch = WriteBatch::default();
        batch.put_cf(&cf_accounts, &account_key, &account_value);
        batch.put_cf(&cf_ledger, &entry_key, &entry_value);
        batch.put_cf(&cf_by_user, &user_entry_key, []);

        self.db
            .write(batch)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        debug!(
            user_id = %user_id,
            kind = ?kind,
            credits = account.credits,
            "debited generation"
        );

        Ok(DebitReceipt {
            kind,
            entry,
            credits: account.credits,
            free_trials_used: account.free_trials_used,
            free_trials_limit: account.free_trials_limit,
        })
    }

    fn credit_account(
        &self,
        user_id: &UserId,
        amount: i64,
        order_id: Option<&str>,
        reason: EntryReason,
        description: &str,
    ) -> Result<CreditReceipt> {
        if amount <= 0 {
            return Err(StoreError::Invalid(format!(
                "credit amount must be positive, got {amount}"
            )));
        }

        let handle = self.locks.handle(user_id);
        let _guard = handle.lock().unwrap_or_else(PoisonError::into_inner);

        // Idempotent replay: an order already in the index was fully applied
        // (index and entry commit in one batch), so report its outcome.
        if let Some(order_id) = order_id {
            if let Some(existing) = self.find_entry_by_order(order_id)? {
                debug!(user_id = %user_id, order_id, "order already credited");
                return Ok(CreditReceipt {
                    entry_id: existing.id,
                    new_balance: existing.balance_after,
                    duplicate: true,
                });
            }
        }

        let mut account = self.get_account(user_id)?.ok_or(StoreError::NotFound)?;

        let entry = match reason {
            EntryReason::Purchase => {
                let order = order_id.ok_or_else(|| {
                    StoreError::Invalid("purchase credit requires an order id".to_string())
                })?;
                LedgerEntry::purchase(account.user_id, amount, account.credits, order.to_string())
                    .map_err(|e| StoreError::Invalid(e.to_string()))?
            }
            EntryReason::Adjustment => LedgerEntry::adjustment(
                account.user_id,
                amount,
                account.credits,
                description.to_string(),
                order_id.map(str::to_string),
            )
            .map_err(|e| StoreError::Invalid(e.to_string()))?,
            EntryReason::FreeTrial | EntryReason::Generation => {
                return Err(StoreError::Invalid(format!(
                    "{} is not a credit reason",
                    reason.as_str()
                )))
            }
        };

        entry
            .verify()
            .map_err(|e| StoreError::Inconsistency(e.to_string()))?;

        account.credits += amount;
        account.updated_at = chrono::Utc::now();
        debug_assert_eq!(account.credits, entry.balance_after);

        let cf_accounts = self.cf(cf::ACCOUNTS)?;
        let cf_ledger = self.cf(cf::LEDGER)?;
        let cf_by_user = self.cf(cf::LEDGER_BY_USER)?;
        let cf_orders = self.cf(cf::ORDERS)?;

        let account_key = keys::account_key(user_id);
        let entry_key = keys::entry_key(&entry.id);
        let user_entry_key = keys::user_entry_key(user_id, &entry.id);

        let account_value = Self::serialize(&account)?;
        let entry_value = Self::serialize(&entry)?;

        // Write atomically; the order index rides in the same batch so the
        // dedup probe can never observe a half-applied credit.
        let mut batch = WriteBatch::default();
        batch.put_cf(&cf_accounts, &account_key, &account_value);
        batch.put_cf(&cf_ledger, &entry_key, &entry_value);
        batch.put_cf(&cf_by_user, &user_entry_key, []);
        if let Some(order_id) = order_id {
            batch.put_cf(&cf_orders, keys::order_key(order_id), entry.id.to_bytes());
        }

        self.db
            .write(batch)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        debug!(
            user_id = %user_id,
            amount,
            reason = reason.as_str(),
            credits = account.credits,
            "credited account"
        );

        Ok(CreditReceipt {
            entry_id: entry.id,
            new_balance: account.credits,
            duplicate: false,
        })
    }
}
