//! Database schema definitions and column families.
//!
//! This module defines the column families used in `RocksDB` storage.

/// Column family names for the `RocksDB` database.
pub mod cf {
    /// Primary account records, keyed by `user_id`.
    pub const ACCOUNTS: &str = "accounts";

    /// Ledger entries, keyed by `entry_id` (ULID).
    pub const LEDGER: &str = "ledger";

    /// Index: ledger entries by user, keyed by `user_id || entry_id`.
    /// Value is empty (index only).
    pub const LEDGER_BY_USER: &str = "ledger_by_user";

    /// Index: external order id to `entry_id` (16 ULID bytes).
    /// Presence of a key means that order has been credited.
    pub const ORDERS: &str = "orders";

    /// Generation records, keyed by `generation_id` (ULID).
    pub const GENERATIONS: &str = "generations";

    /// Index: generation records by user, keyed by `user_id || generation_id`.
    /// Value is empty (index only).
    pub const GENERATIONS_BY_USER: &str = "generations_by_user";

    /// Index: normalized contact address to `user_id` (16 UUID bytes).
    pub const EMAILS: &str = "emails";
}

/// Returns all column family names for database initialization.
#[must_use]
pub fn all_column_families() -> Vec<&'static str> {
    vec![
        cf::ACCOUNTS,
        cf::LEDGER,
        cf::LEDGER_BY_USER,
        cf::ORDERS,
        cf::GENERATIONS,
        cf::GENERATIONS_BY_USER,
        cf::EMAILS,
    ]
}
