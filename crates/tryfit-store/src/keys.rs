//! Key encoding utilities for `RocksDB`.
//!
//! This module provides functions for encoding and decoding keys used in
//! column families. Index keys concatenate fixed-width id bytes so prefix
//! iteration over a user's rows walks them in ULID (time) order.

use tryfit_core::{EntryId, GenerationId, UserId};

/// Create an account key from a user ID.
#[must_use]
pub fn account_key(user_id: &UserId) -> Vec<u8> {
    user_id.as_bytes().to_vec()
}

/// Create a ledger entry key from an entry ID.
#[must_use]
pub fn entry_key(entry_id: &EntryId) -> Vec<u8> {
    entry_id.to_bytes().to_vec()
}

/// Create a user-entry index key.
///
/// Format: `user_id (16 bytes) || entry_id (16 bytes)`
///
/// Since ULIDs are time-ordered, a user's entries sort chronologically.
#[must_use]
pub fn user_entry_key(user_id: &UserId, entry_id: &EntryId) -> Vec<u8> {
    let mut key = Vec::with_capacity(32);
    key.extend_from_slice(user_id.as_bytes());
    key.extend_from_slice(&entry_id.to_bytes());
    key
}

/// Create a prefix for iterating all ledger entries for a user.
#[must_use]
pub fn user_prefix(user_id: &UserId) -> Vec<u8> {
    user_id.as_bytes().to_vec()
}

/// Extract the entry ID from a user-entry index key.
///
/// # Panics
///
/// Panics if the key is not at least 32 bytes.
#[must_use]
pub fn extract_entry_id_from_user_key(key: &[u8]) -> EntryId {
    let mut bytes = [0u8; 16];
    bytes.copy_from_slice(&key[16..32]);
    EntryId::from_bytes(bytes).expect("valid ULID bytes")
}

/// Create an order index key from an external order id.
#[must_use]
pub fn order_key(order_id: &str) -> Vec<u8> {
    order_id.as_bytes().to_vec()
}

/// Create a generation record key from a generation ID.
#[must_use]
pub fn generation_key(generation_id: &GenerationId) -> Vec<u8> {
    generation_id.to_bytes().to_vec()
}

/// Create a user-generation index key.
///
/// Format: `user_id (16 bytes) || generation_id (16 bytes)`
#[must_use]
pub fn user_generation_key(user_id: &UserId, generation_id: &GenerationId) -> Vec<u8> {
    let mut key = Vec::with_capacity(32);
    key.extend_from_slice(user_id.as_bytes());
    key.extend_from_slice(&generation_id.to_bytes());
    key
}

/// Extract the generation ID from a user-generation index key.
///
/// # Panics
///
/// Panics if the key is not at least 32 bytes.
#[must_use]
pub fn extract_generation_id_from_user_key(key: &[u8]) -> GenerationId {
    let mut bytes = [0u8; 16];
    bytes.copy_from_slice(&key[16..32]);
    GenerationId::from_bytes(bytes).expect("valid ULID bytes")
}

/// Create an email index key from a contact address.
///
/// Addresses are trimmed and lowercased so lookups are case-insensitive.
#[must_use]
pub fn email_key(email: &str) -> Vec<u8> {
    email.trim().to_lowercase().into_bytes()
}
