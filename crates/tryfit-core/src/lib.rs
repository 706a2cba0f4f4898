//! Core types for the tryfit platform.
//!
//! This crate provides the foundational types used throughout the tryfit services:
//!
//! - **Identifiers**: `UserId`, `EntryId`, `GenerationId`
//! - **Accounts**: `Account` with credit balance and free-trial counters
//! - **Ledger**: `LedgerEntry`, `EntryReason`, `DebitKind`
//! - **Generation**: `Category`, `GenerationRecord`
//!
//! # Credit Unit
//!
//! **1 credit = one try-on generation.**
//!
//! - A paid order for 50 credits covers 50 generations
//! - New accounts carry a small free-trial allowance, consumed before credits
//! - Stored as `i64`; balances never go negative

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod account;
pub mod category;
pub mod error;
pub mod generation;
pub mod ids;
pub mod ledger;

pub use account::{Account, DEFAULT_FREE_TRIAL_LIMIT};
pub use category::Category;
pub use error::{CoreError, Result};
pub use generation::GenerationRecord;
pub use ids::{EntryId, GenerationId, IdError, UserId};
pub use ledger::{DebitKind, EntryReason, LedgerEntry, GENERATION_COST};
