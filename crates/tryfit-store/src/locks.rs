//! Per-account lock registry.
//!
//! `debit_generation` and `credit_account` are check-then-act sequences; the
//! registry hands out one mutex per account so those sequences serialize per
//! account while unrelated accounts proceed in parallel. Locks are plain
//! `std::sync::Mutex` since nothing awaits while holding one.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tryfit_core::UserId;

#[derive(Default)]
pub(crate) struct AccountLocks {
    inner: Mutex<HashMap<UserId, Arc<Mutex<()>>>>,
}

impl AccountLocks {
    /// Get (or create) the lock handle for an account.
    ///
    /// The handle must be bound to a local before locking so the guard has
    /// something to borrow from.
    pub(crate) fn handle(&self, user_id: &UserId) -> Arc<Mutex<()>> {
        let mut map = self
            .inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        map.entry(*user_id).or_default().clone()
    }
}
