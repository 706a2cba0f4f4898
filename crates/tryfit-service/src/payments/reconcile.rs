//! The webhook reconciler.
//!
//! Turns a verified payment event into at most one ledger credit. The
//! stages run in a fixed order: parse, filter to credit-bearing
//! subtypes, resolve the target account and quantity, then apply the
//! credit idempotently on the order id.
//!
//! Everything short of a storage failure is acknowledged: the returned
//! [`Disposition`] says what happened, and the handler wraps it in a 200
//! so the provider stops redelivering. A storage failure propagates as
//! an error instead, deliberately, so the provider redelivers exactly
//! the events whose ledger effect is uncertain.

use serde::Serialize;

use tryfit_core::{Account, EntryId, EntryReason, UserId};
use tryfit_store::Store;

use crate::error::ApiError;
use crate::payments::types::{parse_credits, PaymentEvent};
use crate::state::AppState;

/// How a verified event was resolved.
#[derive(Debug, Serialize)]
#[serde(tag = "disposition", rename_all = "snake_case")]
pub enum Disposition {
    /// The account was credited.
    Credited {
        /// The credited account.
        account_id: UserId,
        /// Credits applied.
        amount: i64,
        /// Balance after the credit.
        new_balance: i64,
        /// The ledger entry recording the credit.
        entry_id: EntryId,
    },

    /// The order id had already been applied; nothing changed.
    Duplicate {
        /// The replayed order id.
        order_id: String,
    },

    /// A non-credit-bearing subtype, recorded for audit only.
    AuditOnly {
        /// The event subtype.
        event_type: String,
    },

    /// The event named no creditable account or quantity.
    Malformed {
        /// What was missing or invalid.
        reason: String,
    },
}

/// Reconcile one verified webhook delivery against the ledger.
pub fn apply(state: &AppState, body: &str) -> Result<Disposition, ApiError> {
    let event: PaymentEvent = match serde_json::from_str(body) {
        Ok(event) => event,
        Err(e) => {
            tracing::error!(error = %e, "Unparseable payment event");
            return Ok(Disposition::Malformed {
                reason: "unparseable event body".into(),
            });
        }
    };

    tracing::info!(
        event_id = %event.id,
        event_type = %event.event_type,
        "Received payment event"
    );

    if !event.is_credit_bearing() {
        tracing::debug!(event_type = %event.event_type, "Audit-only payment event");
        return Ok(Disposition::AuditOnly {
            event_type: event.event_type,
        });
    }

    let Some(raw_account_id) = event.object.metadata.account_id.as_deref() else {
        return Ok(malformed(&event, "missing account_id in metadata"));
    };
    let Ok(account_id) = raw_account_id.parse::<UserId>() else {
        return Ok(malformed(&event, "invalid account_id in metadata"));
    };

    let Some(raw_credits) = event.object.metadata.credits.as_ref() else {
        return Ok(malformed(&event, "missing credits in metadata"));
    };
    let Some(credits) = parse_credits(raw_credits) else {
        return Ok(malformed(&event, "non-numeric credits in metadata"));
    };
    if credits <= 0 {
        return Ok(malformed(&event, "non-positive credits in metadata"));
    }

    // A paid order must never be dropped: create the account row if the
    // buyer has not registered yet.
    if state.store.get_account(&account_id)?.is_none() {
        tracing::info!(account_id = %account_id, "Creating account for paid order");
    }
    let account = state
        .store
        .create_account_if_absent(&Account::new(account_id, state.config.free_trial_limit))?;

    // Opportunistic contact attach. Failures never affect the credit.
    if account.email.is_none() {
        if let Some(email) = event
            .object
            .customer
            .as_ref()
            .and_then(|c| c.email.as_deref())
            .filter(|e| !e.is_empty())
        {
            if let Err(e) = state.store.attach_email(&account_id, email) {
                tracing::warn!(
                    account_id = %account_id,
                    error = %e,
                    "Could not attach customer email"
                );
            }
        }
    }

    let order_id = event.order_reference().to_string();
    let receipt = state.store.credit_account(
        &account_id,
        credits,
        Some(&order_id),
        EntryReason::Purchase,
        &event.event_type,
    )?;

    if receipt.duplicate {
        tracing::info!(
            order_id = %order_id,
            account_id = %account_id,
            "Replayed payment event, ledger unchanged"
        );
        return Ok(Disposition::Duplicate { order_id });
    }

    tracing::info!(
        order_id = %order_id,
        account_id = %account_id,
        amount = credits,
        new_balance = receipt.new_balance,
        "Payment credited"
    );

    Ok(Disposition::Credited {
        account_id,
        amount: credits,
        new_balance: receipt.new_balance,
        entry_id: receipt.entry_id,
    })
}

fn malformed(event: &PaymentEvent, reason: &str) -> Disposition {
    tracing::warn!(
        event_id = %event.id,
        event_type = %event.event_type,
        reason,
        "Malformed payment event"
    );
    Disposition::Malformed {
        reason: reason.into(),
    }
}
