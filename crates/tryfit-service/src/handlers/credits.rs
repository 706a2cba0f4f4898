//! Credit balance, ledger history, and admin grant handlers.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use tryfit_core::{EntryReason, LedgerEntry, UserId};
use tryfit_store::Store;

use crate::auth::{AdminAuth, AuthUser};
use crate::error::ApiError;
use crate::state::AppState;

/// Balance response.
#[derive(Debug, Serialize)]
pub struct BalanceResponse {
    /// Current credit balance.
    pub credits: i64,
    /// Free-trial generations consumed.
    pub free_trials_used: i64,
    /// Free-trial allowance.
    pub free_trials_limit: i64,
}

/// Get current credit balance.
pub async fn get_balance(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> Result<Json<BalanceResponse>, ApiError> {
    let account = state
        .store
        .get_account(&auth.user_id)?
        .ok_or_else(|| ApiError::NotFound("Account not found".into()))?;

    Ok(Json(BalanceResponse {
        credits: account.credits,
        free_trials_used: account.free_trials_used,
        free_trials_limit: account.free_trials_limit,
    }))
}

/// History query parameters.
#[derive(Debug, Deserialize)]
pub struct ListEntriesQuery {
    /// Maximum number of entries to return (default: 50).
    #[serde(default = "default_limit")]
    pub limit: usize,
    /// Offset for pagination (default: 0).
    #[serde(default)]
    pub offset: usize,
}

fn default_limit() -> usize {
    50
}

/// Ledger entry response.
#[derive(Debug, Serialize)]
pub struct EntryResponse {
    /// Entry ID.
    pub id: String,
    /// Signed amount (positive = credit, negative = debit).
    pub amount: i64,
    /// Machine-readable reason.
    pub reason: String,
    /// Human-readable label.
    pub label: String,
    /// Credit balance before this entry.
    pub balance_before: i64,
    /// Credit balance after this entry.
    pub balance_after: i64,
    /// Description.
    pub description: String,
    /// External order id, for purchases.
    pub order_id: Option<String>,
    /// Timestamp.
    pub created_at: String,
}

impl From<&LedgerEntry> for EntryResponse {
    fn from(entry: &LedgerEntry) -> Self {
        Self {
            id: entry.id.to_string(),
            amount: entry.amount,
            reason: entry.reason.as_str().to_string(),
            label: entry.reason.label().to_string(),
            balance_before: entry.balance_before,
            balance_after: entry.balance_after,
            description: entry.description.clone(),
            order_id: entry.order_id.clone(),
            created_at: entry.created_at.to_rfc3339(),
        }
    }
}

/// Ledger history response.
#[derive(Debug, Serialize)]
pub struct ListEntriesResponse {
    /// Ledger entries (newest first).
    pub entries: Vec<EntryResponse>,
    /// Whether there are more entries.
    pub has_more: bool,
}

/// List ledger history.
pub async fn list_history(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Query(query): Query<ListEntriesQuery>,
) -> Result<Json<ListEntriesResponse>, ApiError> {
    // Verify account exists
    state
        .store
        .get_account(&auth.user_id)?
        .ok_or_else(|| ApiError::NotFound("Account not found".into()))?;

    // Fetch one more than requested to determine has_more
    let limit = query.limit.min(100);
    let entries = state
        .store
        .list_entries(&auth.user_id, limit + 1, query.offset)?;

    let has_more = entries.len() > limit;
    let entries: Vec<_> = entries.iter().take(limit).map(EntryResponse::from).collect();

    Ok(Json(ListEntriesResponse { entries, has_more }))
}

/// Admin credit grant request.
#[derive(Debug, Deserialize)]
pub struct AdminGrantRequest {
    /// Target account's user id.
    pub account_id: UserId,
    /// Credits to grant. Must be positive.
    pub amount: i64,
    /// Reason recorded in the ledger entry.
    pub reason: Option<String>,
    /// Optional external order id; makes the grant idempotent.
    pub order_id: Option<String>,
}

/// Admin credit grant response.
#[derive(Debug, Serialize)]
pub struct AdminGrantResponse {
    /// The ledger entry recording the grant.
    pub entry_id: String,
    /// Credit balance after the grant.
    pub new_balance: i64,
    /// True when the order id had already been applied.
    pub duplicate: bool,
}

/// Grant credits to an account (admin only).
pub async fn admin_add_credits(
    State(state): State<Arc<AppState>>,
    admin: AdminAuth,
    Json(body): Json<AdminGrantRequest>,
) -> Result<Json<AdminGrantResponse>, ApiError> {
    if body.amount <= 0 {
        return Err(ApiError::BadRequest("Amount must be positive".into()));
    }

    let description = body
        .reason
        .filter(|r| !r.is_empty())
        .unwrap_or_else(|| "manual credit grant".to_string());

    let receipt = state.store.credit_account(
        &body.account_id,
        body.amount,
        body.order_id.as_deref(),
        EntryReason::Adjustment,
        &description,
    )?;

    tracing::info!(
        admin_id = %admin.admin_id,
        account_id = %body.account_id,
        amount = body.amount,
        duplicate = receipt.duplicate,
        "Admin credit grant applied"
    );

    Ok(Json(AdminGrantResponse {
        entry_id: receipt.entry_id.to_string(),
        new_balance: receipt.new_balance,
        duplicate: receipt.duplicate,
    }))
}
