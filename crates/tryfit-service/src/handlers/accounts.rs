//! Account management handlers.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use tryfit_core::Account;
use tryfit_store::Store;

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::state::AppState;

/// Account response.
#[derive(Debug, Serialize)]
pub struct AccountResponse {
    /// User ID.
    pub user_id: String,
    /// Current credit balance.
    pub credits: i64,
    /// Free-trial generations consumed.
    pub free_trials_used: i64,
    /// Free-trial allowance.
    pub free_trials_limit: i64,
    /// Free-trial generations still available.
    pub free_trials_remaining: i64,
    /// Attached email, if any.
    pub email: Option<String>,
    /// Created timestamp.
    pub created_at: String,
}

impl From<&Account> for AccountResponse {
    fn from(account: &Account) -> Self {
        Self {
            user_id: account.user_id.to_string(),
            credits: account.credits,
            free_trials_used: account.free_trials_used,
            free_trials_limit: account.free_trials_limit,
            free_trials_remaining: account.free_trials_remaining(),
            email: account.email.clone(),
            created_at: account.created_at.to_rfc3339(),
        }
    }
}

/// Create account request (optional fields for metadata).
#[derive(Debug, Deserialize)]
pub struct CreateAccountRequest {
    /// Optional email to attach to the account.
    pub email: Option<String>,
}

/// Create or register an account for the authenticated user.
///
/// Idempotent: repeat calls return the existing account unchanged. The
/// fresh free-trial allowance is granted only on first creation.
pub async fn create_account(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Json(body): Json<CreateAccountRequest>,
) -> Result<Json<AccountResponse>, ApiError> {
    let fresh = Account::new(auth.user_id, state.config.free_trial_limit);
    let mut account = state.store.create_account_if_absent(&fresh)?;

    if let Some(email) = body.email.filter(|e| !e.is_empty()) {
        state.store.attach_email(&auth.user_id, &email)?;
        account.email = Some(email);
        tracing::info!(user_id = %auth.user_id, "Email attached to account");
    }

    tracing::info!(user_id = %auth.user_id, "Account registered");

    Ok(Json(AccountResponse::from(&account)))
}

/// Get the current user's account.
pub async fn get_account(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> Result<Json<AccountResponse>, ApiError> {
    let account = state
        .store
        .get_account(&auth.user_id)?
        .ok_or_else(|| ApiError::NotFound("Account not found".into()))?;

    Ok(Json(AccountResponse::from(&account)))
}
