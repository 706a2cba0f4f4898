//! Payment webhook handler.

use std::sync::Arc;

use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use serde::Serialize;

use crate::error::ApiError;
use crate::payments::signature::{self, SIGNATURE_HEADER};
use crate::payments::{reconcile, Disposition};
use crate::state::AppState;

/// Webhook response.
#[derive(Debug, Serialize)]
pub struct WebhookResponse {
    /// Whether the webhook was accepted.
    pub received: bool,
    /// How the event was handled.
    #[serde(flatten)]
    pub disposition: Disposition,
}

/// Handle payment provider webhooks.
///
/// The signature is verified over the raw body before any parsing. A
/// verified event is always acknowledged with 200, malformed payloads
/// included; only a storage failure returns 5xx, so the provider
/// redelivers exactly the events whose ledger effect is uncertain.
pub async fn payment_webhook(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: String,
) -> Result<Json<WebhookResponse>, ApiError> {
    if let Some(secret) = &state.config.payment_webhook_secret {
        let provided = headers
            .get(SIGNATURE_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| {
                tracing::warn!("Webhook rejected: missing signature header");
                ApiError::InvalidSignature
            })?;

        if !signature::verify(secret, &body, provided) {
            tracing::warn!("Webhook rejected: signature mismatch");
            return Err(ApiError::InvalidSignature);
        }
    } else {
        // No webhook secret configured - skip verification (development mode)
        tracing::warn!("Payment webhook secret not configured - skipping signature verification");
    }

    let disposition = reconcile::apply(&state, &body)?;

    Ok(Json(WebhookResponse {
        received: true,
        disposition,
    }))
}
