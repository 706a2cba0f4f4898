//! Try-on generation handlers.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use tryfit_core::{Category, DebitKind, GenerationRecord};
use tryfit_providers::TryOnJob;
use tryfit_store::Store;

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::state::AppState;

/// Maximum accepted length for an image reference.
const MAX_IMAGE_URL_LEN: usize = 2048;

/// Try-on request.
#[derive(Debug, Deserialize)]
pub struct TryOnRequest {
    /// Garment category: `upper_body`, `lower_body`, or `dresses`.
    pub category: String,
    /// HTTPS reference to the person image.
    pub person_image: String,
    /// HTTPS reference to the garment image.
    pub garment_image: String,
    /// Pin the request to one named provider, skipping ranked fallback.
    pub provider: Option<String>,
}

/// How the generation was paid for.
#[derive(Debug, Serialize)]
pub struct BillingInfo {
    /// Whether a free trial or a paid credit was consumed.
    pub method: DebitKind,
    /// Credit balance after the debit.
    pub credits_remaining: i64,
    /// Free trials still available after the debit.
    pub free_trials_remaining: i64,
}

/// Try-on response.
#[derive(Debug, Serialize)]
pub struct TryOnResponse {
    /// Locator (URL) of the generated image.
    pub result_url: String,
    /// Name of the provider that served the request.
    pub provider: String,
    /// Whether a lower-ranked provider served the request.
    pub fallback: bool,
    /// Wall-clock processing time in milliseconds.
    pub elapsed_ms: u64,
    /// Billing outcome.
    pub billing: BillingInfo,
}

/// Run a try-on generation.
///
/// The balance is pre-checked before any provider is contacted, but the
/// authoritative debit happens only after a successful generation. A debit
/// lost to a concurrent request returns 402 and the generation is not
/// billed or recorded.
pub async fn create_tryon(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Json(body): Json<TryOnRequest>,
) -> Result<Json<TryOnResponse>, ApiError> {
    let category: Category = body
        .category
        .parse()
        .map_err(|_| ApiError::BadRequest(format!("Unknown category: {}", body.category)))?;

    validate_image_ref("person_image", &body.person_image)?;
    validate_image_ref("garment_image", &body.garment_image)?;

    let account = state
        .store
        .get_account(&auth.user_id)?
        .ok_or_else(|| ApiError::NotFound("Account not found".into()))?;

    // Cheap pre-check so an unfunded request never reaches a provider.
    // The debit below is the authoritative check.
    if !account.can_generate() {
        return Err(ApiError::NoBalance {
            credits: account.credits,
            free_trials_used: account.free_trials_used,
            free_trials_limit: account.free_trials_limit,
        });
    }

    let job = TryOnJob {
        person_image: body.person_image,
        garment_image: body.garment_image,
        category,
    };

    let outcome = state
        .orchestrator
        .process(&job, body.provider.as_deref())
        .await?;

    let receipt = state.store.debit_generation(&auth.user_id)?;

    let elapsed_ms = u64::try_from(outcome.elapsed.as_millis()).unwrap_or(u64::MAX);
    let record = GenerationRecord::new(
        auth.user_id,
        outcome.provider.clone(),
        category,
        outcome.result_url.clone(),
        outcome.fallback,
        elapsed_ms,
    );
    // The debit has committed; losing the history row must not eat the
    // paid result.
    if let Err(e) = state.store.put_generation(&record) {
        tracing::error!(
            user_id = %auth.user_id,
            error = %e,
            "Failed to record generation history"
        );
    }

    tracing::info!(
        user_id = %auth.user_id,
        provider = %outcome.provider,
        fallback = outcome.fallback,
        method = ?receipt.kind,
        elapsed_ms,
        "Try-on generation billed"
    );

    Ok(Json(TryOnResponse {
        result_url: outcome.result_url,
        provider: outcome.provider,
        fallback: outcome.fallback,
        elapsed_ms,
        billing: BillingInfo {
            method: receipt.kind,
            credits_remaining: receipt.credits,
            free_trials_remaining: (receipt.free_trials_limit - receipt.free_trials_used).max(0),
        },
    }))
}

fn validate_image_ref(field: &str, value: &str) -> Result<(), ApiError> {
    if !value.starts_with("https://") {
        return Err(ApiError::BadRequest(format!(
            "{field} must be an https URL"
        )));
    }
    if value.len() > MAX_IMAGE_URL_LEN {
        return Err(ApiError::BadRequest(format!(
            "{field} exceeds {MAX_IMAGE_URL_LEN} characters"
        )));
    }
    Ok(())
}

/// History query parameters.
#[derive(Debug, Deserialize)]
pub struct ListGenerationsQuery {
    /// Maximum number of records to return (default: 50).
    #[serde(default = "default_limit")]
    pub limit: usize,
    /// Offset for pagination (default: 0).
    #[serde(default)]
    pub offset: usize,
}

fn default_limit() -> usize {
    50
}

/// Generation record response.
#[derive(Debug, Serialize)]
pub struct GenerationResponse {
    /// Record ID.
    pub id: String,
    /// Provider that served the request.
    pub provider: String,
    /// Garment category.
    pub category: Category,
    /// Locator (URL) of the generated image.
    pub result_url: String,
    /// Whether a lower-ranked provider served the request.
    pub fallback: bool,
    /// Wall-clock processing time in milliseconds.
    pub elapsed_ms: u64,
    /// Timestamp.
    pub created_at: String,
}

impl From<&GenerationRecord> for GenerationResponse {
    fn from(record: &GenerationRecord) -> Self {
        Self {
            id: record.id.to_string(),
            provider: record.provider.clone(),
            category: record.category,
            result_url: record.result_url.clone(),
            fallback: record.fallback,
            elapsed_ms: record.elapsed_ms,
            created_at: record.created_at.to_rfc3339(),
        }
    }
}

/// Generation history response.
#[derive(Debug, Serialize)]
pub struct ListGenerationsResponse {
    /// Generation records (newest first).
    pub generations: Vec<GenerationResponse>,
    /// Whether there are more records.
    pub has_more: bool,
}

/// List past generations.
pub async fn list_history(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Query(query): Query<ListGenerationsQuery>,
) -> Result<Json<ListGenerationsResponse>, ApiError> {
    // Verify account exists
    state
        .store
        .get_account(&auth.user_id)?
        .ok_or_else(|| ApiError::NotFound("Account not found".into()))?;

    // Fetch one more than requested to determine has_more
    let limit = query.limit.min(100);
    let records = state
        .store
        .list_generations(&auth.user_id, limit + 1, query.offset)?;

    let has_more = records.len() > limit;
    let generations: Vec<_> = records
        .iter()
        .take(limit)
        .map(GenerationResponse::from)
        .collect();

    Ok(Json(ListGenerationsResponse {
        generations,
        has_more,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_ref_requires_https() {
        assert!(validate_image_ref("person_image", "https://cdn.test/a.png").is_ok());
        assert!(validate_image_ref("person_image", "http://cdn.test/a.png").is_err());
        assert!(validate_image_ref("person_image", "ftp://cdn.test/a.png").is_err());
        assert!(validate_image_ref("person_image", "").is_err());
    }

    #[test]
    fn image_ref_enforces_length() {
        let long = format!("https://cdn.test/{}", "a".repeat(MAX_IMAGE_URL_LEN));
        assert!(validate_image_ref("garment_image", &long).is_err());
    }
}
