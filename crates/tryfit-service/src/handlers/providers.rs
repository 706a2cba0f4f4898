//! Provider administration handlers.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use tryfit_providers::ProviderStatus;

use crate::auth::AdminAuth;
use crate::error::ApiError;
use crate::state::AppState;

/// Registry snapshot response.
#[derive(Debug, Serialize)]
pub struct ListProvidersResponse {
    /// Registrations, in registration order.
    pub providers: Vec<ProviderStatus>,
}

/// Snapshot the provider registry (admin only).
pub async fn list_providers(
    State(state): State<Arc<AppState>>,
    _admin: AdminAuth,
) -> Result<Json<ListProvidersResponse>, ApiError> {
    Ok(Json(ListProvidersResponse {
        providers: state.registry.statuses(),
    }))
}

/// Provider toggle request. Omitted fields are left unchanged.
#[derive(Debug, Deserialize)]
pub struct UpdateProviderRequest {
    /// Operator switch.
    pub enabled: Option<bool>,
    /// Credential health override.
    pub active: Option<bool>,
}

/// Provider toggle response.
#[derive(Debug, Serialize)]
pub struct UpdateProviderResponse {
    /// Provider name.
    pub name: String,
    /// Operator switch after the update.
    pub enabled: bool,
    /// Credential health after the update.
    pub active: bool,
}

/// Toggle a provider's flags (admin only).
///
/// Takes effect on the next selection; in-flight requests are untouched.
pub async fn update_provider(
    State(state): State<Arc<AppState>>,
    admin: AdminAuth,
    Path(name): Path<String>,
    Json(body): Json<UpdateProviderRequest>,
) -> Result<Json<UpdateProviderResponse>, ApiError> {
    let flags = state.registry.set_flags(&name, body.enabled, body.active)?;

    tracing::info!(
        admin_id = %admin.admin_id,
        provider = %name,
        enabled = flags.enabled,
        active = flags.active,
        "Provider flags updated"
    );

    Ok(Json(UpdateProviderResponse {
        name,
        enabled: flags.enabled,
        active: flags.active,
    }))
}
