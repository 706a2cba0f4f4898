//! Router configuration.
//!
//! This module sets up the Axum router with all routes and middleware.

use std::sync::Arc;
use std::time::Duration;

use axum::routing::{get, post, put};
use axum::Router;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::handlers::{accounts, credits, health, providers, tryon, webhooks};
use crate::state::AppState;

// ============================================================================
// Concurrency Limiting Constants
// ============================================================================

/// Maximum concurrent try-on generations.
/// Each one holds an outbound provider call for tens of seconds, so this
/// is much tighter than the general API limit.
const TRYON_MAX_CONCURRENT_REQUESTS: usize = 8;

/// Maximum concurrent requests for general API endpoints.
const API_MAX_CONCURRENT_REQUESTS: usize = 50;

/// Create the service router with all routes and middleware.
///
/// # Routes
///
/// ## Public
/// - `GET /health` - Health check
///
/// ## Accounts (JWT auth)
/// - `POST /v1/accounts` - Create/register account
/// - `GET /v1/accounts/me` - Get current user's account
///
/// ## Credits (JWT auth)
/// - `GET /v1/credits/balance` - Get current balance
/// - `GET /v1/credits/history` - List ledger history
///
/// ## Try-on (JWT auth, tight concurrency limit)
/// - `POST /v1/tryon` - Run a try-on generation
/// - `GET /v1/tryon/history` - List past generations
///
/// ## Admin (API key auth)
/// - `GET /v1/admin/providers` - Provider registry snapshot
/// - `PUT /v1/admin/providers/:name` - Toggle a provider
/// - `POST /v1/admin/credits` - Grant credits to an account
///
/// ## Webhooks (Signature verification)
/// - `POST /webhooks/payments` - Payment provider webhooks
pub fn create_router(state: AppState) -> Router {
    // Extract config values before moving state
    let cors_origins = state.config.cors_origins.clone();
    let max_body_bytes = state.config.max_body_bytes;
    let request_timeout_seconds = state.config.request_timeout_seconds;

    // Build CORS layer
    let cors = build_cors_layer(&cors_origins);

    let state = Arc::new(state);

    // Try-on routes get their own, much tighter concurrency limit: each
    // request occupies a provider slot for the whole generation.
    let tryon_routes = Router::new()
        .route("/", post(tryon::create_tryon))
        .route("/history", get(tryon::list_history))
        .layer(ConcurrencyLimitLayer::new(TRYON_MAX_CONCURRENT_REQUESTS));

    // Create concurrency-limited API routes
    let api_routes = Router::new()
        // Accounts
        .route("/accounts", post(accounts::create_account))
        .route("/accounts/me", get(accounts::get_account))
        // Credits
        .route("/credits/balance", get(credits::get_balance))
        .route("/credits/history", get(credits::list_history))
        // Admin
        .route("/admin/providers", get(providers::list_providers))
        .route("/admin/providers/:name", put(providers::update_provider))
        .route("/admin/credits", post(credits::admin_add_credits))
        // Try-on routes (with their own concurrency limit)
        .nest("/tryon", tryon_routes)
        .layer(ConcurrencyLimitLayer::new(API_MAX_CONCURRENT_REQUESTS));

    Router::new()
        // Health (public, no rate limit)
        .route("/health", get(health::health))
        // API v1 routes (rate limited)
        .nest("/v1", api_routes)
        // Webhooks (no rate limit - controlled by external services)
        .route("/webhooks/payments", post(webhooks::payment_webhook))
        // Global middleware
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
        .layer(TimeoutLayer::new(Duration::from_secs(
            request_timeout_seconds,
        )))
        .with_state(state)
}

/// Build the CORS layer from configured origins.
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|o| o == "*") {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    }
}
