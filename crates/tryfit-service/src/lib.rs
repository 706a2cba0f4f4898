//! Tryfit HTTP API service.
//!
//! This crate provides the HTTP API for the tryfit platform, including:
//!
//! - Account management and credit balances
//! - Try-on generation with ranked provider fallback
//! - Payment webhooks reconciled against the credit ledger
//! - Admin provider toggles and manual credit grants
//!
//! # Authentication
//!
//! The service supports two authentication methods:
//!
//! 1. **User JWT tokens** (HS256) - For end-user requests
//! 2. **Admin API key** - For operator endpoints

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
// Allow some pedantic lints that are noisy for Axum handler functions
#![allow(clippy::missing_errors_doc)] // Axum handlers all return Result
#![allow(clippy::unused_async)] // Some handlers need async only for routing consistency

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod payments;
pub mod routes;
pub mod state;

pub use config::{ProviderKind, ProviderSpec, ServiceConfig};
pub use error::ApiError;
pub use routes::create_router;
pub use state::AppState;
