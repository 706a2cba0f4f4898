//! API error types and responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use tryfit_providers::{OrchestratorError, SelectError};
use tryfit_store::StoreError;

/// API error type.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Unauthorized - missing or invalid credentials.
    #[error("unauthorized")]
    Unauthorized,

    /// Resource not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// Bad request - invalid input.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Conflict - resource already exists or invalid state transition.
    #[error("conflict: {0}")]
    Conflict(String),

    /// No free trial and no credits left.
    #[error("no balance: credits={credits}, free trials {free_trials_used}/{free_trials_limit}")]
    NoBalance {
        /// Current credit balance.
        credits: i64,
        /// Free trials consumed.
        free_trials_used: i64,
        /// Free-trial allowance.
        free_trials_limit: i64,
    },

    /// Webhook signature did not verify.
    #[error("invalid webhook signature")]
    InvalidSignature,

    /// No registered provider is eligible for the request.
    #[error("no provider available for category {0}")]
    NoProviderAvailable(String),

    /// An explicitly named provider is switched off.
    #[error("provider {0} is disabled")]
    ProviderDisabled(String),

    /// Every eligible provider was attempted and failed.
    #[error("all providers failed after {attempts} attempt(s): {last_error}")]
    AllProvidersFailed {
        /// How many providers were attempted.
        attempts: usize,
        /// The failure from the final attempt.
        last_error: String,
    },

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

/// JSON error response body.
#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    code: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message, details) = match &self {
            Self::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "unauthorized",
                self.to_string(),
                None,
            ),
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg.clone(), None),
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg.clone(), None),
            Self::Conflict(msg) => (StatusCode::CONFLICT, "conflict", msg.clone(), None),
            Self::NoBalance {
                credits,
                free_trials_used,
                free_trials_limit,
            } => (
                StatusCode::PAYMENT_REQUIRED,
                "no_balance",
                "no free trials or credits remaining".to_string(),
                Some(serde_json::json!({
                    "credits": credits,
                    "free_trials_used": free_trials_used,
                    "free_trials_limit": free_trials_limit
                })),
            ),
            Self::InvalidSignature => (
                StatusCode::BAD_REQUEST,
                "invalid_signature",
                self.to_string(),
                None,
            ),
            Self::NoProviderAvailable(category) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "no_provider_available",
                format!("no provider available for category {category}"),
                None,
            ),
            Self::ProviderDisabled(name) => (
                StatusCode::CONFLICT,
                "provider_disabled",
                format!("provider {name} is disabled"),
                None,
            ),
            Self::AllProvidersFailed {
                attempts,
                last_error,
            } => (
                StatusCode::BAD_GATEWAY,
                "all_providers_failed",
                "every provider failed to produce a result".to_string(),
                Some(serde_json::json!({
                    "attempts": attempts,
                    "last_error": last_error
                })),
            ),
            Self::Internal(msg) => {
                tracing::error!(error = %msg, "Internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                    None,
                )
            }
        };

        let body = ErrorResponse {
            error: ErrorBody {
                code: code.to_string(),
                message,
                details,
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => Self::NotFound("resource not found".into()),
            StoreError::NoBalance {
                credits,
                free_trials_used,
                free_trials_limit,
            } => Self::NoBalance {
                credits,
                free_trials_used,
                free_trials_limit,
            },
            StoreError::EmailTaken { email } => {
                Self::Conflict(format!("email {email} is attached to another account"))
            }
            StoreError::Invalid(msg) => Self::BadRequest(msg),
            StoreError::Database(msg)
            | StoreError::Serialization(msg)
            | StoreError::Inconsistency(msg) => Self::Internal(msg),
        }
    }
}

impl From<SelectError> for ApiError {
    fn from(err: SelectError) -> Self {
        match err {
            SelectError::NoProviderAvailable { category } => {
                Self::NoProviderAvailable(category.to_string())
            }
            SelectError::ProviderDisabled { name } => Self::ProviderDisabled(name),
            SelectError::UnknownProvider { name } => {
                Self::NotFound(format!("unknown provider: {name}"))
            }
        }
    }
}

impl From<OrchestratorError> for ApiError {
    fn from(err: OrchestratorError) -> Self {
        match err {
            OrchestratorError::Select(select) => select.into(),
            OrchestratorError::AllProvidersFailed {
                attempts,
                last_error,
            } => Self::AllProvidersFailed {
                attempts,
                last_error,
            },
        }
    }
}
