//! Request authentication.
//!
//! End-user routes carry a bearer JWT whose subject is the user id.
//! Admin routes carry a shared key in `x-admin-key` instead.

use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use tryfit_core::UserId;

use crate::error::ApiError;
use crate::state::AppState;

/// Claims carried by an access token.
#[derive(Debug, Serialize, Deserialize)]
pub struct JwtClaims {
    /// Subject, the user id as a string.
    pub sub: String,
    /// Audience.
    pub aud: String,
    /// Issuer.
    pub iss: String,
    /// Expiry as a unix timestamp.
    pub exp: i64,
    /// Issued-at as a unix timestamp.
    pub iat: i64,
}

/// An authenticated end user, extracted from the bearer token.
#[derive(Debug, Clone)]
pub struct AuthUser {
    /// The user id the token was issued for.
    pub user_id: UserId,
    /// The raw token subject.
    pub subject: String,
}

#[axum::async_trait]
impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or(ApiError::Unauthorized)?;

        let token = header
            .strip_prefix("Bearer ")
            .or_else(|| header.strip_prefix("bearer "))
            .ok_or(ApiError::Unauthorized)?;

        let claims = decode_token(
            token,
            &state.config.jwt_secret,
            &state.config.jwt_issuer,
            &state.config.jwt_audience,
        )?;

        let user_id: UserId = claims.sub.parse().map_err(|_| {
            tracing::debug!(sub = %claims.sub, "Token subject is not a user id");
            ApiError::Unauthorized
        })?;

        Ok(Self {
            user_id,
            subject: claims.sub,
        })
    }
}

fn decode_token(
    token: &str,
    secret: &str,
    issuer: &str,
    audience: &str,
) -> Result<JwtClaims, ApiError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_audience(&[audience]);
    validation.set_issuer(&[issuer]);

    let data = jsonwebtoken::decode::<JwtClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map_err(|err| {
        tracing::debug!(error = %err, "Token validation failed");
        ApiError::Unauthorized
    })?;

    Ok(data.claims)
}

/// An authenticated admin caller, extracted from the `x-admin-key` header.
#[derive(Debug, Clone)]
pub struct AdminAuth {
    /// Operator identity for audit logs, from `x-admin-id`.
    pub admin_id: String,
}

#[axum::async_trait]
impl FromRequestParts<Arc<AppState>> for AdminAuth {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let Some(expected) = state.config.admin_api_key.as_deref() else {
            tracing::debug!("Admin request rejected: no admin key configured");
            return Err(ApiError::Unauthorized);
        };

        let provided = parts
            .headers
            .get("x-admin-key")
            .and_then(|value| value.to_str().ok())
            .ok_or(ApiError::Unauthorized)?;

        if provided != expected {
            tracing::debug!("Admin request rejected: key mismatch");
            return Err(ApiError::Unauthorized);
        }

        let admin_id = parts
            .headers
            .get("x-admin-id")
            .and_then(|value| value.to_str().ok())
            .unwrap_or("admin")
            .to_string();

        tracing::info!(admin_id = %admin_id, "Admin request authenticated");

        Ok(Self { admin_id })
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};

    fn mint(secret: &str, sub: &str, iss: &str, aud: &str, exp_offset: i64) -> String {
        let now = chrono::Utc::now().timestamp();
        let claims = JwtClaims {
            sub: sub.to_string(),
            aud: aud.to_string(),
            iss: iss.to_string(),
            exp: now + exp_offset,
            iat: now,
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    #[test]
    fn valid_token_decodes() {
        let token = mint("secret", "42", "tryfit", "tryfit", 3600);
        let claims = decode_token(&token, "secret", "tryfit", "tryfit").unwrap();
        assert_eq!(claims.sub, "42");
    }

    #[test]
    fn wrong_secret_rejected() {
        let token = mint("secret", "42", "tryfit", "tryfit", 3600);
        assert!(decode_token(&token, "other", "tryfit", "tryfit").is_err());
    }

    #[test]
    fn expired_token_rejected() {
        let token = mint("secret", "42", "tryfit", "tryfit", -3600);
        assert!(decode_token(&token, "secret", "tryfit", "tryfit").is_err());
    }

    #[test]
    fn wrong_audience_rejected() {
        let token = mint("secret", "42", "tryfit", "other-aud", 3600);
        assert!(decode_token(&token, "secret", "tryfit", "tryfit").is_err());
    }

    #[test]
    fn wrong_issuer_rejected() {
        let token = mint("secret", "42", "other-iss", "tryfit", 3600);
        assert!(decode_token(&token, "secret", "tryfit", "tryfit").is_err());
    }
}
