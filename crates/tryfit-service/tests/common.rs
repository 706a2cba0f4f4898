//! Common test utilities for tryfit integration tests.

#![allow(dead_code)] // Some utilities are used by different test files

use std::collections::HashMap;

use axum::Router;
use axum_test::TestServer;
use jsonwebtoken::{encode, EncodingKey, Header};
use tempfile::TempDir;

use tryfit_core::{Category, UserId};
use tryfit_service::auth::JwtClaims;
use tryfit_service::{create_router, AppState, ProviderKind, ProviderSpec, ServiceConfig};
use tryfit_store::RocksStore;

/// JWT secret shared by the harness config and the token mint.
pub const TEST_JWT_SECRET: &str = "test-jwt-secret";

/// Admin key configured on every harness.
pub const TEST_ADMIN_KEY: &str = "test-admin-key";

/// Test harness containing everything needed for integration tests.
pub struct TestHarness {
    /// The test server for making HTTP requests.
    pub server: TestServer,
    /// Temporary directory for the database (kept alive for test duration).
    pub _temp_dir: TempDir,
    /// A test user ID for authenticated requests.
    pub test_user_id: UserId,
}

impl TestHarness {
    /// Create a new test harness with a fresh database and no providers.
    pub fn new() -> Self {
        Self::build(|_| {})
    }

    /// Harness with the given provider registrations.
    pub fn with_providers(providers: Vec<ProviderSpec>) -> Self {
        Self::build(move |config| config.providers = providers)
    }

    /// Harness with webhook signature verification enabled.
    pub fn with_webhook_secret(secret: &str) -> Self {
        let secret = secret.to_string();
        Self::build(move |config| config.payment_webhook_secret = Some(secret))
    }

    /// Create a harness, letting the caller adjust the config first.
    pub fn build(customize: impl FnOnce(&mut ServiceConfig)) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let store = RocksStore::open(temp_dir.path()).expect("Failed to open store");

        let mut config = ServiceConfig {
            listen_addr: "127.0.0.1:0".into(),
            data_dir: temp_dir.path().to_string_lossy().to_string(),
            jwt_secret: TEST_JWT_SECRET.into(),
            jwt_issuer: "tryfit".into(),
            jwt_audience: "tryfit".into(),
            admin_api_key: Some(TEST_ADMIN_KEY.into()),
            payment_webhook_secret: None,
            free_trial_limit: 3,
            provider_timeout_seconds: 30,
            providers: Vec::new(),
            cors_origins: vec!["*".into()],
            max_body_bytes: 1024 * 1024,
            request_timeout_seconds: 30,
        };
        customize(&mut config);

        let state = AppState::new(store, config);
        let router: Router = create_router(state);

        let server = TestServer::new(router).expect("Failed to create test server");
        let test_user_id = UserId::generate();

        Self {
            server,
            _temp_dir: temp_dir,
            test_user_id,
        }
    }

    /// Get the authorization header for the harness test user.
    pub fn user_auth_header(&self) -> String {
        self.auth_header_for(&self.test_user_id)
    }

    /// Get the authorization header for a specific user.
    pub fn auth_header_for(&self, user_id: &UserId) -> String {
        format!("Bearer {}", mint_token(user_id))
    }

    /// Register an account for the harness test user.
    pub async fn create_account(&self) {
        self.server
            .post("/v1/accounts")
            .add_header("authorization", self.user_auth_header())
            .json(&serde_json::json!({}))
            .await
            .assert_status_ok();
    }

    /// Grant credits to the harness test user through the admin endpoint.
    pub async fn grant_credits(&self, amount: i64) {
        self.server
            .post("/v1/admin/credits")
            .add_header("x-admin-key", TEST_ADMIN_KEY)
            .json(&serde_json::json!({
                "account_id": self.test_user_id.to_string(),
                "amount": amount,
                "reason": "test grant"
            }))
            .await
            .assert_status_ok();
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

/// Mint a signed HS256 token for a user, valid for an hour.
pub fn mint_token(user_id: &UserId) -> String {
    let now = chrono::Utc::now().timestamp();
    let claims = JwtClaims {
        sub: user_id.to_string(),
        aud: "tryfit".into(),
        iss: "tryfit".into(),
        exp: now + 3600,
        iat: now,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(TEST_JWT_SECRET.as_bytes()),
    )
    .expect("Failed to mint test token")
}

// ============================================================================
// Provider spec builders
// ============================================================================

/// A Replicate registration pointed at a mock server.
pub fn replicate_spec(name: &str, base_url: &str, rank: u32) -> ProviderSpec {
    ProviderSpec {
        name: name.into(),
        kind: ProviderKind::Replicate,
        enabled: true,
        active: true,
        timeout_secs: Some(5),
        priorities: HashMap::from([(Category::UpperBody, rank)]),
        base_url: Some(base_url.into()),
        api_key: Some("test-token".into()),
        model: Some("test-version".into()),
    }
}

/// A Fal registration pointed at a mock server.
pub fn fal_spec(name: &str, base_url: &str, rank: u32) -> ProviderSpec {
    ProviderSpec {
        name: name.into(),
        kind: ProviderKind::Fal,
        enabled: true,
        active: true,
        timeout_secs: Some(5),
        priorities: HashMap::from([(Category::UpperBody, rank)]),
        base_url: Some(base_url.into()),
        api_key: Some("test-key".into()),
        model: Some("test-model".into()),
    }
}

/// A Gradio registration pointed at a mock server.
pub fn gradio_spec(name: &str, base_url: &str, rank: u32) -> ProviderSpec {
    ProviderSpec {
        name: name.into(),
        kind: ProviderKind::Gradio,
        enabled: true,
        active: true,
        timeout_secs: Some(5),
        priorities: HashMap::from([(Category::UpperBody, rank)]),
        base_url: Some(base_url.into()),
        api_key: None,
        model: None,
    }
}
