//! Service configuration.

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;

use tryfit_core::{Category, DEFAULT_FREE_TRIAL_LIMIT};

/// Pinned model version used by the default Replicate registration.
const DEFAULT_REPLICATE_VERSION: &str =
    "c871bb9b046607b680449ecbae55fd8c6d945e0a1948644bf2361b3d021d3ff4";

/// Model path used by the default Fal registration.
const DEFAULT_FAL_MODEL: &str = "fashn/tryon";

/// Service configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Address to listen on (default: "0.0.0.0:8184").
    pub listen_addr: String,

    /// Path to `RocksDB` data directory (default: "./data/tryfit").
    pub data_dir: String,

    /// Shared secret for HS256 user tokens.
    pub jwt_secret: String,

    /// Expected JWT issuer (default: "tryfit").
    pub jwt_issuer: String,

    /// Expected JWT audience (default: "tryfit").
    pub jwt_audience: String,

    /// Admin API key for operator endpoints.
    pub admin_api_key: Option<String>,

    /// HMAC secret for payment webhook signatures.
    pub payment_webhook_secret: Option<String>,

    /// Free-trial generations granted to new accounts.
    pub free_trial_limit: i64,

    /// Default per-attempt provider deadline in seconds.
    pub provider_timeout_seconds: u64,

    /// Provider registrations, from file or the built-in default set.
    pub providers: Vec<ProviderSpec>,

    /// CORS allowed origins.
    pub cors_origins: Vec<String>,

    /// Maximum request body size in bytes.
    pub max_body_bytes: usize,

    /// Request timeout in seconds. Covers the whole try-on fallback chain,
    /// so it should comfortably exceed the per-provider deadline.
    pub request_timeout_seconds: u64,
}

/// Which adapter protocol a provider registration speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    /// Replicate prediction API.
    Replicate,
    /// Hosted Gradio space queue protocol.
    Gradio,
    /// Fal blocking inference API.
    Fal,
}

/// One provider registration as configured.
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderSpec {
    /// Registration name; also the rank tie-break and admin handle.
    pub name: String,

    /// Adapter protocol.
    pub kind: ProviderKind,

    /// Operator switch.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Credential health; forced off when required credentials are missing.
    #[serde(default = "default_true")]
    pub active: bool,

    /// Per-attempt deadline override in seconds.
    #[serde(default)]
    pub timeout_secs: Option<u64>,

    /// Category ranks. Lower wins.
    #[serde(default)]
    pub priorities: HashMap<Category, u32>,

    /// API host override; required for Gradio (the space URL).
    #[serde(default)]
    pub base_url: Option<String>,

    /// API credential, where the protocol needs one.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Model identifier: Replicate version, Fal model path, or the Gradio
    /// endpoint name.
    #[serde(default)]
    pub model: Option<String>,
}

fn default_true() -> bool {
    true
}

impl ProviderSpec {
    /// Whether this registration has everything its protocol needs to make
    /// a real call.
    #[must_use]
    pub fn has_credentials(&self) -> bool {
        match self.kind {
            ProviderKind::Replicate | ProviderKind::Fal => {
                self.api_key.as_ref().is_some_and(|k| !k.is_empty())
                    && self.model.as_ref().is_some_and(|m| !m.is_empty())
            }
            ProviderKind::Gradio => self.base_url.as_ref().is_some_and(|u| !u.is_empty()),
        }
    }
}

impl ServiceConfig {
    /// Load configuration from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            listen_addr: env_or("TRYFIT_LISTEN_ADDR", "0.0.0.0:8184"),
            data_dir: env_or("TRYFIT_DATA_DIR", "./data/tryfit"),
            jwt_secret: env_or("TRYFIT_JWT_SECRET", "tryfit-dev-secret"),
            jwt_issuer: env_or("TRYFIT_JWT_ISSUER", "tryfit"),
            jwt_audience: env_or("TRYFIT_JWT_AUDIENCE", "tryfit"),
            admin_api_key: std::env::var("TRYFIT_ADMIN_KEY").ok(),
            payment_webhook_secret: std::env::var("TRYFIT_PAYMENT_WEBHOOK_SECRET").ok(),
            free_trial_limit: std::env::var("TRYFIT_FREE_TRIAL_LIMIT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_FREE_TRIAL_LIMIT),
            provider_timeout_seconds: std::env::var("TRYFIT_PROVIDER_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(90),
            providers: load_provider_specs(),
            cors_origins: env_or("TRYFIT_CORS_ORIGINS", "*")
                .split(',')
                .map(|s| s.trim().to_string())
                .collect(),
            max_body_bytes: std::env::var("TRYFIT_MAX_BODY_BYTES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(1024 * 1024), // 1MB
            request_timeout_seconds: std::env::var("TRYFIT_REQUEST_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(300),
        }
    }

    /// Whether the configured JWT secret is still the development default.
    #[must_use]
    pub fn uses_default_jwt_secret(&self) -> bool {
        self.jwt_secret == "tryfit-dev-secret"
    }
}

fn env_or(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.into())
}

/// Load provider registrations from `TRYFIT_PROVIDERS_FILE`, or fall back
/// to the built-in default set.
fn load_provider_specs() -> Vec<ProviderSpec> {
    if let Ok(path) = std::env::var("TRYFIT_PROVIDERS_FILE") {
        match load_providers_file(&path) {
            Ok(specs) => {
                tracing::info!(path = %path, count = specs.len(), "Loaded provider registrations from file");
                return specs;
            }
            Err(e) => {
                tracing::error!(path = %path, error = %e, "Failed to load providers file, using built-in defaults");
            }
        }
    }

    default_provider_specs()
}

/// Parse a providers file: a JSON array of registrations.
fn load_providers_file(path: &str) -> Result<Vec<ProviderSpec>, std::io::Error> {
    let path = Path::new(path);
    if !path.exists() {
        return Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "Providers file not found",
        ));
    }
    let contents = std::fs::read_to_string(path)?;
    serde_json::from_str(&contents)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
}

/// The built-in registrations, credentialed from the environment. Entries
/// missing a credential stay in the list; the registry marks them inactive
/// so they still show up in the admin snapshot.
fn default_provider_specs() -> Vec<ProviderSpec> {
    vec![
        ProviderSpec {
            name: "replicate-idm-vton".into(),
            kind: ProviderKind::Replicate,
            enabled: true,
            active: true,
            timeout_secs: None,
            priorities: HashMap::from([(Category::UpperBody, 1)]),
            base_url: None,
            api_key: std::env::var("REPLICATE_API_TOKEN").ok(),
            model: Some(DEFAULT_REPLICATE_VERSION.into()),
        },
        ProviderSpec {
            name: "fal-fashn".into(),
            kind: ProviderKind::Fal,
            enabled: true,
            active: true,
            timeout_secs: None,
            priorities: HashMap::from([(Category::UpperBody, 2)]),
            base_url: None,
            api_key: std::env::var("FAL_API_KEY").ok(),
            model: Some(DEFAULT_FAL_MODEL.into()),
        },
        ProviderSpec {
            name: "gradio-space".into(),
            kind: ProviderKind::Gradio,
            enabled: true,
            active: true,
            timeout_secs: None,
            priorities: HashMap::from([(Category::UpperBody, 3)]),
            base_url: std::env::var("TRYFIT_GRADIO_SPACE_URL").ok(),
            api_key: None,
            model: None,
        },
    ]
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8184".into(),
            data_dir: "./data/tryfit".into(),
            jwt_secret: "tryfit-dev-secret".into(),
            jwt_issuer: "tryfit".into(),
            jwt_audience: "tryfit".into(),
            admin_api_key: None,
            payment_webhook_secret: None,
            free_trial_limit: DEFAULT_FREE_TRIAL_LIMIT,
            provider_timeout_seconds: 90,
            providers: Vec::new(),
            cors_origins: vec!["*".into()],
            max_body_bytes: 1024 * 1024,
            request_timeout_seconds: 300,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_spec_parses_from_json() {
        let raw = r#"{
            "name": "replicate-main",
            "kind": "replicate",
            "priorities": { "upper_body": 1, "dresses": 2 },
            "api_key": "r8_xxx",
            "model": "abc123"
        }"#;
        let spec: ProviderSpec = serde_json::from_str(raw).unwrap();

        assert_eq!(spec.name, "replicate-main");
        assert_eq!(spec.kind, ProviderKind::Replicate);
        assert!(spec.enabled);
        assert!(spec.active);
        assert_eq!(spec.priorities.get(&Category::UpperBody), Some(&1));
        assert_eq!(spec.priorities.get(&Category::Dresses), Some(&2));
        assert!(spec.has_credentials());
    }

    #[test]
    fn credentials_check_per_kind() {
        let mut spec: ProviderSpec = serde_json::from_str(
            r#"{ "name": "fal", "kind": "fal", "api_key": "k", "model": "m" }"#,
        )
        .unwrap();
        assert!(spec.has_credentials());

        spec.api_key = None;
        assert!(!spec.has_credentials());

        let gradio: ProviderSpec = serde_json::from_str(
            r#"{ "name": "space", "kind": "gradio", "base_url": "https://host" }"#,
        )
        .unwrap();
        assert!(gradio.has_credentials());

        let bare: ProviderSpec =
            serde_json::from_str(r#"{ "name": "space", "kind": "gradio" }"#).unwrap();
        assert!(!bare.has_credentials());
    }

    #[test]
    fn default_config_is_usable() {
        let config = ServiceConfig::default();
        assert_eq!(config.listen_addr, "0.0.0.0:8184");
        assert_eq!(config.free_trial_limit, DEFAULT_FREE_TRIAL_LIMIT);
        assert!(config.uses_default_jwt_secret());
    }
}
