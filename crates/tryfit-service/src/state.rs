//! Shared application state.

use std::sync::Arc;
use std::time::Duration;

use tryfit_providers::{
    FalProvider, GradioProvider, Orchestrator, ProviderRegistry, Registration, ReplicateProvider,
    TryOnProvider,
};
use tryfit_store::RocksStore;

use crate::config::{ProviderKind, ProviderSpec, ServiceConfig};

/// Outbound HTTP connect timeout for provider calls.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Shared application state, cloned per request.
#[derive(Clone)]
pub struct AppState {
    /// Persistent store for accounts, ledger entries, and generations.
    pub store: Arc<RocksStore>,

    /// Provider registry; admin handlers flip its flags at runtime.
    pub registry: Arc<ProviderRegistry>,

    /// Fallback-chain executor over the registry.
    pub orchestrator: Arc<Orchestrator>,

    /// Service configuration.
    pub config: ServiceConfig,
}

impl AppState {
    /// Wire up the state from an opened store and loaded configuration.
    ///
    /// Providers named in the config are built here. A registration whose
    /// credentials are missing is kept in the registry but marked inactive,
    /// so it still shows up in the admin snapshot.
    #[must_use]
    pub fn new(store: RocksStore, config: ServiceConfig) -> Self {
        let client = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        let mut registry = ProviderRegistry::new();
        for spec in &config.providers {
            let provider = build_provider(spec, &client);

            let has_credentials = spec.has_credentials();
            if !has_credentials {
                tracing::warn!(
                    provider = %spec.name,
                    "Provider is missing credentials, registering as inactive"
                );
            }

            let timeout = Duration::from_secs(
                spec.timeout_secs.unwrap_or(config.provider_timeout_seconds),
            );
            let mut registration = Registration::new(provider, timeout)
                .with_enabled(spec.enabled)
                .with_active(spec.active && has_credentials);
            for (category, rank) in &spec.priorities {
                registration = registration.with_priority(*category, *rank);
            }
            registry.register(registration);
        }

        if registry.is_empty() {
            tracing::warn!("No providers configured, try-on requests will be rejected");
        }

        let registry = Arc::new(registry);
        let orchestrator = Arc::new(Orchestrator::new(Arc::clone(&registry)));

        Self {
            store: Arc::new(store),
            registry,
            orchestrator,
            config,
        }
    }
}

fn build_provider(spec: &ProviderSpec, client: &reqwest::Client) -> Arc<dyn TryOnProvider> {
    match spec.kind {
        ProviderKind::Replicate => {
            let mut provider = ReplicateProvider::new(
                spec.name.clone(),
                client.clone(),
                spec.api_key.clone().unwrap_or_default(),
                spec.model.clone().unwrap_or_default(),
            );
            if let Some(url) = &spec.base_url {
                provider = provider.with_base_url(url.clone());
            }
            Arc::new(provider)
        }
        ProviderKind::Gradio => {
            let mut provider = GradioProvider::new(
                spec.name.clone(),
                client.clone(),
                spec.base_url.clone().unwrap_or_default(),
            );
            if let Some(endpoint) = &spec.model {
                provider = provider.with_api_name(endpoint.clone());
            }
            Arc::new(provider)
        }
        ProviderKind::Fal => {
            let mut provider = FalProvider::new(
                spec.name.clone(),
                client.clone(),
                spec.api_key.clone().unwrap_or_default(),
                spec.model.clone().unwrap_or_default(),
            );
            if let Some(url) = &spec.base_url {
                provider = provider.with_base_url(url.clone());
            }
            Arc::new(provider)
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tryfit_core::Category;

    fn spec(name: &str, kind: ProviderKind) -> ProviderSpec {
        ProviderSpec {
            name: name.into(),
            kind,
            enabled: true,
            active: true,
            timeout_secs: None,
            priorities: HashMap::from([(Category::UpperBody, 1)]),
            base_url: Some("https://host.test".into()),
            api_key: Some("key".into()),
            model: Some("model".into()),
        }
    }

    #[test]
    fn wires_configured_providers() {
        let dir = tempfile::tempdir().unwrap();
        let store = RocksStore::open(dir.path()).unwrap();
        let config = ServiceConfig {
            providers: vec![
                spec("replicate", ProviderKind::Replicate),
                spec("space", ProviderKind::Gradio),
            ],
            ..ServiceConfig::default()
        };

        let state = AppState::new(store, config);
        assert_eq!(state.registry.len(), 2);
        let statuses = state.registry.statuses();
        assert!(statuses.iter().all(|s| s.enabled && s.active));
    }

    #[test]
    fn missing_credentials_registers_inactive() {
        let dir = tempfile::tempdir().unwrap();
        let store = RocksStore::open(dir.path()).unwrap();
        let mut bare = spec("fal", ProviderKind::Fal);
        bare.api_key = None;
        let config = ServiceConfig {
            providers: vec![bare],
            ..ServiceConfig::default()
        };

        let state = AppState::new(store, config);
        let statuses = state.registry.statuses();
        assert_eq!(statuses.len(), 1);
        assert!(statuses[0].enabled);
        assert!(!statuses[0].active);
    }

    #[test]
    fn spec_timeout_overrides_default() {
        let dir = tempfile::tempdir().unwrap();
        let store = RocksStore::open(dir.path()).unwrap();
        let mut custom = spec("replicate", ProviderKind::Replicate);
        custom.timeout_secs = Some(7);
        let config = ServiceConfig {
            providers: vec![custom, spec("space", ProviderKind::Gradio)],
            provider_timeout_seconds: 90,
            ..ServiceConfig::default()
        };

        let state = AppState::new(store, config);
        let statuses = state.registry.statuses();
        let replicate = statuses.iter().find(|s| s.name == "replicate").unwrap();
        let space = statuses.iter().find(|s| s.name == "space").unwrap();
        assert_eq!(replicate.timeout_secs, 7);
        assert_eq!(space.timeout_secs, 90);
    }
}
