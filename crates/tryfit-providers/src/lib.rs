//! Provider registry, selection, and generation orchestration for tryfit.
//!
//! This crate owns the generation side of the platform:
//!
//! - **Provider seam**: [`TryOnProvider`], one try-on inference call behind a
//!   trait, with adapters for the upstream APIs we speak to
//! - **Registry**: [`ProviderRegistry`], the configured provider set with
//!   per-category ranking and operator-togglable flags
//! - **Orchestrator**: [`Orchestrator`], which walks the ranked candidates
//!   with a per-provider timeout and reports which provider served a request
//! - **Extraction**: [`extract_locator`], the ordered strategies that turn a
//!   provider's raw output into a result URL
//!
//! The crate is deliberately account-blind: debiting happens in the service
//! layer after an orchestrated generation succeeds.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod adapters;
pub mod extract;
pub mod orchestrator;
pub mod provider;
pub mod registry;

pub use adapters::{FalProvider, GradioProvider, ReplicateProvider};
pub use extract::{extract_locator, ExtractError, PROBE_FIELDS};
pub use orchestrator::{Orchestrator, OrchestratorError, TryOnOutcome};
pub use provider::{ProviderError, ProviderOutput, TryOnJob, TryOnProvider};
pub use registry::{
    Candidate, ProviderFlags, ProviderRegistry, ProviderStatus, Registration, SelectError,
    DEFAULT_RANK_CATEGORY,
};

#[cfg(test)]
pub(crate) mod testing {
    //! Stub providers shared by registry and orchestrator tests.

    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;

    use crate::provider::{ProviderError, ProviderOutput, TryOnJob, TryOnProvider};

    enum Mode {
        Succeed(ProviderOutput),
        Fail(String),
        Slow(Duration, ProviderOutput),
    }

    pub(crate) struct StubProvider {
        name: String,
        mode: Mode,
        calls: AtomicUsize,
    }

    impl StubProvider {
        pub(crate) fn ok(name: &str, url: &str) -> Self {
            Self::with_output(name, ProviderOutput::Locator(url.to_string()))
        }

        pub(crate) fn with_output(name: &str, output: ProviderOutput) -> Self {
            Self {
                name: name.to_string(),
                mode: Mode::Succeed(output),
                calls: AtomicUsize::new(0),
            }
        }

        pub(crate) fn failing(name: &str, message: &str) -> Self {
            Self {
                name: name.to_string(),
                mode: Mode::Fail(message.to_string()),
                calls: AtomicUsize::new(0),
            }
        }

        pub(crate) fn slow(name: &str, delay: Duration, url: &str) -> Self {
            Self {
                name: name.to_string(),
                mode: Mode::Slow(delay, ProviderOutput::Locator(url.to_string())),
                calls: AtomicUsize::new(0),
            }
        }

        pub(crate) fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl TryOnProvider for StubProvider {
        fn name(&self) -> &str {
            &self.name
        }

        async fn generate(&self, _job: &TryOnJob) -> Result<ProviderOutput, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.mode {
                Mode::Succeed(output) => Ok(output.clone()),
                Mode::Fail(message) => Err(ProviderError::BadResponse(message.clone())),
                Mode::Slow(delay, output) => {
                    tokio::time::sleep(*delay).await;
                    Ok(output.clone())
                }
            }
        }
    }
}
