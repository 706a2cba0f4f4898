//! Ranked fallback across providers.
//!
//! The orchestrator asks the registry for an ordered candidate list and
//! gives each provider exactly one bounded attempt. A timeout, an API
//! error, and an output that yields no locator are all the same thing
//! from here: that attempt failed, move on. The first attempt that
//! produces a locator wins; running out of candidates is
//! [`OrchestratorError::AllProvidersFailed`].

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{info, warn};

use crate::extract::{extract_locator, ExtractError};
use crate::provider::{ProviderError, TryOnJob};
use crate::registry::{Candidate, ProviderRegistry, SelectError};

/// A successful generation.
#[derive(Debug, Clone)]
pub struct TryOnOutcome {
    /// Name of the provider that produced the result.
    pub provider: String,
    /// Canonical locator for the generated image.
    pub result_url: String,
    /// Whether a lower-ranked provider had to step in.
    pub fallback: bool,
    /// Wall time across all attempts, including failed ones.
    pub elapsed: Duration,
}

/// Orchestration failures.
#[derive(Debug, thiserror::Error)]
pub enum OrchestratorError {
    /// Candidate selection failed before any attempt was made.
    #[error(transparent)]
    Select(#[from] SelectError),

    /// Every candidate was attempted and none produced a result.
    #[error("all {attempts} provider(s) failed, last error: {last_error}")]
    AllProvidersFailed {
        /// How many providers were attempted.
        attempts: usize,
        /// The failure from the final attempt.
        last_error: String,
    },
}

/// One reason an individual attempt failed. Internal; surfaced only as the
/// `last_error` text of [`OrchestratorError::AllProvidersFailed`].
#[derive(Debug, thiserror::Error)]
enum AttemptError {
    #[error("timed out after {after:?}")]
    TimedOut { after: Duration },

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    Extraction(#[from] ExtractError),
}

/// Runs try-on jobs against the registry with ranked fallback.
pub struct Orchestrator {
    registry: Arc<ProviderRegistry>,
}

impl Orchestrator {
    /// Orchestrator over `registry`.
    #[must_use]
    pub fn new(registry: Arc<ProviderRegistry>) -> Self {
        Self { registry }
    }

    /// Run `job` to completion, falling back through ranked candidates.
    ///
    /// With `provider_override` set, only the named provider is attempted
    /// and ranking is bypassed. The override still respects the operator
    /// switch: a disabled provider is an error, not a silent fallback.
    ///
    /// # Errors
    ///
    /// Returns [`OrchestratorError::Select`] when no candidate can be
    /// chosen and [`OrchestratorError::AllProvidersFailed`] when every
    /// chosen candidate fails its one attempt.
    pub async fn process(
        &self,
        job: &TryOnJob,
        provider_override: Option<&str>,
    ) -> Result<TryOnOutcome, OrchestratorError> {
        let candidates = match provider_override {
            Some(name) => vec![self.registry.candidate_for(name)?],
            None => self.registry.select_candidates(job.category)?,
        };

        let started = Instant::now();
        let mut last_error = String::new();

        for (attempt, candidate) in candidates.iter().enumerate() {
            match Self::attempt(candidate, job).await {
                Ok(result_url) => {
                    let fallback = attempt > 0;
                    let elapsed = started.elapsed();
                    info!(
                        provider = %candidate.name,
                        fallback,
                        elapsed_ms = elapsed.as_millis() as u64,
                        "try-on generation succeeded"
                    );
                    return Ok(TryOnOutcome {
                        provider: candidate.name.clone(),
                        result_url,
                        fallback,
                        elapsed,
                    });
                }
                Err(err) => {
                    warn!(
                        provider = %candidate.name,
                        attempt = attempt + 1,
                        error = %err,
                        "try-on attempt failed"
                    );
                    last_error = err.to_string();
                }
            }
        }

        Err(OrchestratorError::AllProvidersFailed {
            attempts: candidates.len(),
            last_error,
        })
    }

    /// One bounded attempt: invoke the provider, then extract a locator.
    async fn attempt(candidate: &Candidate, job: &TryOnJob) -> Result<String, AttemptError> {
        let output = tokio::time::timeout(candidate.timeout, candidate.provider.generate(job))
            .await
            .map_err(|_| AttemptError::TimedOut {
                after: candidate.timeout,
            })??;

        Ok(extract_locator(output)?)
    }
}
