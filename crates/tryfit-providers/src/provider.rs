//! The provider seam.
//!
//! Every upstream image-generation backend implements [`TryOnProvider`]: one
//! inference call taking two image references and a category, returning raw
//! output in whatever shape that backend produces. Normalizing the output to
//! a locator is the extraction module's job, and retries across providers are
//! the orchestrator's; an adapter makes exactly one attempt.

use async_trait::async_trait;
use serde_json::Value;

use tryfit_core::Category;

/// A try-on request as seen by providers.
#[derive(Debug, Clone)]
pub struct TryOnJob {
    /// HTTPS reference to the person image.
    pub person_image: String,

    /// HTTPS reference to the garment image.
    pub garment_image: String,

    /// Garment placement, forwarded to the model.
    pub category: Category,
}

/// Raw output shapes a provider call may produce.
///
/// The four variants match what the upstream APIs actually return: a bare
/// URL, an array of URLs (first is canonical), a buffered stream payload
/// that still needs decoding, or a structured body to probe field by field.
#[derive(Debug, Clone)]
pub enum ProviderOutput {
    /// A single result locator.
    Locator(String),

    /// Several locators; the first element is the canonical result.
    Locators(Vec<String>),

    /// A buffered stream payload (e.g. the data line of an SSE response).
    Raw(Vec<u8>),

    /// A structured body to probe for a locator.
    Structured(Value),
}

/// Errors from a single provider attempt.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// Transport-level failure (connect, TLS, body read).
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The provider answered with a non-success status.
    #[error("HTTP {status}: {detail}")]
    Api {
        /// Upstream status code.
        status: u16,
        /// Body snippet for the logs.
        detail: String,
    },

    /// The provider answered 2xx but the payload is unusable.
    #[error("unusable response: {0}")]
    BadResponse(String),
}

/// One try-on inference call against an external backend.
#[async_trait]
pub trait TryOnProvider: Send + Sync {
    /// Unique provider name, used for ranking tables and history records.
    fn name(&self) -> &str;

    /// Run one try-on inference. No internal retries.
    async fn generate(&self, job: &TryOnJob) -> Result<ProviderOutput, ProviderError>;
}
