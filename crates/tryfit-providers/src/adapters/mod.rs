//! HTTP adapters for hosted try-on backends.
//!
//! Each adapter speaks one vendor protocol and normalizes the response into
//! a [`ProviderOutput`](crate::provider::ProviderOutput); locator extraction
//! happens later, in the orchestrator. The adapter name is its registration
//! key, so a deployment can point two registrations at the same protocol
//! with different models or hosts.

mod fal;
mod gradio;
mod replicate;

pub use fal::FalProvider;
pub use gradio::GradioProvider;
pub use replicate::ReplicateProvider;

use serde::de::DeserializeOwned;

use crate::provider::ProviderError;

/// Longest error-body excerpt carried into [`ProviderError::Api`].
const DETAIL_LIMIT: usize = 200;

/// Map a non-2xx response to [`ProviderError::Api`], keeping a short body
/// excerpt for the logs.
async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, ProviderError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let detail = snippet(&response.text().await.unwrap_or_default());
    Err(ProviderError::Api {
        status: status.as_u16(),
        detail,
    })
}

/// Decode a JSON body after the status check.
async fn expect_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ProviderError> {
    Ok(ensure_success(response).await?.json().await?)
}

fn snippet(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.len() <= DETAIL_LIMIT {
        return trimmed.to_string();
    }
    let mut end = DETAIL_LIMIT;
    while !trimmed.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &trimmed[..end])
}
