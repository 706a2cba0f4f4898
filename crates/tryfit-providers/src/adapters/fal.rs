//! Fal-protocol adapter.
//!
//! Single blocking call: `POST {base}/{model}` with `Authorization: Key`
//! credentials. The whole response body goes to extraction as structured
//! output; the usual shape is `{"images": [{"url": ...}]}`, which the
//! nested-object probe resolves.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use crate::provider::{ProviderError, ProviderOutput, TryOnJob, TryOnProvider};

use super::expect_json;

const DEFAULT_BASE_URL: &str = "https://fal.run";

/// Adapter for Fal-hosted try-on models.
pub struct FalProvider {
    name: String,
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl FalProvider {
    /// Adapter for the endpoint at `{base}/{model}`.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        client: reqwest::Client,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            client,
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: api_key.into(),
            model: model.into(),
        }
    }

    /// Point the adapter at a different API host.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[derive(Serialize)]
struct FalRequest<'a> {
    model_image: &'a str,
    garment_image: &'a str,
    category: &'a str,
}

#[async_trait]
impl TryOnProvider for FalProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn generate(&self, job: &TryOnJob) -> Result<ProviderOutput, ProviderError> {
        let request = FalRequest {
            model_image: &job.person_image,
            garment_image: &job.garment_image,
            category: job.category.as_str(),
        };

        let response = self
            .client
            .post(format!("{}/{}", self.base_url, self.model))
            .header("Authorization", format!("Key {}", self.api_key))
            .json(&request)
            .send()
            .await?;

        let body: Value = expect_json(response).await?;
        Ok(ProviderOutput::Structured(body))
    }
}
