//! Replicate-protocol adapter.
//!
//! Uses the synchronous prediction flow: one `POST /v1/predictions` with a
//! `Prefer: wait` header, which holds the connection until the prediction
//! resolves. The response's `output` field goes to extraction as-is, since
//! models disagree about whether it is a string, an array, or an object.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::provider::{ProviderError, ProviderOutput, TryOnJob, TryOnProvider};

use super::expect_json;

const DEFAULT_BASE_URL: &str = "https://api.replicate.com";

/// Adapter for Replicate-hosted try-on models.
pub struct ReplicateProvider {
    name: String,
    client: reqwest::Client,
    base_url: String,
    api_token: String,
    version: String,
}

impl ReplicateProvider {
    /// Adapter for the model pinned by `version`.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        client: reqwest::Client,
        api_token: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            client,
            base_url: DEFAULT_BASE_URL.to_string(),
            api_token: api_token.into(),
            version: version.into(),
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
struct PredictionRequest<'a> {
    version: &'a str,
    input: PredictionInput<'a>,
}

#[derive(Serialize)]
struct PredictionInput<'a> {
    human_img: &'a str,
    garm_img: &'a str,
    category: &'a str,
}

#[derive(Deserialize)]
struct PredictionResponse {
    status: String,
    #[serde(default)]
    output: Option<Value>,
    #[serde(default)]
    error: Option<String>,
}

#[async_trait]
impl TryOnProvider for ReplicateProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn generate(&self, job: &TryOnJob) -> Result<ProviderOutput, ProviderError> {
        let request = PredictionRequest {
            version: &self.version,
            input: PredictionInput {
                human_img: &job.person_image,
                garm_img: &job.garment_image,
                category: job.category.as_str(),
            },
        };

        let response = self
            .client
            .post(format!("{}/v1/predictions", self.base_url))
            .bearer_auth(&self.api_token)
            .header("Prefer", "wait")
            .json(&request)
            .send()
            .await?;

        let prediction: PredictionResponse = expect_json(response).await?;

        if let Some(error) = prediction.error {
            return Err(ProviderError::BadResponse(format!(
                "prediction {}: {error}",
                prediction.status
            )));
        }

        match prediction.status.as_str() {
            "failed" | "canceled" => Err(ProviderError::BadResponse(format!(
                "prediction {}",
                prediction.status
            ))),
            _ => prediction.output.map(ProviderOutput::Structured).ok_or_else(|| {
                ProviderError::BadResponse(format!(
                    "prediction {} with no output",
                    prediction.status
                ))
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::extract_locator;
    use serde_json::json;
    use tryfit_core::Category;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn job() -> TryOnJob {
        TryOnJob {
            person_image: "https://in/person.jpg".into(),
            garment_image: "https://in/shirt.jpg".into(),
            category: Category::UpperBody,
        }
    }

    fn provider(server: &MockServer) -> ReplicateProvider {
        ReplicateProvider::new("replicate", reqwest::Client::new(), "r8_test", "abc123")
            .with_base_url(server.uri())
    }

    #[tokio::test]
    async fn posts_prediction_and_returns_output() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/predictions"))
            .and(header("authorization", "Bearer r8_test"))
            .and(header("prefer", "wait"))
            .and(body_partial_json(json!({
                "version": "abc123",
                "input": {
                    "human_img": "https://in/person.jpg",
                    "garm_img": "https://in/shirt.jpg",
                    "category": "upper_body",
                }
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "status": "succeeded",
                "output": ["https://replicate.delivery/out.png"],
            })))
            .expect(1)
            .mount(&server)
            .await;

        let output = provider(&server).generate(&job()).await.unwrap();
        assert_eq!(
            extract_locator(output).unwrap(),
            "https://replicate.delivery/out.png"
        );
    }

    #[tokio::test]
    async fn failed_prediction_is_a_bad_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/predictions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "failed",
                "error": "NSFW content detected",
            })))
            .mount(&server)
            .await;

        let err = provider(&server).generate(&job()).await.unwrap_err();
        match err {
            ProviderError::BadResponse(detail) => {
                assert!(detail.contains("NSFW"), "got: {detail}");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn succeeded_without_output_is_a_bad_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/predictions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "succeeded",
            })))
            .mount(&server)
            .await;

        let err = provider(&server).generate(&job()).await.unwrap_err();
        assert!(matches!(err, ProviderError::BadResponse(_)));
    }

    #[tokio::test]
    async fn non_success_status_is_an_api_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/predictions"))
            .respond_with(
                ResponseTemplate::new(402).set_body_string("{\"detail\":\"insufficient credit\"}"),
            )
            .mount(&server)
            .await;

        let err = provider(&server).generate(&job()).await.unwrap_err();
        match err {
            ProviderError::Api { status, detail } => {
                assert_eq!(status, 402);
                assert!(detail.contains("insufficient credit"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
