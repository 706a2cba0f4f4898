//! Gradio-space adapter.
//!
//! Speaks the two-step queue protocol of a hosted Gradio app:
//! `POST {base}/call/{api}` enqueues the job and returns an `event_id`,
//! then `GET {base}/call/{api}/{event_id}` streams server-sent events until
//! the job resolves. The stream is buffered whole rather than parsed
//! incrementally; try-on spaces emit a handful of small events, so there is
//! nothing to gain from streaming parse complexity here. The `data:` line of
//! the `complete` event goes to extraction as a raw payload.

use async_trait::async_trait;
use futures::StreamExt;
use serde::{Deserialize, Serialize};

use crate::provider::{ProviderError, ProviderOutput, TryOnJob, TryOnProvider};

use super::{ensure_success, expect_json};

const DEFAULT_API_NAME: &str = "tryon";

/// Adapter for a hosted Gradio try-on space.
pub struct GradioProvider {
    name: String,
    client: reqwest::Client,
    space_url: String,
    api_name: String,
}

impl GradioProvider {
    /// Adapter for the space at `space_url`.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        client: reqwest::Client,
        space_url: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            client,
            space_url: space_url.into(),
            api_name: DEFAULT_API_NAME.to_string(),
        }
    }

    /// Call a different named endpoint on the space.
    #[must_use]
    pub fn with_api_name(mut self, api_name: impl Into<String>) -> Self {
        self.api_name = api_name.into();
        self
    }

    /// Buffer the event stream to completion.
    async fn collect_stream(response: reqwest::Response) -> Result<Vec<u8>, ProviderError> {
        let mut stream = response.bytes_stream();
        let mut buffer = Vec::new();
        while let Some(chunk) = stream.next().await {
            buffer.extend_from_slice(&chunk?);
        }
        Ok(buffer)
    }
}

#[derive(Serialize)]
struct CallRequest<'a> {
    data: [&'a str; 3],
}

#[derive(Deserialize)]
struct CallResponse {
    event_id: String,
}

/// Pull the `data:` payload of the final `complete` event out of a buffered
/// SSE body. An `error` event fails the attempt outright.
fn complete_payload(body: &str) -> Result<String, ProviderError> {
    let mut event = "message";
    let mut payload: Option<String> = None;

    for line in body.lines() {
        let line = line.trim_end_matches('\r');
        if let Some(name) = line.strip_prefix("event:") {
            event = name.trim();
        } else if let Some(data) = line.strip_prefix("data:") {
            match event {
                "complete" => payload = Some(data.trim().to_string()),
                "error" => {
                    return Err(ProviderError::BadResponse(format!(
                        "space job failed: {}",
                        data.trim()
                    )));
                }
                _ => {}
            }
        }
    }

    payload.ok_or_else(|| {
        ProviderError::BadResponse("event stream ended without a complete event".to_string())
    })
}

#[async_trait]
impl TryOnProvider for GradioProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn generate(&self, job: &TryOnJob) -> Result<ProviderOutput, ProviderError> {
        let request = CallRequest {
            data: [
                job.person_image.as_str(),
                job.garment_image.as_str(),
                job.category.as_str(),
            ],
        };

        let response = self
            .client
            .post(format!("{}/call/{}", self.space_url, self.api_name))
            .json(&request)
            .send()
            .await?;
        let call: CallResponse = expect_json(response).await?;

        let response = self
            .client
            .get(format!(
                "{}/call/{}/{}",
                self.space_url, self.api_name, call.event_id
            ))
            .send()
            .await?;
        let body = Self::collect_stream(ensure_success(response).await?).await?;
        let text = String::from_utf8_lossy(&body);

        Ok(ProviderOutput::Raw(complete_payload(&text)?.into_bytes()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::extract_locator;
    use serde_json::json;
    use tryfit_core::Category;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn job() -> TryOnJob {
        TryOnJob {
            person_image: "https://in/person.jpg".into(),
            garment_image: "https://in/dress.jpg".into(),
            category: Category::Dresses,
        }
    }

    #[tokio::test]
    async fn two_step_call_yields_complete_payload() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/call/tryon"))
            .and(body_json(json!({
                "data": ["https://in/person.jpg", "https://in/dress.jpg", "dresses"],
            })))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "event_id": "ev_42" })),
            )
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/call/tryon/ev_42"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                "event: generating\ndata: null\n\nevent: complete\ndata: [{\"url\": \"https://space/out.png\"}]\n\n",
            ))
            .expect(1)
            .mount(&server)
            .await;

        let provider = GradioProvider::new("gradio", reqwest::Client::new(), server.uri());
        let output = provider.generate(&job()).await.unwrap();
        assert_eq!(extract_locator(output).unwrap(), "https://space/out.png");
    }

    #[tokio::test]
    async fn error_event_fails_the_attempt() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/call/tryon"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "event_id": "ev_9" })),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/call/tryon/ev_9"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("event: error\ndata: \"GPU quota exceeded\"\n\n"),
            )
            .mount(&server)
            .await;

        let provider = GradioProvider::new("gradio", reqwest::Client::new(), server.uri());
        let err = provider.generate(&job()).await.unwrap_err();
        match err {
            ProviderError::BadResponse(detail) => {
                assert!(detail.contains("GPU quota"), "got: {detail}");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn stream_without_complete_event_fails() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/call/tryon"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "event_id": "ev_7" })),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/call/tryon/ev_7"))
            .respond_with(
                ResponseTemplate::new(200).set_body_string("event: heartbeat\ndata: null\n\n"),
            )
            .mount(&server)
            .await;

        let provider = GradioProvider::new("gradio", reqwest::Client::new(), server.uri());
        let err = provider.generate(&job()).await.unwrap_err();
        assert!(matches!(err, ProviderError::BadResponse(_)));
    }

    #[tokio::test]
    async fn custom_api_name_is_used() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/call/virtual_fit"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "event_id": "ev_1" })),
            )
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/call/virtual_fit/ev_1"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("event: complete\ndata: \"https://space/fit.png\"\n\n"),
            )
            .mount(&server)
            .await;

        let provider = GradioProvider::new("gradio", reqwest::Client::new(), server.uri())
            .with_api_name("virtual_fit");
        let output = provider.generate(&job()).await.unwrap();
        // The payload is a JSON string literal; decoding strips the quotes.
        assert_eq!(extract_locator(output).unwrap(), "https://space/fit.png");
    }

    #[test]
    fn complete_payload_ignores_unrelated_events() {
        let body = "event: open\ndata: hello\n\nevent: complete\ndata: [\"x\"]\n\n";
        assert_eq!(complete_payload(body).unwrap(), "[\"x\"]");
    }
}
