//! OpenAI-compatible streaming adapter.
//!
//! One [`OpenAiCompatAdapter`] serves any endpoint speaking the OpenAI
//! chat-completion protocol (OpenAI itself, local gateways, proxies) through
//! a configurable base URL. Requests are sent with `stream: true` and the
//! SSE body is mapped by [`streaming::map_sse_stream`].

pub mod streaming;
pub mod types;

use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use secrecy::{ExposeSecret, SecretString};

use agentdesk_core::provider::adapter::{AdapterStream, AdapterTurn, ExecuteOptions, ProviderAdapter};
use agentdesk_types::llm::{AdapterCapabilities, AdapterError, SamplingParams};

use self::streaming::map_sse_stream;
use self::types::{ChatMessage, ChatRequest, ContentPart, ImageUrl, MessageContent};

/// Default endpoint when a provider entry does not set `base_url`.
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Adapter for a hosted chat-completion API.
///
/// Does NOT derive Debug: the API key must never reach log output.
pub struct OpenAiCompatAdapter {
    client: reqwest::Client,
    name: String,
    base_url: String,
    model: String,
    api_key: Option<Arc<SecretString>>,
    capabilities: AdapterCapabilities,
}

impl OpenAiCompatAdapter {
    pub fn new(
        name: impl Into<String>,
        base_url: impl Into<String>,
        model: impl Into<String>,
        api_key: Option<SecretString>,
        supports_images: bool,
    ) -> Result<Self, AdapterError> {
        // No overall timeout: a streamed turn may legitimately run for minutes.
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| AdapterError::Configuration(format!("HTTP client: {e}")))?;

        Ok(Self {
            client,
            name: name.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            api_key: api_key.map(Arc::new),
            capabilities: AdapterCapabilities {
                images: supports_images,
                resume: false,
                tool_events: true,
            },
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Request body for one turn. Images ride on the user message as
    /// `image_url` data-URL parts.
    pub fn build_request(
        &self,
        turn: &AdapterTurn,
        sampling: &SamplingParams,
    ) -> Result<ChatRequest, AdapterError> {
        let content = if turn.images.is_empty() {
            MessageContent::Text(turn.message.clone())
        } else {
            if !self.capabilities.images {
                return Err(AdapterError::ImagesUnsupported {
                    adapter: self.name.clone(),
                });
            }
            let mut parts = vec![ContentPart::Text {
                text: turn.message.clone(),
            }];
            parts.extend(turn.images.iter().map(|image| ContentPart::ImageUrl {
                image_url: ImageUrl {
                    url: image.data_url(),
                },
            }));
            MessageContent::Parts(parts)
        };

        Ok(ChatRequest {
            model: sampling.model.clone().unwrap_or_else(|| self.model.clone()),
            messages: vec![ChatMessage {
                role: "user",
                content,
            }],
            stream: true,
            temperature: sampling.temperature,
            max_tokens: sampling.max_tokens,
        })
    }
}

// OpenAiCompatAdapter intentionally does NOT derive Debug; see the struct docs.

/// Map a non-success HTTP status to an adapter error.
fn status_error(status: u16, retry_after: Option<&str>, body: &str) -> AdapterError {
    match status {
        401 | 403 => AdapterError::AuthenticationFailed,
        429 => AdapterError::RateLimited {
            retry_after_ms: retry_after
                .and_then(|v| v.trim().parse::<u64>().ok())
                .map(|secs| secs * 1000),
        },
        _ => AdapterError::Provider {
            message: format!("HTTP {status}: {body}"),
        },
    }
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, AdapterError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let retry_after = response
        .headers()
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let body = response.text().await.unwrap_or_default();
    Err(status_error(status.as_u16(), retry_after.as_deref(), &body))
}

impl ProviderAdapter for OpenAiCompatAdapter {
    fn name(&self) -> &str {
        &self.name
    }

    fn capabilities(&self) -> &AdapterCapabilities {
        &self.capabilities
    }

    async fn check_available(&self) -> Result<(), AdapterError> {
        let mut request = self.client.get(self.url("/models"));
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key.expose_secret());
        }
        let response = request.send().await.map_err(|e| AdapterError::Provider {
            message: format!("HTTP request failed: {e}"),
        })?;
        check_status(response).await.map(|_| ())
    }

    fn execute(&self, turn: AdapterTurn, options: ExecuteOptions) -> AdapterStream {
        let body = self.build_request(&turn, &options.sampling);
        let url = self.url("/chat/completions");
        let client = self.client.clone();
        let api_key = self.api_key.clone();
        let cancel = options.cancel.clone();
        let session_id = turn.session_id.clone();
        if options.debug {
            tracing::debug!(adapter = %self.name, url = %url, images = turn.images.len(), "opening completion stream");
        }

        Box::pin(async_stream::try_stream! {
            let body = body?;
            let mut request = client.post(&url).json(&body);
            if let Some(key) = &api_key {
                request = request.bearer_auth(key.expose_secret());
            }

            let response = tokio::select! {
                biased;
                _ = cancel.cancelled() => Err(AdapterError::Aborted),
                sent = request.send() => sent.map_err(|e| AdapterError::Provider {
                    message: format!("HTTP request failed: {e}"),
                }),
            }?;
            let response = check_status(response).await?;

            let mut fragments = map_sse_stream(response.bytes_stream(), session_id, cancel);
            while let Some(fragment) = fragments.next().await {
                yield fragment?;
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agentdesk_types::chat::ImageAttachment;

    fn adapter(supports_images: bool) -> OpenAiCompatAdapter {
        OpenAiCompatAdapter::new(
            "openai",
            "https://api.example.com/v1/",
            "gpt-4o-mini",
            Some(SecretString::from("test-key-not-real")),
            supports_images,
        )
        .unwrap()
    }

    fn turn(images: Vec<ImageAttachment>) -> AdapterTurn {
        AdapterTurn {
            message: "describe".to_string(),
            session_id: Some("s1".to_string()),
            working_context: None,
            images,
        }
    }

    fn png() -> ImageAttachment {
        ImageAttachment {
            media_type: "image/png".to_string(),
            data: "AAAA".to_string(),
        }
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let a = adapter(false);
        assert_eq!(a.base_url(), "https://api.example.com/v1");
        assert_eq!(a.url("/chat/completions"), "https://api.example.com/v1/chat/completions");
        assert!(!a.capabilities().resume);
    }

    #[test]
    fn test_build_request_text_only() {
        let sampling = SamplingParams {
            model: None,
            temperature: Some(0.2),
            max_tokens: Some(100),
        };
        let request = adapter(false).build_request(&turn(Vec::new()), &sampling).unwrap();
        assert_eq!(request.model, "gpt-4o-mini");
        assert!(request.stream);
        assert_eq!(request.temperature, Some(0.2));
        assert!(matches!(request.messages[0].content, MessageContent::Text(ref t) if t == "describe"));
    }

    #[test]
    fn test_build_request_attaches_images() {
        let sampling = SamplingParams {
            model: Some("gpt-4o".to_string()),
            ..Default::default()
        };
        let request = adapter(true).build_request(&turn(vec![png()]), &sampling).unwrap();
        assert_eq!(request.model, "gpt-4o");
        match &request.messages[0].content {
            MessageContent::Parts(parts) => {
                assert_eq!(parts.len(), 2);
                assert!(matches!(
                    &parts[1],
                    ContentPart::ImageUrl { image_url } if image_url.url == "data:image/png;base64,AAAA"
                ));
            }
            other => panic!("expected parts, got {other:?}"),
        }
    }

    #[test]
    fn test_build_request_rejects_images_when_negated() {
        let err = adapter(false)
            .build_request(&turn(vec![png()]), &SamplingParams::default())
            .unwrap_err();
        assert!(matches!(err, AdapterError::ImagesUnsupported { .. }));
        assert!(!adapter(false).supports_images());
    }

    #[test]
    fn test_status_error_mapping() {
        assert!(matches!(status_error(401, None, ""), AdapterError::AuthenticationFailed));
        assert!(matches!(
            status_error(429, Some("3"), ""),
            AdapterError::RateLimited {
                retry_after_ms: Some(3000)
            }
        ));
        match status_error(500, None, "boom") {
            AdapterError::Provider { message } => assert_eq!(message, "HTTP 500: boom"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_cancelled_before_send() {
        let a = adapter(false);
        let options = ExecuteOptions::default();
        options.cancel.cancel();
        let out: Vec<_> = a.execute(turn(Vec::new()), options).collect().await;
        assert!(matches!(out.as_slice(), [Err(AdapterError::Aborted)]));
    }

    #[tokio::test]
    async fn test_images_unsupported_surfaces_in_stream() {
        let out: Vec<_> = adapter(false)
            .execute(turn(vec![png()]), ExecuteOptions::default())
            .collect()
            .await;
        assert!(matches!(out.as_slice(), [Err(AdapterError::ImagesUnsupported { .. })]));
    }
}
