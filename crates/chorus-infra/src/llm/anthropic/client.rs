//! AnthropicProvider -- concrete [`LlmProvider`] implementation for Anthropic Claude.
//!
//! Sends requests to the Anthropic Messages API (`/v1/messages`) with the
//! system prompt in the top-level `system` field. Replies are fetched whole;
//! `stream` delivers the finished reply as a single text delta.
//!
//! The API key is wrapped in [`secrecy::SecretString`] and is never logged
//! or included in `Debug` output.

use std::pin::Pin;
use std::time::Duration;

use futures_util::Stream;
use secrecy::{ExposeSecret, SecretString};

use chorus_core::llm::provider::LlmProvider;
use chorus_types::llm::{
    CompletionRequest, CompletionResponse, LlmError, ProviderCapabilities, RoleProtocol,
    StopReason, StreamEvent, Usage,
};

use super::types::{
    AnthropicContentBlock, AnthropicErrorResponse, AnthropicMessage, AnthropicRequest,
    AnthropicResponse,
};

/// Anthropic Claude LLM provider.
///
/// # API Key Security
///
/// The API key is stored as a [`SecretString`] and is only exposed when
/// constructing HTTP request headers.
pub struct AnthropicProvider {
    client: reqwest::Client,
    api_key: SecretString,
    base_url: String,
    capabilities: ProviderCapabilities,
}

impl AnthropicProvider {
    /// The Anthropic API version header value.
    const API_VERSION: &'static str = "2023-06-01";
    const DEFAULT_BASE_URL: &'static str = "https://api.anthropic.com";

    pub fn new(api_key: SecretString) -> Result<Self, LlmError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .map_err(|e| LlmError::Provider {
                message: format!("failed to create HTTP client: {e}"),
            })?;

        Ok(Self {
            client,
            api_key,
            base_url: Self::DEFAULT_BASE_URL.to_string(),
            capabilities: ProviderCapabilities {
                streaming: false,
                role_protocol: RoleProtocol::Alternating,
                max_output_tokens: 8_192,
            },
        })
    }

    /// Override the base URL (useful for testing or proxies).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Build the full API URL for a given path.
    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Convert a generic [`CompletionRequest`] into an [`AnthropicRequest`].
    ///
    /// System-role messages are folded into the top-level `system` field;
    /// the API rejects them inside `messages`.
    fn to_anthropic_request(request: &CompletionRequest) -> AnthropicRequest {
        let mut system = request.system.clone();
        let mut messages = Vec::with_capacity(request.messages.len());
        for m in &request.messages {
            if m.role == chorus_types::llm::MessageRole::System {
                system = Some(match system {
                    Some(s) => format!("{s}\n\n{}", m.content),
                    None => m.content.clone(),
                });
                continue;
            }
            messages.push(AnthropicMessage {
                role: m.role.to_string(),
                content: m.content.clone(),
            });
        }

        AnthropicRequest {
            model: request.model.clone(),
            max_tokens: request.max_tokens,
            messages,
            system,
            temperature: request.temperature,
        }
    }
}

/// Map a non-2xx response to an [`LlmError`].
fn status_error(status: reqwest::StatusCode, body: &str) -> LlmError {
    let message = serde_json::from_str::<AnthropicErrorResponse>(body)
        .map(|e| e.error.message)
        .unwrap_or_else(|_| body.to_string());
    match status.as_u16() {
        400 => LlmError::InvalidRequest(message),
        401 | 403 => LlmError::AuthenticationFailed,
        429 => LlmError::RateLimited {
            retry_after_ms: None,
        },
        529 => LlmError::Overloaded(message),
        _ => LlmError::Provider {
            message: format!("HTTP {status}: {message}"),
        },
    }
}

/// Turn a Messages API response into a [`CompletionResponse`].
fn into_completion(resp: AnthropicResponse) -> CompletionResponse {
    let content = resp
        .content
        .iter()
        .filter_map(|block| match block {
            AnthropicContentBlock::Text { text } => Some(text.as_str()),
            AnthropicContentBlock::Other => None,
        })
        .collect::<String>();

    let stop_reason = match resp.stop_reason.as_deref() {
        Some("max_tokens") => StopReason::MaxTokens,
        Some("stop_sequence") => StopReason::StopSequence,
        _ => StopReason::EndTurn,
    };

    CompletionResponse {
        id: resp.id,
        content,
        model: resp.model,
        stop_reason,
        usage: Usage {
            input_tokens: resp.usage.input_tokens,
            output_tokens: resp.usage.output_tokens,
        },
    }
}

async fn send(
    client: &reqwest::Client,
    url: &str,
    api_key: &SecretString,
    body: &AnthropicRequest,
) -> Result<CompletionResponse, LlmError> {
    let response = client
        .post(url)
        .header("x-api-key", api_key.expose_secret())
        .header("anthropic-version", AnthropicProvider::API_VERSION)
        .header("content-type", "application/json")
        .json(body)
        .send()
        .await
        .map_err(|e| LlmError::Provider {
            message: format!("HTTP request failed: {e}"),
        })?;

    let status = response.status();
    if !status.is_success() {
        let error_body = response.text().await.unwrap_or_default();
        return Err(status_error(status, &error_body));
    }

    let resp: AnthropicResponse = response
        .json()
        .await
        .map_err(|e| LlmError::Deserialization(format!("failed to parse response: {e}")))?;
    Ok(into_completion(resp))
}

// No Debug: keeps the key and client internals out of logs.

impl LlmProvider for AnthropicProvider {
    fn name(&self) -> &str {
        "anthropic"
    }

    fn capabilities(&self) -> &ProviderCapabilities {
        &self.capabilities
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let body = Self::to_anthropic_request(request);
        tracing::debug!(messages = body.messages.len(), model = %body.model, "anthropic request");
        send(&self.client, &self.url("/v1/messages"), &self.api_key, &body).await
    }

    fn stream(
        &self,
        request: CompletionRequest,
    ) -> Pin<Box<dyn Stream<Item = Result<StreamEvent, LlmError>> + Send + 'static>> {
        let body = Self::to_anthropic_request(&request);
        let client = self.client.clone();
        let url = self.url("/v1/messages");
        let api_key = self.api_key.clone();

        Box::pin(async_stream::stream! {
            match send(&client, &url, &api_key, &body).await {
                Ok(response) => {
                    yield Ok(StreamEvent::Connected);
                    yield Ok(StreamEvent::TextDelta { text: response.content });
                    yield Ok(StreamEvent::MessageDelta { stop_reason: response.stop_reason });
                    yield Ok(StreamEvent::Usage(response.usage));
                    yield Ok(StreamEvent::Done);
                }
                Err(e) => yield Err(e),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chorus_types::llm::Message;

    fn make_provider() -> AnthropicProvider {
        AnthropicProvider::new(SecretString::from("test-key-not-real")).unwrap()
    }

    #[test]
    fn test_provider_name_and_capabilities() {
        let provider = make_provider();
        assert_eq!(provider.name(), "anthropic");
        let caps = provider.capabilities();
        assert!(!caps.streaming);
        assert_eq!(caps.role_protocol, RoleProtocol::Alternating);
    }

    #[test]
    fn test_to_anthropic_request() {
        let request = CompletionRequest {
            model: "claude-3-5-sonnet-20240620".to_string(),
            messages: vec![Message::user("Hello"), Message::assistant("Hi")],
            system: Some("Be helpful".to_string()),
            max_tokens: 150,
            temperature: Some(0.7),
            stream: false,
        };

        let anthropic_req = AnthropicProvider::to_anthropic_request(&request);
        assert_eq!(anthropic_req.model, "claude-3-5-sonnet-20240620");
        assert_eq!(anthropic_req.max_tokens, 150);
        assert_eq!(anthropic_req.messages.len(), 2);
        assert_eq!(anthropic_req.messages[0].role, "user");
        assert_eq!(anthropic_req.messages[1].role, "assistant");
        assert_eq!(anthropic_req.system.as_deref(), Some("Be helpful"));
    }

    #[test]
    fn test_system_messages_move_to_system_field() {
        let request = CompletionRequest {
            model: "claude-3-5-sonnet-20240620".to_string(),
            messages: vec![Message::system("Stay in role"), Message::user("Hello")],
            system: None,
            max_tokens: 150,
            temperature: None,
            stream: false,
        };

        let anthropic_req = AnthropicProvider::to_anthropic_request(&request);
        assert_eq!(anthropic_req.system.as_deref(), Some("Stay in role"));
        assert_eq!(anthropic_req.messages.len(), 1);
    }

    #[test]
    fn test_base_url_override() {
        let provider = make_provider().with_base_url("http://localhost:8080/");
        assert_eq!(provider.url("/v1/messages"), "http://localhost:8080/v1/messages");
    }

    #[test]
    fn test_status_error_mapping() {
        let body = r#"{"type":"error","error":{"type":"invalid_request_error","message":"messages: roles must alternate"}}"#;
        match status_error(reqwest::StatusCode::BAD_REQUEST, body) {
            LlmError::InvalidRequest(msg) => assert_eq!(msg, "messages: roles must alternate"),
            other => panic!("unexpected error: {other}"),
        }
        assert!(matches!(
            status_error(reqwest::StatusCode::UNAUTHORIZED, ""),
            LlmError::AuthenticationFailed
        ));
        assert!(matches!(
            status_error(reqwest::StatusCode::TOO_MANY_REQUESTS, ""),
            LlmError::RateLimited { .. }
        ));
        match status_error(reqwest::StatusCode::INTERNAL_SERVER_ERROR, "boom") {
            LlmError::Provider { message } => assert!(message.contains("boom")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_into_completion_joins_text_blocks() {
        let resp = AnthropicResponse {
            id: "msg_1".to_string(),
            content: vec![
                AnthropicContentBlock::Text {
                    text: "Hello ".to_string(),
                },
                AnthropicContentBlock::Other,
                AnthropicContentBlock::Text {
                    text: "world".to_string(),
                },
            ],
            model: "claude-3-5-sonnet-20240620".to_string(),
            stop_reason: Some("max_tokens".to_string()),
            usage: Default::default(),
        };
        let completion = into_completion(resp);
        assert_eq!(completion.content, "Hello world");
        assert_eq!(completion.stop_reason, StopReason::MaxTokens);
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_surfaces_provider_error() {
        use futures_util::StreamExt;

        let provider = make_provider().with_base_url("http://127.0.0.1:9");
        let request = CompletionRequest {
            model: "claude-3-5-sonnet-20240620".to_string(),
            messages: vec![Message::user("Hello")],
            system: None,
            max_tokens: 150,
            temperature: None,
            stream: false,
        };
        let events: Vec<_> = provider.stream(request).collect().await;
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], Err(LlmError::Provider { .. })));
    }
}
