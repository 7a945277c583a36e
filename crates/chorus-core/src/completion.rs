//! Completion client: one provider call, surfaced as progressive text.
//!
//! Streaming providers yield an update per text delta; non-streaming ones
//! yield a single update with the whole reply. Provider failures never escape
//! as errors. They become the reply text `"An error occurred: {details}"`, so
//! a failed turn still lands in the transcript and the conversation carries on.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures_util::{Stream, StreamExt};
use pin_project_lite::pin_project;
use tracing::{debug, info_span, warn};

use chorus_types::llm::{CompletionRequest, LlmError, StreamEvent};

use crate::llm::box_provider::BoxLlmProvider;

/// Progress of one completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionUpdate {
    /// Text added since the previous update.
    pub delta: String,
    /// Everything received so far. The last update holds the final reply.
    pub text: String,
    /// Set when the provider failed and `text` is the error message.
    pub is_error: bool,
}

impl CompletionUpdate {
    fn failed(err: &LlmError) -> Self {
        let text = error_text(err);
        Self {
            delta: text.clone(),
            text,
            is_error: true,
        }
    }
}

pub type CompletionStream = Pin<Box<dyn Stream<Item = CompletionUpdate> + Send + 'static>>;

/// The transcript text a failed provider call is replaced with.
pub fn error_text(err: &LlmError) -> String {
    format!("An error occurred: {err}")
}

/// Run `request` against `provider`.
///
/// The stream always yields at least one update. After an error update it
/// ends; any partial text streamed before the failure is discarded.
pub fn complete(provider: Arc<BoxLlmProvider>, request: CompletionRequest) -> CompletionStream {
    let streaming = provider.capabilities().streaming;
    let span = if streaming {
        info_span!(
            "gen_ai.stream",
            gen_ai.provider.name = provider.name(),
            gen_ai.request.model = %request.model,
            gen_ai.request.max_tokens = request.max_tokens,
            gen_ai.request.temperature = ?request.temperature,
        )
    } else {
        info_span!(
            "gen_ai.complete",
            gen_ai.provider.name = provider.name(),
            gen_ai.request.model = %request.model,
            gen_ai.request.max_tokens = request.max_tokens,
            gen_ai.request.temperature = ?request.temperature,
        )
    };

    let updates = async_stream::stream! {
        if !streaming {
            match provider.complete(&request).await {
                Ok(response) => {
                    debug!(
                        input_tokens = response.usage.input_tokens,
                        output_tokens = response.usage.output_tokens,
                        stop_reason = %response.stop_reason,
                        "completion finished"
                    );
                    yield CompletionUpdate {
                        delta: response.content.clone(),
                        text: response.content,
                        is_error: false,
                    };
                }
                Err(e) => {
                    warn!(error = %e, "completion failed");
                    yield CompletionUpdate::failed(&e);
                }
            }
            return;
        }

        let mut events = provider.stream(CompletionRequest { stream: true, ..request });
        let mut text = String::new();
        let mut yielded = false;
        while let Some(event) = events.next().await {
            match event {
                Ok(StreamEvent::TextDelta { text: delta }) => {
                    if delta.is_empty() {
                        continue;
                    }
                    text.push_str(&delta);
                    yielded = true;
                    yield CompletionUpdate {
                        delta,
                        text: text.clone(),
                        is_error: false,
                    };
                }
                Ok(StreamEvent::Usage(usage)) => {
                    debug!(
                        input_tokens = usage.input_tokens,
                        output_tokens = usage.output_tokens,
                        "completion usage"
                    );
                }
                Ok(StreamEvent::Done) => break,
                Ok(_) => {}
                Err(e) => {
                    warn!(error = %e, partial_len = text.len(), "completion stream failed");
                    yield CompletionUpdate::failed(&e);
                    return;
                }
            }
        }

        if !yielded {
            yield CompletionUpdate {
                delta: String::new(),
                text,
                is_error: false,
            };
        }
    };

    Box::pin(StreamInSpan {
        inner: updates,
        span,
    })
}

pin_project! {
    /// Enters `span` every time the inner stream is polled, so provider
    /// logging is attributed to the completion.
    struct StreamInSpan<S> {
        #[pin]
        inner: S,
        span: tracing::Span,
    }
}

impl<S: Stream> Stream for StreamInSpan<S> {
    type Item = S::Item;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.project();
        let _enter = this.span.enter();
        this.inner.poll_next(cx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::mock::{MockProvider, Reply};
    use chorus_types::llm::Message;

    fn request() -> CompletionRequest {
        CompletionRequest {
            model: "gpt-4o-mini".to_string(),
            messages: vec![Message::user("Hello")],
            system: None,
            max_tokens: 150,
            temperature: None,
            stream: false,
        }
    }

    async fn collect(provider: MockProvider) -> Vec<CompletionUpdate> {
        complete(Arc::new(BoxLlmProvider::new(provider)), request())
            .collect()
            .await
    }

    #[tokio::test]
    async fn streaming_yields_growing_text() {
        let provider = MockProvider::freeform()
            .with_replies([Reply::Chunks(vec!["Hi".into(), " there".into()])]);
        let updates = collect(provider).await;

        assert_eq!(updates.len(), 2);
        assert_eq!(updates[0].delta, "Hi");
        assert_eq!(updates[0].text, "Hi");
        assert_eq!(updates[1].delta, " there");
        assert_eq!(updates[1].text, "Hi there");
        assert!(updates.iter().all(|u| !u.is_error));
    }

    #[tokio::test]
    async fn streaming_sets_stream_flag_on_request() {
        let provider = MockProvider::freeform();
        let log = provider.request_log();
        collect(provider).await;
        assert!(log.lock().unwrap()[0].stream);
    }

    #[tokio::test]
    async fn non_streaming_yields_single_update() {
        let provider = MockProvider::alternating().with_replies([Reply::Text("Howdy".into())]);
        let log = provider.request_log();
        let updates = collect(provider).await;

        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].text, "Howdy");
        assert!(!log.lock().unwrap()[0].stream);
    }

    #[tokio::test]
    async fn failure_becomes_error_text() {
        let provider = MockProvider::alternating()
            .with_replies([Reply::Fail("network unreachable".into())]);
        let updates = collect(provider).await;

        assert_eq!(updates.len(), 1);
        assert!(updates[0].is_error);
        assert!(updates[0].text.starts_with("An error occurred: "));
        assert!(updates[0].text.contains("network unreachable"));
    }

    #[tokio::test]
    async fn mid_stream_failure_replaces_partial_text() {
        let provider = MockProvider::freeform().with_replies([Reply::FailAfter(
            vec!["partial".into()],
            "connection reset".into(),
        )]);
        let updates = collect(provider).await;

        let last = updates.last().unwrap();
        assert!(last.is_error);
        assert!(!last.text.contains("partial"));
        assert!(last.text.contains("connection reset"));
    }

    #[tokio::test]
    async fn empty_stream_still_yields_once() {
        let provider = MockProvider::freeform().with_replies([Reply::Chunks(vec![])]);
        let updates = collect(provider).await;

        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].text, "");
        assert!(!updates[0].is_error);
    }

    #[test]
    fn error_text_format() {
        let err = LlmError::Provider {
            message: "boom".into(),
        };
        assert_eq!(error_text(&err), "An error occurred: provider error: boom");
    }
}
