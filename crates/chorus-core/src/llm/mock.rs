//! Scripted in-memory provider used by the core test suites.

use std::collections::VecDeque;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use futures_util::Stream;

use chorus_types::llm::{
    CompletionRequest, CompletionResponse, LlmError, ProviderCapabilities, RoleProtocol,
    StopReason, StreamEvent, Usage,
};

use super::provider::LlmProvider;

/// What the mock does for one call.
#[derive(Debug, Clone)]
pub(crate) enum Reply {
    /// Answer with the full text.
    Text(String),
    /// Stream the given chunks (non-streaming calls get them concatenated).
    Chunks(Vec<String>),
    /// Fail before producing anything.
    Fail(String),
    /// Stream the given chunks, then fail.
    FailAfter(Vec<String>, String),
}

/// Requests seen by a [`MockProvider`], shared with the test.
pub(crate) type RequestLog = Arc<Mutex<Vec<CompletionRequest>>>;

pub(crate) struct MockProvider {
    name: String,
    capabilities: ProviderCapabilities,
    replies: Mutex<VecDeque<Reply>>,
    requests: RequestLog,
}

impl MockProvider {
    pub(crate) fn new(name: &str, streaming: bool, role_protocol: RoleProtocol) -> Self {
        Self {
            name: name.to_string(),
            capabilities: ProviderCapabilities {
                streaming,
                role_protocol,
                max_output_tokens: 4096,
            },
            replies: Mutex::new(VecDeque::new()),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Free-form, streaming provider (OpenAI-like).
    pub(crate) fn freeform() -> Self {
        Self::new("mock-freeform", true, RoleProtocol::Freeform)
    }

    /// Alternating, non-streaming provider (Anthropic-like).
    pub(crate) fn alternating() -> Self {
        Self::new("mock-alternating", false, RoleProtocol::Alternating)
    }

    pub(crate) fn with_replies(self, replies: impl IntoIterator<Item = Reply>) -> Self {
        self.replies.lock().unwrap().extend(replies);
        self
    }

    pub(crate) fn with_max_output_tokens(mut self, max: u32) -> Self {
        self.capabilities.max_output_tokens = max;
        self
    }

    pub(crate) fn request_log(&self) -> RequestLog {
        Arc::clone(&self.requests)
    }

    /// Record the request and pick the scripted reply.
    ///
    /// With an empty script the mock answers `"{name} reply {n}"`.
    fn next_reply(&self, request: &CompletionRequest) -> Reply {
        let mut requests = self.requests.lock().unwrap();
        requests.push(request.clone());
        let n = requests.len();
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Reply::Text(format!("{} reply {n}", self.name)))
    }
}

impl LlmProvider for MockProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn capabilities(&self) -> &ProviderCapabilities {
        &self.capabilities
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let content = match self.next_reply(request) {
            Reply::Text(text) => text,
            Reply::Chunks(chunks) => chunks.concat(),
            Reply::Fail(message) | Reply::FailAfter(_, message) => {
                return Err(LlmError::Provider { message });
            }
        };
        Ok(CompletionResponse {
            id: "msg_mock".to_string(),
            content,
            model: request.model.clone(),
            stop_reason: StopReason::EndTurn,
            usage: Usage::default(),
        })
    }

    fn stream(
        &self,
        request: CompletionRequest,
    ) -> Pin<Box<dyn Stream<Item = Result<StreamEvent, LlmError>> + Send + 'static>> {
        let mut events: Vec<Result<StreamEvent, LlmError>> = vec![Ok(StreamEvent::Connected)];
        let text_events = |chunks: Vec<String>| {
            chunks
                .into_iter()
                .map(|text| Ok(StreamEvent::TextDelta { text }))
                .collect::<Vec<_>>()
        };
        match self.next_reply(&request) {
            Reply::Text(text) => events.extend(text_events(vec![text])),
            Reply::Chunks(chunks) => events.extend(text_events(chunks)),
            Reply::Fail(message) => {
                events.push(Err(LlmError::Stream(message)));
                return Box::pin(futures_util::stream::iter(events));
            }
            Reply::FailAfter(chunks, message) => {
                events.extend(text_events(chunks));
                events.push(Err(LlmError::Stream(message)));
                return Box::pin(futures_util::stream::iter(events));
            }
        }
        events.push(Ok(StreamEvent::MessageDelta {
            stop_reason: StopReason::EndTurn,
        }));
        events.push(Ok(StreamEvent::Done));
        Box::pin(futures_util::stream::iter(events))
    }
}
