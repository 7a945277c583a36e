//! Type-erased provider handle kept in the [`ProviderRegistry`].
//!
//! [`LlmProvider::complete`] returns `impl Future`, so `dyn LlmProvider` is not
//! possible. Only the two calls need erasing: a provider's name and
//! capabilities never change, so the handle copies them out once when it is
//! built.
//!
//! [`ProviderRegistry`]: super::registry::ProviderRegistry

use std::future::Future;
use std::pin::Pin;

use futures_util::Stream;

use chorus_types::llm::{
    CompletionRequest, CompletionResponse, LlmError, ProviderCapabilities, StreamEvent,
};

use super::provider::LlmProvider;

type ReplyFuture<'a> =
    Pin<Box<dyn Future<Output = Result<CompletionResponse, LlmError>> + Send + 'a>>;

/// Provider events, as returned by [`LlmProvider::stream`].
pub type EventStream = Pin<Box<dyn Stream<Item = Result<StreamEvent, LlmError>> + Send + 'static>>;

/// The object-safe half of [`LlmProvider`].
trait ErasedCalls: Send + Sync {
    fn complete_erased<'a>(&'a self, request: &'a CompletionRequest) -> ReplyFuture<'a>;

    fn stream_erased(&self, request: CompletionRequest) -> EventStream;
}

impl<P: LlmProvider> ErasedCalls for P {
    fn complete_erased<'a>(&'a self, request: &'a CompletionRequest) -> ReplyFuture<'a> {
        Box::pin(self.complete(request))
    }

    fn stream_erased(&self, request: CompletionRequest) -> EventStream {
        self.stream(request)
    }
}

/// A provider chosen at runtime from the model a bot uses.
pub struct BoxLlmProvider {
    name: String,
    capabilities: ProviderCapabilities,
    calls: Box<dyn ErasedCalls>,
}

impl BoxLlmProvider {
    pub fn new<P: LlmProvider + 'static>(provider: P) -> Self {
        Self {
            name: provider.name().to_string(),
            capabilities: provider.capabilities().clone(),
            calls: Box::new(provider),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn capabilities(&self) -> &ProviderCapabilities {
        &self.capabilities
    }

    pub async fn complete(
        &self,
        request: &CompletionRequest,
    ) -> Result<CompletionResponse, LlmError> {
        self.calls.complete_erased(request).await
    }

    pub fn stream(&self, request: CompletionRequest) -> EventStream {
        self.calls.stream_erased(request)
    }
}
