//! Provider registry for runtime provider lookup.

use std::collections::HashMap;
use std::sync::Arc;

use chorus_types::bot::ModelId;
use chorus_types::llm::ProviderType;

use super::box_provider::BoxLlmProvider;

/// Registry of available LLM providers, indexed by backend type.
///
/// Providers are held behind `Arc` so a completion stream can own its
/// provider for as long as the stream lives.
pub struct ProviderRegistry {
    providers: HashMap<ProviderType, Arc<BoxLlmProvider>>,
}

impl ProviderRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            providers: HashMap::new(),
        }
    }

    /// Register a provider for the given backend type.
    ///
    /// If a provider for this type already exists, it is replaced.
    pub fn register(&mut self, provider_type: ProviderType, provider: BoxLlmProvider) {
        self.providers.insert(provider_type, Arc::new(provider));
    }

    /// Look up a provider by backend type.
    pub fn get(&self, provider_type: ProviderType) -> Option<Arc<BoxLlmProvider>> {
        self.providers.get(&provider_type).cloned()
    }

    /// The provider that serves `model`, if one is registered.
    pub fn for_model(&self, model: ModelId) -> Option<Arc<BoxLlmProvider>> {
        self.get(model.provider_type())
    }

    /// Models whose provider is registered.
    pub fn available_models(&self) -> Vec<ModelId> {
        ModelId::ALL
            .into_iter()
            .filter(|m| self.providers.contains_key(&m.provider_type()))
            .collect()
    }
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::new()
    }
}
