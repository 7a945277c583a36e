//! LLM provider implementations.
//!
//! Contains concrete implementations of the [`LlmProvider`] trait defined in
//! `chorus-core`: Anthropic Messages API and OpenAI chat completions.
//!
//! Also provides a provider factory ([`create_provider`]) and
//! [`build_provider_registry`], which wires every enabled provider with its
//! credentials at startup.
//!
//! [`LlmProvider`]: chorus_core::llm::provider::LlmProvider

pub mod anthropic;
pub mod openai;

use secrecy::SecretString;

use chorus_core::llm::box_provider::BoxLlmProvider;
use chorus_core::llm::registry::ProviderRegistry;
use chorus_types::config::GlobalConfig;
use chorus_types::error::ConfigError;
use chorus_types::llm::{LlmError, ProviderType};

use crate::secret::EnvSecretProvider;

use self::anthropic::AnthropicProvider;
use self::openai::OpenAiProvider;

/// Create a [`BoxLlmProvider`] for `provider_type`.
///
/// `base_url` overrides the provider's public endpoint (proxies, local mocks).
pub fn create_provider(
    provider_type: ProviderType,
    api_key: &SecretString,
    base_url: Option<&str>,
) -> Result<BoxLlmProvider, LlmError> {
    match provider_type {
        ProviderType::Anthropic => {
            let mut provider = AnthropicProvider::new(api_key.clone())?;
            if let Some(base_url) = base_url {
                provider = provider.with_base_url(base_url);
            }
            Ok(BoxLlmProvider::new(provider))
        }
        ProviderType::OpenAi => Ok(BoxLlmProvider::new(OpenAiProvider::new(api_key, base_url))),
    }
}

/// Build the registry of every provider enabled in `config`.
///
/// Fails fast with [`ConfigError::MissingCredential`] when an enabled
/// provider's API key is not set.
pub fn build_provider_registry(
    config: &GlobalConfig,
    secrets: &EnvSecretProvider,
) -> Result<ProviderRegistry, ConfigError> {
    let mut registry = ProviderRegistry::new();
    for &provider_type in &config.enabled_providers {
        let api_key = secrets.require(provider_type)?;
        let base_url = config.endpoints.for_provider(provider_type);
        let provider = create_provider(provider_type, &api_key, base_url).map_err(|e| {
            ConfigError::ProviderInit {
                provider: provider_type.to_string(),
                message: e.to_string(),
            }
        })?;
        tracing::info!(provider = %provider_type, base_url = ?base_url, "provider registered");
        registry.register(provider_type, provider);
    }
    Ok(registry)
}
