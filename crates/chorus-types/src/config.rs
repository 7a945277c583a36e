//! Global configuration types for Chorus.
//!
//! `GlobalConfig` represents the top-level `config.toml` that controls
//! generation limits, conversation defaults and provider endpoints.

use serde::{Deserialize, Serialize};

use crate::llm::ProviderType;

/// Top-level configuration for Chorus.
///
/// Loaded from `~/.chorus/config.toml`. All fields have sensible defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GlobalConfig {
    /// Cap on generated tokens for every provider call.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Rounds generated when the user does not say otherwise.
    #[serde(default = "default_iterations")]
    pub default_iterations: u32,

    /// Seed message the first bot of a fresh conversation receives.
    #[serde(default = "default_initial_message")]
    pub initial_message: String,

    /// Providers whose credentials must be present at startup.
    #[serde(default = "default_enabled_providers")]
    pub enabled_providers: Vec<ProviderType>,

    /// Optional per-provider endpoint overrides (proxies, local mocks).
    #[serde(default)]
    pub endpoints: EndpointOverrides,

    /// Export spans to stdout through OpenTelemetry.
    #[serde(default)]
    pub otel: bool,
}

fn default_max_tokens() -> u32 {
    150
}

fn default_iterations() -> u32 {
    3
}

fn default_initial_message() -> String {
    "start".to_string()
}

fn default_enabled_providers() -> Vec<ProviderType> {
    vec![ProviderType::OpenAi, ProviderType::Anthropic]
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            max_tokens: default_max_tokens(),
            default_iterations: default_iterations(),
            initial_message: default_initial_message(),
            enabled_providers: default_enabled_providers(),
            endpoints: EndpointOverrides::default(),
            otel: false,
        }
    }
}

/// Base URL overrides, keyed by provider.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EndpointOverrides {
    pub openai: Option<String>,
    pub anthropic: Option<String>,
}

impl EndpointOverrides {
    pub fn for_provider(&self, provider: ProviderType) -> Option<&str> {
        match provider {
            ProviderType::OpenAi => self.openai.as_deref(),
            ProviderType::Anthropic => self.anthropic.as_deref(),
        }
    }
}
