//! Environment variable secret provider.
//!
//! Reads provider API keys (`OPENAI_API_KEY`, `ANTHROPIC_API_KEY`) from the
//! process environment. Values are wrapped in [`SecretString`] as soon as
//! they are read and never logged.

use secrecy::SecretString;

use chorus_types::error::ConfigError;
use chorus_types::llm::ProviderType;

/// Looks up one variable; `None` when unset or not valid Unicode.
pub type VarLookup = fn(&str) -> Option<String>;

fn process_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Read-only secret provider backed by environment variables.
#[derive(Debug, Clone, Copy)]
pub struct EnvSecretProvider {
    lookup: VarLookup,
}

impl Default for EnvSecretProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl EnvSecretProvider {
    /// Reads the process environment.
    pub fn new() -> Self {
        Self {
            lookup: process_env,
        }
    }

    /// Reads variables through `lookup` instead of the process environment.
    pub fn with_lookup(lookup: VarLookup) -> Self {
        Self { lookup }
    }

    /// The value of `key`, if set to a non-blank string.
    pub fn get(&self, key: &str) -> Option<SecretString> {
        (self.lookup)(key)
            .filter(|val| !val.trim().is_empty())
            .map(SecretString::from)
    }

    /// The API key for `provider`, or [`ConfigError::MissingCredential`]
    /// naming the variable to set.
    pub fn require(&self, provider: ProviderType) -> Result<SecretString, ConfigError> {
        let env_var = provider.api_key_env();
        self.get(env_var).ok_or_else(|| ConfigError::MissingCredential {
            provider: provider.to_string(),
            env_var: env_var.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn test_env_provider_get_existing() {
        // SAFETY: The variable name is unique to this test.
        unsafe { std::env::set_var("CHORUS_TEST_SECRET_1", "test-value-123") };

        let provider = EnvSecretProvider::new();
        let value = provider.get("CHORUS_TEST_SECRET_1").unwrap();
        assert_eq!(value.expose_secret(), "test-value-123");

        // SAFETY: The var was just set above.
        unsafe { std::env::remove_var("CHORUS_TEST_SECRET_1") };
    }

    #[test]
    fn test_env_provider_blank_is_missing() {
        // SAFETY: The variable name is unique to this test.
        unsafe { std::env::set_var("CHORUS_TEST_SECRET_2", "   ") };
        assert!(EnvSecretProvider::new().get("CHORUS_TEST_SECRET_2").is_none());
        // SAFETY: The var was just set above.
        unsafe { std::env::remove_var("CHORUS_TEST_SECRET_2") };
    }

    #[test]
    fn test_env_provider_get_missing() {
        assert!(EnvSecretProvider::new().get("CHORUS_TEST_DEFINITELY_UNSET").is_none());
    }

    #[test]
    fn test_lookup_replaces_process_env() {
        let provider = EnvSecretProvider::with_lookup(|key| {
            (key == "OPENAI_API_KEY").then(|| "sk-injected".to_string())
        });
        let key = provider.require(ProviderType::OpenAi).unwrap();
        assert_eq!(key.expose_secret(), "sk-injected");
        assert!(provider.get("ANTHROPIC_API_KEY").is_none());
    }

    #[test]
    fn test_missing_credential_names_variable() {
        let provider = EnvSecretProvider::with_lookup(|_| None);
        match provider.require(ProviderType::Anthropic) {
            Err(ConfigError::MissingCredential { provider, env_var }) => {
                assert_eq!(provider, "anthropic");
                assert_eq!(env_var, "ANTHROPIC_API_KEY");
            }
            other => panic!("expected MissingCredential, got {other:?}"),
        }
    }
}
