use thiserror::Error;

use crate::bot::ModelId;

/// Bad or missing user input. Nothing is changed when one is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("maximum number of bots (5) reached, delete a bot to add a new one")]
    RegistryFull,

    #[error("please provide a name for the bot")]
    EmptyName,

    #[error("please provide a prompt for the bot")]
    EmptyPrompt,

    #[error("a bot named '{0}' already exists")]
    DuplicateName(String),

    #[error("please add at least two bots before generating a conversation")]
    NotEnoughBots,

    #[error("the number of iterations must be at least 1")]
    ZeroIterations,

    #[error("no provider is configured for model '{0}'")]
    UnsupportedModel(ModelId),

    #[error("there is no conversation to continue")]
    EmptyConversation,
}

/// Errors from session operations.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("bot not found")]
    BotNotFound,

    #[error("history entry {0} not found")]
    HistoryNotFound(usize),
}

/// Errors raised while loading configuration and credentials at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{env_var} is not set; it is required for the {provider} provider")]
    MissingCredential {
        provider: String,
        env_var: String,
    },

    #[error("failed to read {path}: {message}")]
    Read { path: String, message: String },

    #[error("failed to parse {path}: {message}")]
    Parse { path: String, message: String },

    #[error("failed to set up the {provider} provider: {message}")]
    ProviderInit { provider: String, message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_display() {
        let err = ValidationError::DuplicateName("Ada".to_string());
        assert_eq!(err.to_string(), "a bot named 'Ada' already exists");
        assert!(ValidationError::RegistryFull.to_string().contains('5'));
    }

    #[test]
    fn test_unsupported_model_names_model() {
        let err = ValidationError::UnsupportedModel(ModelId::Claude35Sonnet);
        assert!(err.to_string().contains("claude-3-5-sonnet-20240620"));
    }

    #[test]
    fn test_session_error_wraps_validation() {
        let err: SessionError = ValidationError::NotEnoughBots.into();
        assert!(matches!(err, SessionError::Validation(ValidationError::NotEnoughBots)));
        assert_eq!(
            err.to_string(),
            "please add at least two bots before generating a conversation"
        );
    }

    #[test]
    fn test_missing_credential_display() {
        let err = ConfigError::MissingCredential {
            provider: "openai".to_string(),
            env_var: "OPENAI_API_KEY".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "OPENAI_API_KEY is not set; it is required for the openai provider"
        );
    }
}
