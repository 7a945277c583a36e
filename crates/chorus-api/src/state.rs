//! Application state shared by the CLI commands and the REST API handlers.
//!
//! Holds the single user [`Session`] plus the conversation engine wired to
//! every enabled provider. The session sits behind a `tokio` mutex: a
//! generate request keeps it locked until the run finishes.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::Mutex;

use chorus_core::engine::{ConversationEngine, EngineSettings};
use chorus_core::llm::registry::ProviderRegistry;
use chorus_core::session::Session;
use chorus_infra::llm::build_provider_registry;
use chorus_infra::secret::EnvSecretProvider;
use chorus_types::config::GlobalConfig;

#[derive(Clone)]
pub struct AppState {
    pub session: Arc<Mutex<Session>>,
    pub engine: Arc<ConversationEngine>,
    pub config: Arc<GlobalConfig>,
    pub data_dir: PathBuf,
}

impl AppState {
    /// Read credentials for every enabled provider and wire the engine.
    ///
    /// Fails when an enabled provider has no API key in the environment.
    pub fn init(config: GlobalConfig, data_dir: PathBuf) -> anyhow::Result<Self> {
        let providers = build_provider_registry(&config, &EnvSecretProvider::new())?;
        Ok(Self::with_providers(config, providers, data_dir))
    }

    /// Build state around an already populated provider registry.
    pub fn with_providers(
        config: GlobalConfig,
        providers: ProviderRegistry,
        data_dir: PathBuf,
    ) -> Self {
        let engine = ConversationEngine::new(Arc::new(providers), EngineSettings::from(&config));
        let session = Session::new(config.initial_message.clone());
        Self {
            session: Arc::new(Mutex::new(session)),
            engine: Arc::new(engine),
            config: Arc::new(config),
            data_dir,
        }
    }
}
