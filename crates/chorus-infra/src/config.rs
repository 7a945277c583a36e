//! Configuration and roster file loading.
//!
//! Reads `config.toml` from the data directory (`~/.chorus/` in production)
//! and deserializes it into [`GlobalConfig`]. Falls back to sensible defaults
//! when the file is missing or malformed.
//!
//! Roster files list the bots for a one-shot CLI run:
//!
//! ```toml
//! [[bots]]
//! name = "Ada"
//! model = "gpt-4o-mini"
//! prompt = "An optimistic inventor"
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;

use chorus_types::bot::CreateBotRequest;
use chorus_types::config::GlobalConfig;
use chorus_types::error::ConfigError;

/// Resolve the data directory from environment or platform defaults.
///
/// Priority:
/// 1. `CHORUS_HOME` environment variable
/// 2. `~/.chorus`
pub fn resolve_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("CHORUS_HOME") {
        return PathBuf::from(dir);
    }

    if let Some(home) = dirs::home_dir() {
        return home.join(".chorus");
    }

    // Last resort: current directory
    PathBuf::from(".chorus")
}

/// Load global configuration from `{data_dir}/config.toml`.
///
/// - If the file does not exist, returns [`GlobalConfig::default()`].
/// - If the file exists but fails to parse, logs a warning and returns the default.
/// - If the file exists and parses successfully, returns the parsed config.
pub async fn load_global_config(data_dir: &Path) -> GlobalConfig {
    let config_path = data_dir.join("config.toml");

    let content = match tokio::fs::read_to_string(&config_path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config.toml found at {}, using defaults", config_path.display());
            return GlobalConfig::default();
        }
        Err(err) => {
            tracing::warn!("Failed to read {}: {err}, using defaults", config_path.display());
            return GlobalConfig::default();
        }
    };

    match toml::from_str::<GlobalConfig>(&content) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!(
                "Failed to parse {}: {err}, using defaults",
                config_path.display()
            );
            GlobalConfig::default()
        }
    }
}

#[derive(Debug, Deserialize)]
struct RosterFile {
    #[serde(default)]
    bots: Vec<CreateBotRequest>,
}

/// Read the bot roster at `path`.
///
/// Unlike `config.toml`, a roster is explicit user input: read and parse
/// failures are returned rather than replaced with defaults.
pub async fn load_roster(path: &Path) -> Result<Vec<CreateBotRequest>, ConfigError> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;

    let roster: RosterFile = toml::from_str(&content).map_err(|e| ConfigError::Parse {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    tracing::debug!(bots = roster.bots.len(), path = %path.display(), "roster loaded");
    Ok(roster.bots)
}
