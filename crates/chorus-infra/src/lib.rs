//! Infrastructure layer for Chorus.
//!
//! Concrete LLM providers implementing the traits defined in `chorus-core`,
//! environment-variable credential resolution, and `config.toml` / roster
//! file loading.

pub mod config;
pub mod llm;
pub mod secret;
