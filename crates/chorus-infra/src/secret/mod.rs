//! Credential resolution.
//!
//! API keys come from the environment only; see [`env::EnvSecretProvider`].

pub mod env;

pub use env::EnvSecretProvider;
