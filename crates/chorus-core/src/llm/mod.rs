//! LLM provider abstractions for Chorus.
//!
//! - `LlmProvider`: RPITIT trait for concrete provider implementations
//! - `BoxLlmProvider`: Object-safe wrapper for dynamic dispatch
//! - `ProviderRegistry`: backend lookup by model

pub mod box_provider;
pub mod provider;
pub mod registry;

#[cfg(test)]
pub(crate) mod mock;
