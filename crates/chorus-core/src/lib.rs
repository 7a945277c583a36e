//! Business logic for Chorus.
//!
//! Everything here is provider-agnostic: concrete LLM backends implement
//! [`llm::provider::LlmProvider`] in `chorus-infra` and are handed in through
//! a [`llm::registry::ProviderRegistry`]. Depends only on `chorus-types`.

pub mod completion;
pub mod engine;
pub mod format;
pub mod history;
pub mod llm;
pub mod registry;
pub mod session;
