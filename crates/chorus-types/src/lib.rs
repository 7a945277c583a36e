//! Shared domain types for Chorus.
//!
//! This crate contains the domain types used across the workspace:
//! bots, transcripts, saved history, LLM request/stream shapes,
//! configuration and their associated error types.
//!
//! Zero infrastructure dependencies -- only serde, uuid, chrono, thiserror.

pub mod bot;
pub mod config;
pub mod error;
pub mod llm;
pub mod transcript;
