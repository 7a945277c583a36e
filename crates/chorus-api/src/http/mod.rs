//! HTTP/REST API layer for Chorus.
//!
//! Axum-based JSON API at `/api/v1/` with envelope responses and CORS
//! support. Every user-facing session control has a route.

pub mod error;
pub mod handlers;
pub mod response;
pub mod router;
