//! HTTP request handlers for the REST API.

pub mod bot;
pub mod conversation;
pub mod history;

#[cfg(test)]
pub(crate) use test_support::test_state;
