//! Observability setup for Chorus: structured logging and optional
//! OpenTelemetry span export.

pub mod tracing_setup;
