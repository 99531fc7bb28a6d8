pub mod config;
pub mod constants;
pub mod error;
pub mod logging;
pub mod metrics;

// Pure catalog types and rules
pub mod domain;

// Use cases and the ports they depend on
pub mod app;

// Adapters behind the ports
pub mod infra;
