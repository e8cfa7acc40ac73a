//! # Middleware
//!
//! Tower layers shared by the schema server.

pub mod metrics;
pub mod tracing_layer;
