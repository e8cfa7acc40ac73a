//! # Error Types
//!
//! Errors raised while constructing core types from untrusted input.

use thiserror::Error;

/// Error building a core type from a raw string.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HyperSchemaError {
    /// The schema name is empty or contains characters outside the
    /// allowed set.
    #[error("invalid schema name '{name}': {reason}")]
    InvalidSchemaName {
        /// The rejected input.
        name: String,
        /// Why it was rejected.
        reason: &'static str,
    },

    /// The media type is not of the form `type/subtype`.
    #[error("invalid media type '{0}'")]
    InvalidMediaType(String),
}
