//! # hs-core — Foundational Types for hyperschema
//!
//! Leaf crate of the workspace. Every other `hs-*` crate depends on it;
//! it depends on nothing internal.
//!
//! ## Key Design Principles
//!
//! 1. **Newtype wrappers for identifiers.** A [`SchemaName`] can only be
//!    built through a validated constructor, so a name taken from a URL
//!    segment can never escape the schema directory.
//!
//! 2. **Normalized media types.** [`MediaType`] holds the lowercased
//!    `type/subtype` essence with parameters stripped. Comparisons between
//!    `Content-Type`, `Accept`, and configured mappings are exact on that
//!    essence.
//!
//! 3. **Ordered mappings.** [`TypeMappings`] preserves insertion order so
//!    negotiation results are deterministic.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `hs-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod config;
pub mod error;
pub mod identity;
pub mod media;

// Re-export primary types for ergonomic imports.
pub use config::HyperSchemaConfig;
pub use error::HyperSchemaError;
pub use identity::SchemaName;
pub use media::{parse_accept, MediaType, TypeMappings};
