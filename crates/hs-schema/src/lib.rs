//! # hs-schema — Schema Registry & Validation
//!
//! Loads JSON Schema and JSON HyperSchema documents from a directory of
//! `<name>.json` files and validates JSON instances against them.
//!
//! ## Registry (`registry`)
//!
//! [`SchemaRegistry::load_schema`] reads a schema file, substitutes every
//! literal `${base_url}` with the external base URL of the deployment, and
//! keeps the parsed document in an LRU cache keyed by `(base_url, name)`.
//! Each cached entry compiles its validator at most once.
//!
//! ## Resolution (`resolve`)
//!
//! Drafts are picked from the `$schema` keyword (hyper-schema meta-schema
//! URIs map to their plain counterparts). Cross-schema `$ref`s pointing at
//! the schema API (`<base_url>/schemas/<name>`) resolve from the local
//! directory; nothing is fetched over the network.
//!
//! ## Documents (`document`)
//!
//! Helpers to load JSON or YAML instance documents from disk.
//!
//! ## Crate Policy
//!
//! - Depends only on `hs-core` internally.
//! - Schema validation is a trust boundary: invalid documents are rejected
//!   with structured violations (instance path, schema path, message).

pub mod document;
pub mod registry;
pub mod resolve;

pub use document::{load_document, yaml_to_json_value};
pub use registry::{CachedSchema, RegistryError, SchemaRegistry, ValidationViolations, Violation};
pub use resolve::draft_for;
