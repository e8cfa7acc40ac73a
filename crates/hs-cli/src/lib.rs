//! # hs-cli — hyperschema Command-Line Interface
//!
//! Developer tooling for a schema directory, built on the same registry
//! the axum integration uses.
//!
//! ## Subcommands
//!
//! - `list` — schema names, one per line
//! - `show` — a schema with `${base_url}` substituted
//! - `validate` — check a JSON or YAML document against a schema
//! - `check` — compile every schema and report the broken ones
//!
//! Argument parsing lives in the binary; handlers in [`commands`] write to
//! any [`std::io::Write`] so they can be tested without a process.

pub mod commands;
