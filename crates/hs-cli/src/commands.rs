//! # Subcommand Handlers

use std::io::Write;
use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::Args;
use hs_core::config::parse_cache_size;
use hs_core::{HyperSchemaConfig, SchemaName};
use hs_schema::{load_document, RegistryError, SchemaRegistry};

/// Settings shared by every subcommand.
///
/// The environment is read through [`HyperSchemaConfig::from_env`]; flags
/// given on the command line override it.
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Directory holding `<name>.json` schemas [env: SCHEMA_PATH].
    #[arg(long, global = true)]
    pub schema_path: Option<PathBuf>,

    /// Value substituted for `${base_url}` in schemas [env: BASE_URL].
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// Maximum number of schemas kept in memory [env: SCHEMA_CACHE_MAX_SIZE].
    /// Zero or an unparsable value falls back to the default.
    #[arg(long, global = true)]
    pub cache_size: Option<String>,
}

impl GlobalArgs {
    /// Environment configuration with the given flags laid over it.
    pub fn config(&self) -> HyperSchemaConfig {
        self.overlay(HyperSchemaConfig::from_env())
    }

    fn overlay(&self, mut config: HyperSchemaConfig) -> HyperSchemaConfig {
        if let Some(path) = &self.schema_path {
            config = config.with_schema_path(path);
        }
        if let Some(base_url) = &self.base_url {
            config = config.with_base_url(base_url.as_str());
        }
        if let Some(raw) = &self.cache_size {
            config.cache_size = parse_cache_size(raw);
        }
        config
    }
}

/// Arguments for `show`.
#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Schema name, without `.json`.
    pub name: String,
}

/// Arguments for `validate`.
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Schema name, without `.json`.
    pub name: String,
    /// Document to validate (`.json`, `.yaml`, or `.yml`).
    pub document: PathBuf,
}

fn schema_name(raw: &str) -> anyhow::Result<SchemaName> {
    SchemaName::new(raw).with_context(|| format!("invalid schema name '{raw}'"))
}

/// Print every schema name.
pub fn list(registry: &SchemaRegistry, out: &mut impl Write) -> anyhow::Result<()> {
    for name in registry.list_schemas()?.iter() {
        writeln!(out, "{name}")?;
    }
    Ok(())
}

/// Print a substituted schema as pretty JSON.
pub fn show(registry: &SchemaRegistry, args: &ShowArgs, out: &mut impl Write) -> anyhow::Result<()> {
    let name = schema_name(&args.name)?;
    let schema = registry.load_schema(None, &name)?;
    writeln!(out, "{}", serde_json::to_string_pretty(schema.document())?)?;
    Ok(())
}

/// Validate a document, printing `OK` or one line per violation.
///
/// # Errors
///
/// Fails when the document does not conform, after printing the violations.
pub fn validate(
    registry: &SchemaRegistry,
    args: &ValidateArgs,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    let name = schema_name(&args.name)?;
    let instance = load_document(&args.document)?;

    match registry.validate(None, &name, &instance) {
        Ok(()) => {
            writeln!(out, "OK")?;
            Ok(())
        }
        Err(RegistryError::ValidationFailed { violations, .. }) => {
            for v in violations.violations() {
                writeln!(out, "{v}")?;
            }
            bail!(
                "{} does not conform to '{name}': {} violation(s)",
                args.document.display(),
                violations.len()
            )
        }
        Err(other) => Err(other.into()),
    }
}

/// Load and compile every schema, printing a status line for each.
///
/// # Errors
///
/// Fails if any schema could not be loaded or compiled.
pub fn check(registry: &SchemaRegistry, out: &mut impl Write) -> anyhow::Result<()> {
    let names = registry.list_schemas()?;
    let mut failed = 0usize;

    for raw in names.iter() {
        let result = schema_name(raw).and_then(|name| {
            let schema = registry.load_schema(None, &name)?;
            registry.validator(&schema)?;
            Ok(())
        });
        match result {
            Ok(()) => writeln!(out, "ok     {raw}")?,
            Err(e) => {
                failed += 1;
                tracing::debug!(schema = %raw, "schema check failed");
                writeln!(out, "FAILED {raw}: {e}")?;
            }
        }
    }

    if failed > 0 {
        bail!("{failed} of {} schema(s) failed", names.len());
    }
    Ok(())
}
