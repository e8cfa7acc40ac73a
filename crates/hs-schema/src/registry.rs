//! # Schema Registry
//!
//! Loads `<schema_path>/<name>.json`, replaces every literal `${base_url}`
//! with the deployment's external base URL, and caches the parsed result.
//!
//! ## Caching
//!
//! Loaded schemas live in an LRU keyed by `(base_url, name)`: the same file
//! served under two hosts yields two entries with different substituted
//! contents. Compiled validators hang off the cache entry and are built at
//! most once per entry. The directory listing is memoized until
//! [`SchemaRegistry::refresh`].
//!
//! ## Thread Safety
//!
//! `SchemaRegistry` is `Send + Sync`. Locks are `parking_lot` mutexes held
//! only around cache bookkeeping, never across file IO or compilation.

use std::fmt;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

use hs_core::{HyperSchemaConfig, SchemaName};
use jsonschema::Validator;
use lru::LruCache;
use parking_lot::Mutex;
use serde_json::Value;
use thiserror::Error;

use crate::resolve::{normalize_meta, LocalSchemaRetriever};

/// Placeholder substituted with the external base URL.
pub const BASE_URL_PLACEHOLDER: &str = "${base_url}";

/// Error raised by the registry.
#[derive(Error, Debug)]
pub enum RegistryError {
    /// No `<name>.json` in the schema directory.
    #[error("schema '{name}' not found")]
    NotFound {
        /// Requested schema.
        name: String,
    },

    /// The schema file exists but could not be read.
    #[error("cannot read schema '{name}': {source}")]
    Io {
        /// Requested schema.
        name: String,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The schema file is not valid JSON (after substitution).
    #[error("schema '{name}' is not valid JSON: {reason}")]
    InvalidJson {
        /// Requested schema.
        name: String,
        /// Parser message.
        reason: String,
    },

    /// The schema document itself is invalid and cannot be compiled.
    #[error("schema '{name}' is invalid at '{schema_path}': {reason}")]
    InvalidSchema {
        /// Schema that failed to compile.
        name: String,
        /// The offending schema document.
        schema: Value,
        /// JSON Pointer into the schema where compilation failed.
        schema_path: String,
        /// Compiler message.
        reason: String,
    },

    /// The instance does not conform to the schema.
    #[error("validation failed against schema '{name}':\n{violations}")]
    ValidationFailed {
        /// Schema validated against.
        name: String,
        /// The schema document (post-substitution).
        schema: Value,
        /// Every violation found.
        violations: ValidationViolations,
    },

    /// An instance document could not be read or parsed.
    #[error("cannot load document '{path}': {reason}")]
    Document {
        /// Document path.
        path: String,
        /// Reason.
        reason: String,
    },

    /// The schema directory could not be listed.
    #[error("cannot list schema directory '{path}': {reason}")]
    Directory {
        /// Directory path.
        path: String,
        /// Reason.
        reason: String,
    },
}

/// A single validation violation with structured context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// JSON Pointer to the violating field in the instance.
    pub instance_path: String,
    /// JSON Pointer to the schema keyword that failed.
    pub schema_path: String,
    /// Human-readable description.
    pub message: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.instance_path.is_empty() {
            write!(f, "  (root): {}", self.message)
        } else {
            write!(f, "  {}: {}", self.instance_path, self.message)
        }
    }
}

/// Non-empty collection of violations, in validator order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationViolations {
    violations: Vec<Violation>,
}

impl ValidationViolations {
    /// Number of violations.
    pub fn len(&self) -> usize {
        self.violations.len()
    }

    /// Always false for violations produced by the registry.
    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    /// All violations.
    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    /// The first violation reported.
    pub fn first(&self) -> Option<&Violation> {
        self.violations.first()
    }
}

impl fmt::Display for ValidationViolations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, v) in self.violations.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{v}")?;
        }
        Ok(())
    }
}

/// Compilation outcome stored on a cache entry.
#[derive(Debug, Clone)]
struct CompileFailure {
    schema_path: String,
    reason: String,
}

/// A loaded, substituted schema document.
pub struct CachedSchema {
    name: SchemaName,
    base_url: String,
    document: Value,
    validator: OnceLock<Result<Arc<Validator>, CompileFailure>>,
}

impl fmt::Debug for CachedSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CachedSchema")
            .field("name", &self.name)
            .field("base_url", &self.base_url)
            .field("compiled", &self.validator.get().is_some())
            .finish()
    }
}

impl CachedSchema {
    /// Schema name.
    pub fn name(&self) -> &SchemaName {
        &self.name
    }

    /// Base URL substituted into the document.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// The substituted JSON document.
    pub fn document(&self) -> &Value {
        &self.document
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    base_url: String,
    name: SchemaName,
}

/// Directory-backed schema registry with an LRU cache.
pub struct SchemaRegistry {
    schema_path: PathBuf,
    schema_uri: String,
    base_url: Option<String>,
    cache: Mutex<LruCache<CacheKey, Arc<CachedSchema>>>,
    listing: Mutex<Option<Arc<Vec<String>>>>,
}

impl fmt::Debug for SchemaRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaRegistry")
            .field("schema_path", &self.schema_path)
            .field("schema_uri", &self.schema_uri)
            .field("base_url", &self.base_url)
            .field("cached", &self.cached_len())
            .finish()
    }
}

impl SchemaRegistry {
    /// Create a registry from configuration.
    pub fn new(config: &HyperSchemaConfig) -> Self {
        Self::with_capacity(&config.schema_path, config.cache_size, config.base_url.clone())
            .with_schema_uri(&config.schema_uri)
    }

    /// Create a registry over `schema_path` holding at most `capacity`
    /// schemas (zero is clamped to one).
    pub fn with_capacity(
        schema_path: impl AsRef<Path>,
        capacity: usize,
        base_url: Option<String>,
    ) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            schema_path: schema_path.as_ref().to_path_buf(),
            schema_uri: hs_core::config::DEFAULT_SCHEMA_URI.to_string(),
            base_url,
            cache: Mutex::new(LruCache::new(capacity)),
            listing: Mutex::new(None),
        }
    }

    /// Mount point used to recognize local `$ref` URIs.
    pub fn with_schema_uri(mut self, schema_uri: &str) -> Self {
        self.schema_uri = schema_uri.trim_end_matches('/').to_string();
        self
    }

    /// Schema directory.
    pub fn schema_path(&self) -> &Path {
        &self.schema_path
    }

    /// Whether the schema directory exists and is a directory.
    pub fn is_available(&self) -> bool {
        self.schema_path.is_dir()
    }

    /// Number of schemas currently cached.
    pub fn cached_len(&self) -> usize {
        self.cache.lock().len()
    }

    /// Cache capacity.
    pub fn capacity(&self) -> usize {
        self.cache.lock().cap().get()
    }

    /// Drop cached schemas and the memoized listing.
    pub fn refresh(&self) {
        self.cache.lock().clear();
        *self.listing.lock() = None;
        tracing::debug!(path = %self.schema_path.display(), "schema caches cleared");
    }

    fn effective_base_url(&self, base_url: Option<&str>) -> String {
        base_url
            .or(self.base_url.as_deref())
            .map(|b| b.trim_end_matches('/').to_string())
            .unwrap_or_default()
    }

    /// Load a schema with `${base_url}` substituted.
    ///
    /// `base_url` overrides the registry default; with neither, the
    /// placeholder is replaced by the empty string.
    ///
    /// # Errors
    ///
    /// `NotFound` if the file does not exist, `Io` if it cannot be read,
    /// `InvalidJson` if it does not parse. Failures are not cached.
    pub fn load_schema(
        &self,
        base_url: Option<&str>,
        name: &SchemaName,
    ) -> Result<Arc<CachedSchema>, RegistryError> {
        let key = CacheKey {
            base_url: self.effective_base_url(base_url),
            name: name.clone(),
        };

        if let Some(hit) = self.cache.lock().get(&key) {
            return Ok(Arc::clone(hit));
        }

        tracing::debug!(schema = %name, base_url = %key.base_url, "loading schema");
        let document = read_schema_file(&self.schema_path, name, &key.base_url)?;
        let entry = Arc::new(CachedSchema {
            name: name.clone(),
            base_url: key.base_url.clone(),
            document,
            validator: OnceLock::new(),
        });

        self.cache.lock().put(key, Arc::clone(&entry));
        Ok(entry)
    }

    /// Names of every `*.json` schema in the directory, sorted.
    ///
    /// # Errors
    ///
    /// `Directory` if the schema directory cannot be read.
    pub fn list_schemas(&self) -> Result<Arc<Vec<String>>, RegistryError> {
        if let Some(listing) = self.listing.lock().as_ref() {
            return Ok(Arc::clone(listing));
        }

        let entries = std::fs::read_dir(&self.schema_path).map_err(|e| {
            RegistryError::Directory {
                path: self.schema_path.display().to_string(),
                reason: e.to_string(),
            }
        })?;

        let mut names: Vec<String> = entries
            .flatten()
            .map(|entry| entry.path())
            .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext == "json"))
            .filter_map(|path| path.file_stem().and_then(|s| s.to_str()).map(str::to_string))
            .filter(|stem| SchemaName::new(stem.as_str()).is_ok())
            .collect();
        names.sort();

        let listing = Arc::new(names);
        *self.listing.lock() = Some(Arc::clone(&listing));
        Ok(listing)
    }

    /// Compiled validator for a loaded schema, built on first use.
    ///
    /// # Errors
    ///
    /// `InvalidSchema` if the document is not a valid schema or a local
    /// `$ref` cannot be resolved.
    pub fn validator(&self, schema: &CachedSchema) -> Result<Arc<Validator>, RegistryError> {
        let compiled = schema
            .validator
            .get_or_init(|| self.compile(&schema.document, &schema.base_url));

        compiled.clone().map_err(|failure| {
            tracing::warn!(
                schema = %schema.name,
                schema_path = %failure.schema_path,
                "schema failed to compile: {}",
                failure.reason
            );
            RegistryError::InvalidSchema {
                name: schema.name.to_string(),
                schema: schema.document.clone(),
                schema_path: failure.schema_path,
                reason: failure.reason,
            }
        })
    }

    fn compile(&self, document: &Value, base_url: &str) -> Result<Arc<Validator>, CompileFailure> {
        let mut normalized = document.clone();
        let draft = normalize_meta(&mut normalized);

        let retriever = LocalSchemaRetriever {
            schema_path: self.schema_path.clone(),
            base_url: base_url.to_string(),
            prefix: format!("{base_url}{}/", self.schema_uri),
        };

        jsonschema::options()
            .with_draft(draft)
            .with_retriever(retriever)
            .build(&normalized)
            .map(Arc::new)
            .map_err(|e| CompileFailure {
                schema_path: e.instance_path.to_string(),
                reason: e.to_string(),
            })
    }

    /// Validate `instance` against schema `name`.
    ///
    /// # Errors
    ///
    /// Load errors as for [`load_schema`](Self::load_schema),
    /// `InvalidSchema` if the schema cannot compile, and `ValidationFailed`
    /// carrying every violation if the instance does not conform.
    pub fn validate(
        &self,
        base_url: Option<&str>,
        name: &SchemaName,
        instance: &Value,
    ) -> Result<(), RegistryError> {
        let schema = self.load_schema(base_url, name)?;
        let validator = self.validator(&schema)?;

        let violations: Vec<Violation> = validator
            .iter_errors(instance)
            .map(|e| Violation {
                instance_path: e.instance_path.to_string(),
                schema_path: e.schema_path.to_string(),
                message: e.to_string(),
            })
            .collect();

        if violations.is_empty() {
            Ok(())
        } else {
            Err(RegistryError::ValidationFailed {
                name: name.to_string(),
                schema: schema.document.clone(),
                violations: ValidationViolations { violations },
            })
        }
    }
}

/// Read `<dir>/<name>.json`, substitute `${base_url}`, and parse.
pub(crate) fn read_schema_file(
    dir: &Path,
    name: &SchemaName,
    base_url: &str,
) -> Result<Value, RegistryError> {
    let path = dir.join(name.file_name());
    let raw = std::fs::read_to_string(&path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => RegistryError::NotFound {
            name: name.to_string(),
        },
        _ => RegistryError::Io {
            name: name.to_string(),
            source: e,
        },
    })?;

    let substituted = raw.replace(BASE_URL_PLACEHOLDER, base_url);
    serde_json::from_str(&substituted).map_err(|e| RegistryError::InvalidJson {
        name: name.to_string(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn name(s: &str) -> SchemaName {
        SchemaName::new(s).unwrap()
    }

    fn write(dir: &TempDir, file: &str, contents: &str) {
        std::fs::write(dir.path().join(file), contents).unwrap();
    }

    fn registry_with(files: &[(&str, &str)], capacity: usize) -> (TempDir, SchemaRegistry) {
        let dir = tempfile::tempdir().unwrap();
        for (file, contents) in files {
            write(&dir, file, contents);
        }
        let registry = SchemaRegistry::with_capacity(dir.path(), capacity, None);
        (dir, registry)
    }

    #[test]
    fn substitutes_base_url() {
        let (_dir, registry) = registry_with(
            &[("user.json", r#"{"id": "${base_url}/schemas/user#", "type": "object"}"#)],
            4,
        );
        let schema = registry.load_schema(Some("http://localhost"), &name("user")).unwrap();
        assert_eq!(schema.document()["id"], "http://localhost/schemas/user#");
        assert_eq!(schema.base_url(), "http://localhost");
    }

    #[test]
    fn default_base_url_applies_when_not_given() {
        let dir = tempfile::tempdir().unwrap();
        write(&dir, "user.json", r#"{"id": "${base_url}/x"}"#);
        let registry =
            SchemaRegistry::with_capacity(dir.path(), 4, Some("https://api.example.com/".into()));
        let schema = registry.load_schema(None, &name("user")).unwrap();
        assert_eq!(schema.document()["id"], "https://api.example.com/x");
    }

    #[test]
    fn missing_base_url_substitutes_empty() {
        let (_dir, registry) = registry_with(&[("user.json", r#"{"id": "${base_url}/x"}"#)], 4);
        let schema = registry.load_schema(None, &name("user")).unwrap();
        assert_eq!(schema.document()["id"], "/x");
    }

    #[test]
    fn cache_hit_returns_same_entry() {
        let (_dir, registry) = registry_with(&[("a.json", "{}")], 4);
        let first = registry.load_schema(Some("http://h"), &name("a")).unwrap();
        let second = registry.load_schema(Some("http://h"), &name("a")).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(registry.cached_len(), 1);
    }

    #[test]
    fn different_base_urls_are_distinct_entries() {
        let (_dir, registry) = registry_with(&[("a.json", r#"{"id": "${base_url}"}"#)], 4);
        let one = registry.load_schema(Some("http://one"), &name("a")).unwrap();
        let two = registry.load_schema(Some("http://two"), &name("a")).unwrap();
        assert_eq!(one.document()["id"], "http://one");
        assert_eq!(two.document()["id"], "http://two");
        assert_eq!(registry.cached_len(), 2);
    }

    #[test]
    fn lru_evicts_least_recently_used() {
        let (_dir, registry) =
            registry_with(&[("a.json", "{}"), ("b.json", "{}"), ("c.json", "{}")], 2);
        let a = registry.load_schema(None, &name("a")).unwrap();
        registry.load_schema(None, &name("b")).unwrap();
        // Touch `a` so `b` becomes the eviction candidate.
        registry.load_schema(None, &name("a")).unwrap();
        registry.load_schema(None, &name("c")).unwrap();

        assert_eq!(registry.cached_len(), 2);
        let a_again = registry.load_schema(None, &name("a")).unwrap();
        assert!(Arc::ptr_eq(&a, &a_again), "a should still be cached");
    }

    #[test]
    fn zero_capacity_is_clamped() {
        let (_dir, registry) = registry_with(&[], 0);
        assert_eq!(registry.capacity(), 1);
    }

    #[test]
    fn missing_schema_is_not_found() {
        let (_dir, registry) = registry_with(&[], 4);
        let err = registry.load_schema(None, &name("ghost")).unwrap_err();
        assert!(matches!(err, RegistryError::NotFound { .. }), "got {err}");
        assert_eq!(registry.cached_len(), 0);
    }

    #[test]
    fn malformed_json_is_reported() {
        let (_dir, registry) = registry_with(&[("bad.json", "{not json")], 4);
        let err = registry.load_schema(None, &name("bad")).unwrap_err();
        assert!(matches!(err, RegistryError::InvalidJson { .. }), "got {err}");
    }

    #[test]
    fn list_schemas_is_sorted_and_filtered() {
        let (dir, registry) = registry_with(
            &[("b.json", "{}"), ("a.json", "{}"), ("notes.txt", ""), (".hidden.json", "{}")],
            4,
        );
        std::fs::create_dir(dir.path().join("nested.json")).unwrap();
        let names = registry.list_schemas().unwrap();
        assert_eq!(names.as_slice(), ["a", "b"]);
    }

    #[test]
    fn list_schemas_is_memoized_until_refresh() {
        let (dir, registry) = registry_with(&[("a.json", "{}")], 4);
        assert_eq!(registry.list_schemas().unwrap().len(), 1);

        write(&dir, "b.json", "{}");
        assert_eq!(registry.list_schemas().unwrap().len(), 1);

        registry.refresh();
        assert_eq!(registry.list_schemas().unwrap().len(), 2);
    }

    #[test]
    fn list_schemas_missing_directory() {
        let registry = SchemaRegistry::with_capacity("/nonexistent/hyperschema", 4, None);
        assert!(!registry.is_available());
        assert!(matches!(
            registry.list_schemas(),
            Err(RegistryError::Directory { .. })
        ));
    }

    #[test]
    fn validate_accepts_conforming_instance() {
        let (_dir, registry) = registry_with(
            &[(
                "user.json",
                r#"{
                    "$schema": "http://json-schema.org/draft-04/hyper-schema#",
                    "type": "object",
                    "required": ["name"],
                    "properties": {"name": {"type": "string"}}
                }"#,
            )],
            4,
        );
        registry
            .validate(None, &name("user"), &json!({"name": "ada"}))
            .unwrap();
    }

    #[test]
    fn validate_reports_every_violation() {
        let (_dir, registry) = registry_with(
            &[(
                "user.json",
                r#"{
                    "type": "object",
                    "required": ["name"],
                    "properties": {"age": {"type": "integer"}}
                }"#,
            )],
            4,
        );
        let err = registry
            .validate(None, &name("user"), &json!({"age": "old"}))
            .unwrap_err();
        match err {
            RegistryError::ValidationFailed { name, schema, violations } => {
                assert_eq!(name, "user");
                assert_eq!(schema["type"], "object");
                assert_eq!(violations.len(), 2);
                assert!(violations
                    .violations()
                    .iter()
                    .any(|v| v.instance_path == "/age"));
            }
            other => panic!("expected ValidationFailed, got {other}"),
        }
    }

    #[test]
    fn invalid_schema_is_reported_and_compiled_once() {
        let (_dir, registry) = registry_with(&[("broken.json", r#"{"type": 12}"#)], 4);
        let first = registry.validate(None, &name("broken"), &json!({})).unwrap_err();
        assert!(matches!(first, RegistryError::InvalidSchema { .. }), "got {first}");

        let cached = registry.load_schema(None, &name("broken")).unwrap();
        assert!(format!("{cached:?}").contains("compiled: true"));
        let second = registry.validate(None, &name("broken"), &json!({})).unwrap_err();
        assert!(matches!(second, RegistryError::InvalidSchema { .. }));
    }

    #[test]
    fn resolves_cross_schema_refs_locally() {
        let (_dir, registry) = registry_with(
            &[
                (
                    "order.json",
                    r#"{
                        "type": "object",
                        "properties": {"ship_to": {"$ref": "${base_url}/schemas/address#"}}
                    }"#,
                ),
                (
                    "address.json",
                    r#"{
                        "$schema": "http://json-schema.org/draft-04/hyper-schema#",
                        "type": "object",
                        "required": ["city"]
                    }"#,
                ),
            ],
            4,
        );
        let base = Some("http://localhost");
        registry
            .validate(base, &name("order"), &json!({"ship_to": {"city": "Oslo"}}))
            .unwrap();
        let err = registry
            .validate(base, &name("order"), &json!({"ship_to": {}}))
            .unwrap_err();
        assert!(matches!(err, RegistryError::ValidationFailed { .. }), "got {err}");
    }

    #[test]
    fn foreign_refs_compile_permissively() {
        let (_dir, registry) = registry_with(
            &[(
                "order.json",
                r#"{
                    "type": "object",
                    "required": ["ship_to"],
                    "properties": {
                        "ship_to": {"$ref": "https://schemas.example.org/geo/address.json#"}
                    }
                }"#,
            )],
            4,
        );
        let order = registry.load_schema(None, &name("order")).unwrap();
        registry.validator(&order).unwrap();

        registry
            .validate(None, &name("order"), &json!({"ship_to": 42}))
            .unwrap();
        let err = registry
            .validate(None, &name("order"), &json!({}))
            .unwrap_err();
        assert!(matches!(err, RegistryError::ValidationFailed { .. }), "got {err}");
    }

    #[test]
    fn violation_display_format() {
        let root = Violation {
            instance_path: String::new(),
            schema_path: "/required".into(),
            message: r#""name" is a required property"#.into(),
        };
        assert!(root.to_string().contains("(root)"));

        let nested = Violation {
            instance_path: "/age".into(),
            schema_path: "/properties/age/type".into(),
            message: r#""old" is not of type "integer""#.into(),
        };
        assert!(nested.to_string().contains("/age"));
    }

    #[test]
    fn registry_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<SchemaRegistry>();
        assert_send_sync::<CachedSchema>();
    }
}
