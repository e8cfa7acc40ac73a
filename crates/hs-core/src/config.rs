//! # Configuration
//!
//! Runtime settings shared by the registry, the axum integration, and the
//! CLI. Values come from the environment with the defaults below.
//!
//! | Variable                | Default     |
//! |-------------------------|-------------|
//! | `SCHEMA_PATH`           | `./schemas` |
//! | `SCHEMA_CACHE_MAX_SIZE` | `50`        |
//! | `BASE_URL`              | unset       |
//! | `SCHEMA_URI`            | `/schemas`  |

use std::path::PathBuf;

/// Default schema directory.
pub const DEFAULT_SCHEMA_PATH: &str = "./schemas";
/// Default LRU capacity for loaded schemas.
pub const DEFAULT_CACHE_SIZE: usize = 50;
/// Default mount point of the schema API.
pub const DEFAULT_SCHEMA_URI: &str = "/schemas";

/// Settings for a hyperschema deployment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HyperSchemaConfig {
    /// Directory holding `<name>.json` schema documents.
    pub schema_path: PathBuf,
    /// Maximum number of substituted schemas kept in memory.
    pub cache_size: usize,
    /// External base URL (scheme + host, no trailing slash). When unset,
    /// the base is derived from each request.
    pub base_url: Option<String>,
    /// Path the schema API is mounted under.
    pub schema_uri: String,
}

impl Default for HyperSchemaConfig {
    fn default() -> Self {
        Self {
            schema_path: PathBuf::from(DEFAULT_SCHEMA_PATH),
            cache_size: DEFAULT_CACHE_SIZE,
            base_url: None,
            schema_uri: DEFAULT_SCHEMA_URI.to_string(),
        }
    }
}

impl HyperSchemaConfig {
    /// Build configuration from process environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let schema_path = lookup("SCHEMA_PATH")
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or(defaults.schema_path);

        let cache_size = lookup("SCHEMA_CACHE_MAX_SIZE")
            .map(|raw| parse_cache_size(&raw))
            .unwrap_or(defaults.cache_size);

        let base_url = lookup("BASE_URL")
            .map(|v| normalize_base_url(&v))
            .filter(|v| !v.is_empty());

        let schema_uri = lookup("SCHEMA_URI")
            .map(|v| normalize_mount(&v))
            .unwrap_or(defaults.schema_uri);

        Self {
            schema_path,
            cache_size,
            base_url,
            schema_uri,
        }
    }

    /// Set the external base URL.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        let normalized = normalize_base_url(&base_url.into());
        self.base_url = (!normalized.is_empty()).then_some(normalized);
        self
    }

    /// Set the schema directory.
    pub fn with_schema_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.schema_path = path.into();
        self
    }

    /// Set the schema API mount point.
    pub fn with_schema_uri(mut self, uri: &str) -> Self {
        self.schema_uri = normalize_mount(uri);
        self
    }

    /// Set the cache capacity. Zero is clamped to one.
    pub fn with_cache_size(mut self, size: usize) -> Self {
        self.cache_size = size.max(1);
        self
    }
}

/// Parse a cache capacity. Zero or an unparsable value falls back to
/// [`DEFAULT_CACHE_SIZE`] with a warning.
pub fn parse_cache_size(raw: &str) -> usize {
    match raw.trim().parse::<usize>() {
        Ok(n) if n > 0 => n,
        _ => {
            tracing::warn!(
                value = %raw,
                default = DEFAULT_CACHE_SIZE,
                "invalid SCHEMA_CACHE_MAX_SIZE, using default"
            );
            DEFAULT_CACHE_SIZE
        }
    }
}

/// Trim whitespace and trailing slashes from a base URL.
pub fn normalize_base_url(raw: &str) -> String {
    raw.trim().trim_end_matches('/').to_string()
}

/// Ensure a mount path has a leading slash and no trailing slash.
fn normalize_mount(raw: &str) -> String {
    let trimmed = raw.trim().trim_matches('/');
    if trimmed.is_empty() {
        DEFAULT_SCHEMA_URI.to_string()
    } else {
        format!("/{trimmed}")
    }
}
