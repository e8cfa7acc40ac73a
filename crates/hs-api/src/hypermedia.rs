//! # HyperMedia Handle
//!
//! Cheap-to-clone handle shared by every piece of the integration: the
//! `consumes` extractor, the `produces` middleware, and the schema API all
//! read configuration and schemas through it.

use std::sync::Arc;

use axum::middleware::from_fn;
use axum::routing::get;
use axum::Router;
use hs_core::{HyperSchemaConfig, TypeMappings};
use hs_schema::{RegistryError, SchemaRegistry};

use crate::consumes::Consumes;
use crate::error::{error_context_middleware, ApiError};
use crate::links::RequestContext;
use crate::produces::Produces;
use crate::routes::schemas;

struct Inner {
    config: HyperSchemaConfig,
    registry: SchemaRegistry,
}

/// Shared configuration and schema registry.
#[derive(Clone)]
pub struct HyperMedia {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for HyperMedia {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HyperMedia")
            .field("config", &self.inner.config)
            .field("registry", &self.inner.registry)
            .finish()
    }
}

impl HyperMedia {
    /// Create a handle from explicit configuration.
    pub fn new(config: HyperSchemaConfig) -> Self {
        let registry = SchemaRegistry::new(&config);
        Self {
            inner: Arc::new(Inner { config, registry }),
        }
    }

    /// Create a handle from `SCHEMA_PATH`, `SCHEMA_CACHE_MAX_SIZE`,
    /// `BASE_URL`, and `SCHEMA_URI`.
    pub fn from_env() -> Self {
        Self::new(HyperSchemaConfig::from_env())
    }

    /// Active configuration.
    pub fn config(&self) -> &HyperSchemaConfig {
        &self.inner.config
    }

    /// The schema registry.
    pub fn registry(&self) -> &SchemaRegistry {
        &self.inner.registry
    }

    /// Mount point of the schema API.
    pub fn schema_uri(&self) -> &str {
        &self.inner.config.schema_uri
    }

    /// External base URL: configured `base_url`, else the request root.
    pub fn external_base(&self, context: &RequestContext) -> String {
        self.inner
            .config
            .base_url
            .clone()
            .unwrap_or_else(|| context.url_root.clone())
    }

    /// Run a registry operation on the blocking pool.
    ///
    /// Loads read from disk and first use compiles a validator; neither
    /// belongs on an async worker.
    pub(crate) async fn with_registry<T, F>(&self, f: F) -> Result<T, ApiError>
    where
        F: FnOnce(&SchemaRegistry) -> Result<T, RegistryError> + Send + 'static,
        T: Send + 'static,
    {
        let handle = self.clone();
        tokio::task::spawn_blocking(move || f(handle.registry()))
            .await
            .map_err(|e| ApiError::Internal(format!("registry task failed: {e}")))?
            .map_err(ApiError::from)
    }

    /// Request-side configuration for the [`Consumed`](crate::consumes::Consumed)
    /// extractor. Install with `.route_layer(Extension(..))`.
    pub fn consumes(&self, mappings: TypeMappings) -> Consumes {
        Consumes::new(self.clone(), mappings)
    }

    /// Response-side configuration for
    /// [`produces_middleware`](crate::produces::produces_middleware).
    /// Install with `.route_layer(from_fn_with_state(.., produces_middleware))`.
    pub fn produces(&self, mappings: TypeMappings) -> Produces {
        Produces::new(self.clone(), mappings)
    }

    /// Router serving `GET {schema_uri}`, `{schema_uri}/`, and
    /// `{schema_uri}/{schema_id}`.
    pub fn schema_router<S>(&self) -> Router<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        let uri = self.schema_uri();
        Router::new()
            .route(uri, get(schemas::list_schemas))
            .route(&format!("{uri}/"), get(schemas::list_schemas))
            .route(&format!("{uri}/{{schema_id}}"), get(schemas::get_schema))
            .with_state(self.clone())
    }

    /// Merge the schema API into `router`.
    pub fn register_schema_api<S>(&self, router: Router<S>) -> Router<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        tracing::debug!(uri = %self.schema_uri(), "registering schema API");
        router.merge(self.schema_router())
    }

    /// Wrap `router` so handler-returned [`ApiError`]s carry the request's
    /// path, URL, and method.
    pub fn register_error_handlers<S>(&self, router: Router<S>) -> Router<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        router.layer(from_fn(error_context_middleware))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context(root: &str) -> RequestContext {
        RequestContext {
            method: "GET".into(),
            path: "/".into(),
            url: format!("{root}/"),
            url_root: root.into(),
        }
    }

    #[test]
    fn external_base_prefers_configuration() {
        let hm = HyperMedia::new(HyperSchemaConfig::default().with_base_url("https://api.example.com"));
        assert_eq!(hm.external_base(&context("http://localhost")), "https://api.example.com");
    }

    #[test]
    fn external_base_falls_back_to_request_root() {
        let hm = HyperMedia::new(HyperSchemaConfig::default());
        assert_eq!(hm.external_base(&context("http://localhost")), "http://localhost");
    }

    #[test]
    fn clones_share_registry() {
        let hm = HyperMedia::new(HyperSchemaConfig::default());
        let other = hm.clone();
        assert!(std::ptr::eq(hm.registry(), other.registry()));
    }

    #[tokio::test]
    async fn with_registry_maps_errors() {
        let dir = tempfile::tempdir().unwrap();
        let hm = HyperMedia::new(HyperSchemaConfig::default().with_schema_path(dir.path()));
        let err = hm
            .with_registry(|r| r.load_schema(None, &hs_core::SchemaName::new("ghost").unwrap()))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }
}
