//! # Schema API
//!
//! Routes (mounted under the configured `schema_uri`, default `/schemas`):
//! - GET {schema_uri}              — JSON array of schema names
//! - GET {schema_uri}/             — same
//! - GET {schema_uri}/{schema_id}  — the schema, `${base_url}` substituted
//!
//! Schemas are served with the request's own root URL substituted, so the
//! `$ref`s and links inside them point back at the host that served them.

use axum::extract::rejection::PathRejection;
use axum::extract::{Path, State};
use axum::Json;
use hs_core::SchemaName;
use serde_json::Value;

use crate::error::ContextualError;
use crate::hypermedia::HyperMedia;
use crate::links::RequestContext;
use crate::ApiError;

/// List every schema in the directory.
pub async fn list_schemas(
    State(hm): State<HyperMedia>,
    context: RequestContext,
) -> Result<Json<Vec<String>>, ContextualError> {
    hm.with_registry(|registry| registry.list_schemas())
        .await
        .map(|names| Json(names.as_ref().clone()))
        .map_err(|e| e.in_context(context))
}

/// Fetch one schema by name.
///
/// An id that fails to decode is treated like any other unknown name.
pub async fn get_schema(
    State(hm): State<HyperMedia>,
    schema_id: Result<Path<String>, PathRejection>,
    context: RequestContext,
) -> Result<Json<Value>, ContextualError> {
    let schema_id = match schema_id {
        Ok(Path(schema_id)) => schema_id,
        Err(rejection) => {
            tracing::debug!("undecodable schema id: {}", rejection.body_text());
            return Err(ApiError::NotFound("schema".into()).in_context(context));
        }
    };
    let name = match SchemaName::new(schema_id.as_str()) {
        Ok(name) => name,
        Err(e) => {
            tracing::debug!(schema_id = %schema_id, "rejected schema id: {e}");
            return Err(ApiError::NotFound(format!("schema '{schema_id}'")).in_context(context));
        }
    };

    let base = context.url_root.clone();
    hm.with_registry(move |registry| registry.load_schema(Some(&base), &name))
        .await
        .map(|schema| Json(schema.document().clone()))
        .map_err(|e| e.in_context(context))
}
