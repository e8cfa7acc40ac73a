//! # Draft Selection & Local `$ref` Resolution
//!
//! HyperSchema documents declare hyper-schema meta-schemas in `$schema`
//! (e.g. `http://json-schema.org/draft-04/hyper-schema#`). The validator
//! only knows the plain meta-schemas, so [`normalize_meta`] rewrites the
//! declaration to the matching plain URI and reports the draft to compile
//! with. Documents without a recognizable `$schema` compile as Draft 4.
//!
//! [`LocalSchemaRetriever`] resolves cross-schema references against the
//! schema directory. It never touches the network: URIs that do not name a
//! local schema resolve to the permissive schema `{}`.

use std::path::PathBuf;

use hs_core::SchemaName;
use jsonschema::{Draft, Retrieve, Uri};
use serde_json::Value;

use crate::registry::read_schema_file;

/// Draft used when `$schema` is absent or unrecognized.
pub const DEFAULT_DRAFT: Draft = Draft::Draft4;

/// Map a `$schema` URI (plain or hyper-schema) to its draft and the plain
/// meta-schema URI the validator understands.
fn classify(uri: &str) -> Option<(Draft, &'static str)> {
    if uri.contains("draft-04") {
        Some((Draft::Draft4, "http://json-schema.org/draft-04/schema#"))
    } else if uri.contains("draft-06") {
        Some((Draft::Draft6, "http://json-schema.org/draft-06/schema#"))
    } else if uri.contains("draft-07") {
        Some((Draft::Draft7, "http://json-schema.org/draft-07/schema#"))
    } else if uri.contains("2019-09") {
        Some((Draft::Draft201909, "https://json-schema.org/draft/2019-09/schema"))
    } else if uri.contains("2020-12") {
        Some((Draft::Draft202012, "https://json-schema.org/draft/2020-12/schema"))
    } else {
        None
    }
}

/// Draft a schema document declares (or [`DEFAULT_DRAFT`]).
pub fn draft_for(schema: &Value) -> Draft {
    schema
        .get("$schema")
        .and_then(Value::as_str)
        .and_then(classify)
        .map(|(draft, _)| draft)
        .unwrap_or(DEFAULT_DRAFT)
}

/// Rewrite `$schema` to the plain meta-schema URI of its draft.
///
/// Unrecognized declarations are removed so the validator falls back to
/// the explicitly configured draft. Returns that draft.
pub fn normalize_meta(schema: &mut Value) -> Draft {
    let Some(object) = schema.as_object_mut() else {
        return DEFAULT_DRAFT;
    };
    let declared = object.get("$schema").and_then(Value::as_str).map(classify);
    match declared {
        Some(Some((draft, plain))) => {
            object.insert("$schema".to_string(), Value::String(plain.to_string()));
            draft
        }
        Some(None) => {
            object.remove("$schema");
            DEFAULT_DRAFT
        }
        None => DEFAULT_DRAFT,
    }
}

/// Resolves `$ref` URIs to schema files in the schema directory.
///
/// A URI names a local schema when it starts with
/// `<base_url><schema_uri>/`, or failing that, when its last path segment
/// (minus an optional `.json` suffix) is a valid schema name with a file
/// on disk.
pub(crate) struct LocalSchemaRetriever {
    pub(crate) schema_path: PathBuf,
    pub(crate) base_url: String,
    /// `<base_url><schema_uri>/`
    pub(crate) prefix: String,
}

impl LocalSchemaRetriever {
    /// Local schema name referenced by `uri`, if any.
    fn local_name(&self, uri: &str) -> Option<SchemaName> {
        let uri = uri.split('#').next().unwrap_or(uri);

        if let Some(rest) = uri.strip_prefix(&self.prefix) {
            let stem = rest.trim_end_matches('/');
            let stem = stem.strip_suffix(".json").unwrap_or(stem);
            return SchemaName::new(stem).ok();
        }

        let last = uri.rsplit('/').next()?;
        let stem = last.strip_suffix(".json").unwrap_or(last);
        let name = SchemaName::new(stem).ok()?;
        self.schema_path
            .join(name.file_name())
            .is_file()
            .then_some(name)
    }
}

impl Retrieve for LocalSchemaRetriever {
    fn retrieve(
        &self,
        uri: &Uri<&str>,
    ) -> Result<Value, Box<dyn std::error::Error + Send + Sync>> {
        let Some(name) = self.local_name(uri.as_str()) else {
            tracing::debug!(uri = uri.as_str(), "unresolved $ref, using permissive schema");
            return Ok(serde_json::json!({}));
        };

        let mut document = read_schema_file(&self.schema_path, &name, &self.base_url)?;
        normalize_meta(&mut document);
        Ok(document)
    }
}
