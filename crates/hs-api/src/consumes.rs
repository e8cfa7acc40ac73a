//! # Schema-Validated Request Bodies
//!
//! [`Consumes`] lists the media types a route accepts and the schema each
//! one must satisfy. Install it on a route as an extension; the
//! [`Consumed`] extractor then:
//!
//! 1. rejects a `Content-Type` outside the mappings with 415;
//! 2. decodes the body as JSON, or for `application/x-www-form-urlencoded`
//!    decodes the JSON carried in the `payload` form field;
//! 3. validates the decoded value against the mapped schema, if any.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{FromRequest, Request};
use axum::http::header::CONTENT_TYPE;
use axum::Form;
use hs_core::{MediaType, TypeMappings};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use crate::error::{ApiError, ContextualError};
use crate::hypermedia::HyperMedia;
use crate::links::RequestContext;

/// Accepted request media types and their schemas.
#[derive(Debug, Clone)]
pub struct Consumes {
    hypermedia: HyperMedia,
    mappings: Arc<TypeMappings>,
}

impl Consumes {
    /// Bind `mappings` to a [`HyperMedia`] handle.
    pub fn new(hypermedia: HyperMedia, mappings: TypeMappings) -> Self {
        Self {
            hypermedia,
            mappings: Arc::new(mappings),
        }
    }

    /// The configured mappings.
    pub fn mappings(&self) -> &TypeMappings {
        &self.mappings
    }
}

/// Form body carrying a JSON document in `payload`.
#[derive(Debug, Deserialize)]
struct PayloadForm {
    payload: String,
}

/// A decoded, schema-validated request body.
#[derive(Debug, Clone, PartialEq)]
pub struct Consumed {
    /// Request media type (normalized).
    pub mimetype: MediaType,
    /// Decoded body.
    pub data: Value,
}

impl Consumed {
    /// Deserialize the body into a typed value.
    pub fn parse<T: DeserializeOwned>(&self) -> Result<T, ApiError> {
        T::deserialize(&self.data).map_err(|e| ApiError::BadRequest(e.to_string()))
    }
}

fn decode_json(text: &str) -> Result<Value, ApiError> {
    serde_json::from_str(text).map_err(|e| ApiError::BadRequest(format!("malformed JSON body: {e}")))
}

impl<S: Send + Sync> FromRequest<S> for Consumed {
    type Rejection = ContextualError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let context = RequestContext::capture(req.method(), req.uri(), req.headers());
        match extract(req, state, &context).await {
            Ok(consumed) => Ok(consumed),
            Err(error) => Err(error.in_context(context)),
        }
    }
}

async fn extract<S: Send + Sync>(
    req: Request,
    state: &S,
    context: &RequestContext,
) -> Result<Consumed, ApiError> {
    let Some(consumes) = req.extensions().get::<Consumes>().cloned() else {
        return Err(ApiError::Internal(
            "Consumed extractor used on a route without a Consumes extension".into(),
        ));
    };

    let raw = req
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    let Some(mimetype) = MediaType::parse(raw)
        .ok()
        .filter(|m| consumes.mappings.contains(m))
    else {
        return Err(ApiError::UnsupportedMediaType(if raw.is_empty() {
            "missing Content-Type".to_string()
        } else {
            raw.to_string()
        }));
    };

    let data = if mimetype.is_form_urlencoded() {
        let Form(form) = Form::<PayloadForm>::from_request(req, state)
            .await
            .map_err(|e| ApiError::BadRequest(e.body_text()))?;
        decode_json(&form.payload)?
    } else {
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|e| ApiError::BadRequest(e.body_text()))?;
        let text = std::str::from_utf8(&bytes)
            .map_err(|e| ApiError::BadRequest(format!("body is not UTF-8: {e}")))?;
        decode_json(text)?
    };

    let Some(schema) = consumes.mappings.get(&mimetype).flatten().cloned() else {
        return Ok(Consumed { mimetype, data });
    };

    let base = consumes.hypermedia.external_base(context);
    let data = consumes
        .hypermedia
        .with_registry(move |registry| {
            registry.validate(Some(&base), &schema, &data).map(|()| data)
        })
        .await?;

    Ok(Consumed { mimetype, data })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_into_typed_value() {
        #[derive(Debug, Deserialize, PartialEq)]
        struct Order {
            sku: String,
            qty: u32,
        }

        let consumed = Consumed {
            mimetype: MediaType::json(),
            data: serde_json::json!({"sku": "A-1", "qty": 3}),
        };
        assert_eq!(
            consumed.parse::<Order>().unwrap(),
            Order { sku: "A-1".into(), qty: 3 }
        );

        let err = consumed.parse::<Vec<String>>().unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));
    }

    #[test]
    fn decode_json_rejects_garbage() {
        assert!(matches!(decode_json("{"), Err(ApiError::BadRequest(_))));
        assert_eq!(decode_json("[1]").unwrap(), serde_json::json!([1]));
    }
}
