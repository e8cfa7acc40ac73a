//! # API Error Types
//!
//! Structured error type implementing `axum::response::IntoResponse`.
//! Every error renders as the same JSON body:
//!
//! ```json
//! {"path": "/orders", "url": "http://localhost/orders", "method": "POST",
//!  "message": "...", "details": null, "traceback": null,
//!  "status": 400, "code": "VALIDATION"}
//! ```
//!
//! Extractor rejections know the request and fill `path`, `url`, and
//! `method` themselves. Errors returned from handlers do not; the
//! [`error_context_middleware`] installed by
//! [`HyperMedia::register_error_handlers`](crate::HyperMedia::register_error_handlers)
//! fills them in on the way out.

use axum::extract::Request;
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use hs_schema::{RegistryError, Violation};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;

use crate::links::RequestContext;

/// JSON error response body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Request path (empty until context is known).
    pub path: String,
    /// Absolute request URL.
    pub url: String,
    /// HTTP method.
    pub method: String,
    /// Human-readable message.
    pub message: String,
    /// Schema diagnostics for `VALIDATION` and `SCHEMA_ERROR`.
    pub details: Option<Value>,
    /// Always null; internals are never exposed.
    pub traceback: Option<String>,
    /// HTTP status code, repeated in the body.
    pub status: u16,
    /// Machine-readable error code.
    pub code: String,
}

impl ErrorBody {
    fn fill_context(&mut self, context: &RequestContext) {
        self.path = context.path.clone();
        self.url = context.url.clone();
        self.method = context.method.clone();
    }
}

/// Marker placed in response extensions identifying the error code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorCode(pub &'static str);

/// Application-level error type.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Request `Content-Type` is not one the route consumes (415).
    #[error("unsupported media type: {0}")]
    UnsupportedMediaType(String),

    /// None of the `Accept`ed media types can be produced (406).
    #[error("not acceptable: {0}")]
    NotAcceptable(String),

    /// Request body could not be decoded (400).
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Resource not found (404).
    #[error("not found: {0}")]
    NotFound(String),

    /// Request payload failed schema validation (400).
    #[error("{message}")]
    Validation {
        /// First violation's message.
        message: String,
        /// The schema validated against.
        schema: Value,
        /// First violation's schema path.
        schema_path: String,
        /// Every violation.
        violations: Vec<Violation>,
    },

    /// The schema itself is broken (500).
    #[error("{message}")]
    Schema {
        /// Compiler message.
        message: String,
        /// The broken schema.
        schema: Value,
        /// Location in the schema.
        schema_path: String,
    },

    /// Internal server error (500). Message is logged, not returned.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    /// HTTP status and machine-readable code.
    pub fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::UnsupportedMediaType(_) => {
                (StatusCode::UNSUPPORTED_MEDIA_TYPE, "UNSUPPORTED_MEDIA_TYPE")
            }
            Self::NotAcceptable(_) => (StatusCode::NOT_ACCEPTABLE, "NOT_ACCEPTABLE"),
            Self::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            Self::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            Self::Validation { .. } => (StatusCode::BAD_REQUEST, "VALIDATION"),
            Self::Schema { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "SCHEMA_ERROR"),
            Self::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL"),
        }
    }

    /// Attach request context so the body carries path, URL, and method.
    pub fn in_context(self, context: RequestContext) -> ContextualError {
        ContextualError {
            error: self,
            context,
        }
    }

    fn into_body(self) -> ErrorBody {
        let (status, code) = self.status_and_code();

        if let Self::Internal(reason) = &self {
            tracing::error!(error = %reason, "internal server error");
        }

        let message = match &self {
            Self::Internal(_) => "An internal error occurred".to_string(),
            other => other.to_string(),
        };

        let details = match self {
            Self::Validation {
                schema,
                schema_path,
                violations,
                ..
            } => Some(json!({
                "schema": schema,
                "schema-path": schema_path,
                "violations": violations
                    .iter()
                    .map(|v| json!({
                        "instance-path": v.instance_path,
                        "schema-path": v.schema_path,
                        "message": v.message,
                    }))
                    .collect::<Vec<_>>(),
            })),
            Self::Schema {
                schema,
                schema_path,
                ..
            } => Some(json!({
                "schema": schema,
                "schema-path": schema_path,
            })),
            _ => None,
        };

        ErrorBody {
            path: String::new(),
            url: String::new(),
            method: String::new(),
            message,
            details,
            traceback: None,
            status: status.as_u16(),
            code: code.to_string(),
        }
    }

    fn render(self, context: Option<&RequestContext>) -> Response {
        let (status, code) = self.status_and_code();
        let mut body = self.into_body();
        if let Some(context) = context {
            body.fill_context(context);
        }

        let mut response = (status, Json(body.clone())).into_response();
        response.extensions_mut().insert(ErrorCode(code));
        response.extensions_mut().insert(body);
        response
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        self.render(None)
    }
}

impl From<RegistryError> for ApiError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::NotFound { name } => Self::NotFound(format!("schema '{name}'")),
            RegistryError::ValidationFailed {
                schema, violations, ..
            } => {
                let (message, schema_path) = violations
                    .first()
                    .map(|v| (v.message.clone(), v.schema_path.clone()))
                    .unwrap_or_default();
                Self::Validation {
                    message,
                    schema,
                    schema_path,
                    violations: violations.violations().to_vec(),
                }
            }
            RegistryError::InvalidSchema {
                schema,
                schema_path,
                reason,
                ..
            } => Self::Schema {
                message: reason,
                schema,
                schema_path,
            },
            other @ (RegistryError::Io { .. }
            | RegistryError::InvalidJson { .. }
            | RegistryError::Document { .. }
            | RegistryError::Directory { .. }) => Self::Internal(other.to_string()),
        }
    }
}

/// An [`ApiError`] paired with the request it answers.
#[derive(Debug)]
pub struct ContextualError {
    /// The error.
    pub error: ApiError,
    /// The request.
    pub context: RequestContext,
}

impl IntoResponse for ContextualError {
    fn into_response(self) -> Response {
        self.error.render(Some(&self.context))
    }
}

/// Fill request context into error bodies rendered without it.
pub async fn error_context_middleware(request: Request, next: Next) -> Response {
    let context = RequestContext::capture(request.method(), request.uri(), request.headers());
    let mut response = next.run(request).await;

    let Some(mut body) = response.extensions_mut().remove::<ErrorBody>() else {
        return response;
    };
    if !body.path.is_empty() {
        return response;
    }

    body.fill_context(&context);
    let (mut parts, _) = response.into_parts();
    parts.headers.remove(axum::http::header::CONTENT_LENGTH);
    (parts, Json(body)).into_response()
}
