//! # Content Negotiation & `describedBy` Links
//!
//! [`produces_middleware`] picks a response media type from the `Accept`
//! header, hands it to the handler as [`Negotiated`], then stamps the
//! response with `Content-Type` and, when the chosen type maps to a
//! schema, a `Link: <…/schemas/{name}#>; rel="describedBy"` header.
//!
//! Negotiation is deliberately basic:
//!
//! - no `Accept`, or `*/*` ranked first → the default type;
//! - otherwise the first requested type that is mapped;
//! - nothing mapped → 406 when strict, else the default type.

use std::convert::Infallible;
use std::sync::Arc;

use axum::extract::{FromRequestParts, Request, State};
use axum::http::header::{ACCEPT, CONTENT_TYPE, LINK};
use axum::http::request::Parts;
use axum::http::HeaderValue;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use hs_core::{parse_accept, MediaType, TypeMappings};

use crate::error::{ApiError, ErrorCode};
use crate::hypermedia::HyperMedia;
use crate::links::{described_by, RequestContext};

/// Response media types, their hyperschemas, and negotiation options.
#[derive(Debug, Clone)]
pub struct Produces {
    hypermedia: HyperMedia,
    mappings: Arc<TypeMappings>,
    default: MediaType,
    set_mimetype: bool,
    strict: bool,
}

impl Produces {
    /// Defaults: `application/json`, set `Content-Type`, non-strict.
    pub fn new(hypermedia: HyperMedia, mappings: TypeMappings) -> Self {
        Self {
            hypermedia,
            mappings: Arc::new(mappings),
            default: MediaType::json(),
            set_mimetype: true,
            strict: false,
        }
    }

    /// Media type used when the client expresses no usable preference.
    pub fn default_mimetype(mut self, media: MediaType) -> Self {
        self.default = media;
        self
    }

    /// Whether to overwrite the response `Content-Type`.
    pub fn set_mimetype(mut self, enabled: bool) -> Self {
        self.set_mimetype = enabled;
        self
    }

    /// Whether an unsatisfiable `Accept` yields 406 instead of the default.
    pub fn strict(mut self, enabled: bool) -> Self {
        self.strict = enabled;
        self
    }

    /// Choose the response media type for an `Accept` header value.
    pub fn negotiate(&self, accept: Option<&str>) -> Result<MediaType, ApiError> {
        let requested = accept.map(parse_accept).unwrap_or_default();

        match requested.first() {
            None => return Ok(self.default.clone()),
            Some(first) if first.is_wildcard_all() => return Ok(self.default.clone()),
            Some(_) => {}
        }

        match requested.iter().find(|m| self.mappings.contains(m)) {
            Some(supported) => Ok(supported.clone()),
            None if self.strict => Err(ApiError::NotAcceptable(
                accept.unwrap_or_default().to_string(),
            )),
            None => Ok(self.default.clone()),
        }
    }
}

/// The media type chosen by [`produces_middleware`].
///
/// Falls back to `application/json` on routes without the middleware.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Negotiated(pub MediaType);

impl<S: Send + Sync> FromRequestParts<S> for Negotiated {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts
            .extensions
            .get::<Negotiated>()
            .cloned()
            .unwrap_or_else(|| Negotiated(MediaType::json())))
    }
}

/// Negotiate, run the handler, then set `Content-Type` and `Link`.
///
/// Error responses rendered from [`ApiError`] pass through untouched.
pub async fn produces_middleware(
    State(produces): State<Produces>,
    mut request: Request,
    next: Next,
) -> Response {
    let context = RequestContext::capture(request.method(), request.uri(), request.headers());
    let accept = request
        .headers()
        .get(ACCEPT)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let mimetype = match produces.negotiate(accept.as_deref()) {
        Ok(mimetype) => mimetype,
        Err(error) => return error.in_context(context).into_response(),
    };
    request.extensions_mut().insert(Negotiated(mimetype.clone()));

    let mut response = next.run(request).await;
    if response.extensions().get::<ErrorCode>().is_some() {
        return response;
    }

    if produces.set_mimetype {
        if let Ok(value) = HeaderValue::from_str(mimetype.as_str()) {
            response.headers_mut().insert(CONTENT_TYPE, value);
        }
    }

    if let Some(Some(schema)) = produces.mappings.get(&mimetype) {
        let link = described_by(
            &produces.hypermedia.external_base(&context),
            produces.hypermedia.schema_uri(),
            schema,
        );
        match HeaderValue::from_str(&link.to_string()) {
            Ok(value) => {
                response.headers_mut().insert(LINK, value);
            }
            Err(_) => tracing::warn!(link = %link, "describedBy link is not a valid header value"),
        }
    }

    response
}
