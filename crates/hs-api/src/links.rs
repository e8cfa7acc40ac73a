//! # Hypermedia Links & Request Context
//!
//! [`Link`] renders an RFC 8288 `Link` header value. [`described_by`] builds
//! the link from a representation to the schema that describes it:
//!
//! ```text
//! Link: <http://localhost/schemas/user#>; rel="describedBy"
//! ```
//!
//! [`RequestContext`] captures the parts of a request needed to build
//! absolute URLs and to annotate error bodies.

use std::convert::Infallible;
use std::fmt;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::{HeaderMap, Method, Uri};
use hs_core::SchemaName;

/// Relation type pointing at a describing schema.
pub const REL_DESCRIBED_BY: &str = "describedBy";

/// A single typed link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    /// Absolute target URI.
    pub target: String,
    /// Relation type.
    pub rel: String,
}

impl fmt::Display for Link {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}>; rel=\"{}\"", self.target, self.rel)
    }
}

/// `describedBy` link to `<base_url><schema_uri>/<name>#`.
pub fn described_by(base_url: &str, schema_uri: &str, name: &SchemaName) -> Link {
    Link {
        target: format!(
            "{}{}/{}#",
            base_url.trim_end_matches('/'),
            schema_uri.trim_end_matches('/'),
            name
        ),
        rel: REL_DESCRIBED_BY.to_string(),
    }
}

/// Method, path, and absolute URLs of the current request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    /// HTTP method.
    pub method: String,
    /// Request path.
    pub path: String,
    /// Absolute URL including query.
    pub url: String,
    /// `scheme://host`, no trailing slash.
    pub url_root: String,
}

impl RequestContext {
    /// Capture context from request head components.
    ///
    /// Scheme: `X-Forwarded-Proto`, then the URI scheme, then `http`.
    /// Host: `Host` header, then the URI authority, then `localhost`.
    pub fn capture(method: &Method, uri: &Uri, headers: &HeaderMap) -> Self {
        let scheme = headers
            .get("x-forwarded-proto")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .or_else(|| uri.scheme_str())
            .unwrap_or("http");

        let host = headers
            .get(axum::http::header::HOST)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty())
            .or_else(|| uri.authority().map(|a| a.as_str()))
            .unwrap_or("localhost");

        let url_root = format!("{scheme}://{host}");
        let path_and_query = uri
            .path_and_query()
            .map(|pq| pq.as_str())
            .unwrap_or("/");

        Self {
            method: method.to_string(),
            path: uri.path().to_string(),
            url: format!("{url_root}{path_and_query}"),
            url_root,
        }
    }

    /// Capture context from request parts.
    pub fn from_parts(parts: &Parts) -> Self {
        Self::capture(&parts.method, &parts.uri, &parts.headers)
    }
}

impl<S: Send + Sync> FromRequestParts<S> for RequestContext {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self::from_parts(parts))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderValue, Request};

    fn context(uri: &str, headers: &[(&str, &str)]) -> RequestContext {
        let mut builder = Request::builder().method("POST").uri(uri);
        for (k, v) in headers {
            builder = builder.header(*k, HeaderValue::from_str(v).unwrap());
        }
        let (parts, ()) = builder.body(()).unwrap().into_parts();
        RequestContext::from_parts(&parts)
    }

    #[test]
    fn link_renders_rfc8288() {
        let link = described_by(
            "http://localhost",
            "/schemas",
            &SchemaName::new("schema-test").unwrap(),
        );
        assert_eq!(
            link.to_string(),
            r#"<http://localhost/schemas/schema-test#>; rel="describedBy""#
        );
    }

    #[test]
    fn link_tolerates_trailing_slashes() {
        let link = described_by("https://api.example.com/", "/meta/", &SchemaName::new("a").unwrap());
        assert_eq!(link.target, "https://api.example.com/meta/a#");
    }

    #[test]
    fn defaults_to_http_localhost() {
        let ctx = context("/orders?page=2", &[]);
        assert_eq!(ctx.url_root, "http://localhost");
        assert_eq!(ctx.url, "http://localhost/orders?page=2");
        assert_eq!(ctx.path, "/orders");
        assert_eq!(ctx.method, "POST");
    }

    #[test]
    fn host_header_wins_over_default() {
        let ctx = context("/x", &[("host", "api.example.com:8443")]);
        assert_eq!(ctx.url_root, "http://api.example.com:8443");
    }

    #[test]
    fn forwarded_proto_sets_scheme() {
        let ctx = context("/x", &[("host", "api.example.com"), ("x-forwarded-proto", "https, http")]);
        assert_eq!(ctx.url_root, "https://api.example.com");
    }

    #[test]
    fn absolute_uri_supplies_scheme_and_authority() {
        let ctx = context("https://svc.internal/x", &[]);
        assert_eq!(ctx.url_root, "https://svc.internal");
    }
}
