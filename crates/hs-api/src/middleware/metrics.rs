//! # Request Metrics
//!
//! In-process counters for requests, error responses, and schema
//! validation failures, exposed as JSON at `/metrics`.
//!
//! [`ApiMetrics::instrument`] wraps any router, so application routes that
//! use the `Consumed` extractor feed the validation-failure counter.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use axum::extract::Request;
use axum::middleware::{from_fn, Next};
use axum::response::Response;
use axum::{Extension, Json, Router};
use serde::Serialize;

use crate::error::ErrorCode;

/// Shared metrics state.
///
/// Clones share the same counters.
#[derive(Debug, Clone, Default)]
pub struct ApiMetrics {
    request_count: Arc<AtomicU64>,
    error_count: Arc<AtomicU64>,
    validation_failures: Arc<AtomicU64>,
}

/// Point-in-time counter values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    /// Total requests completed.
    pub requests: u64,
    /// Responses with a 4xx or 5xx status.
    pub errors: u64,
    /// Request bodies rejected by schema validation.
    pub validation_failures: u64,
}

impl ApiMetrics {
    /// Create a new metrics instance with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Read the current counter values.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            requests: self.request_count.load(Ordering::Relaxed),
            errors: self.error_count.load(Ordering::Relaxed),
            validation_failures: self.validation_failures.load(Ordering::Relaxed),
        }
    }

    /// Count every response from `router` and make these counters
    /// available to the [`snapshot`] handler.
    pub fn instrument<S>(&self, router: Router<S>) -> Router<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        router
            .layer(from_fn(metrics_middleware))
            .layer(Extension(self.clone()))
    }

    fn record(&self, response: &Response) {
        self.request_count.fetch_add(1, Ordering::Relaxed);
        let status = response.status();
        if status.is_client_error() || status.is_server_error() {
            self.error_count.fetch_add(1, Ordering::Relaxed);
        }
        if response.extensions().get::<ErrorCode>() == Some(&ErrorCode("VALIDATION")) {
            self.validation_failures.fetch_add(1, Ordering::Relaxed);
        }
    }
}

/// Middleware that updates the counters after each response.
pub async fn metrics_middleware(request: Request, next: Next) -> Response {
    let metrics = request.extensions().get::<ApiMetrics>().cloned();
    let response = next.run(request).await;
    if let Some(m) = metrics {
        m.record(&response);
    }
    response
}

/// GET /metrics
///
/// Needs an [`ApiMetrics`] extension, as installed by
/// [`ApiMetrics::instrument`].
pub async fn snapshot(Extension(metrics): Extension<ApiMetrics>) -> Json<MetricsSnapshot> {
    Json(metrics.snapshot())
}
