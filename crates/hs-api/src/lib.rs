//! # hs-api — Axum Integration for JSON Schema & HyperSchema
//!
//! Brings schema-driven request validation and hypermedia response
//! metadata to axum routers.
//!
//! ## Building Blocks
//!
//! | Item                                   | Role |
//! |----------------------------------------|------|
//! | [`HyperMedia`]                         | Shared handle: configuration + schema registry. |
//! | [`consumes::Consumed`]                 | Extractor: Content-Type check, JSON / form `payload` decoding, schema validation. |
//! | [`produces::produces_middleware`]      | Accept negotiation, `Content-Type`, and `Link: <…#>; rel="describedBy"`. |
//! | [`HyperMedia::register_schema_api`]    | `GET /schemas`, `GET /schemas/{schema_id}`. |
//! | [`HyperMedia::register_error_handlers`]| Fills request context into JSON error bodies. |
//! | [`ApiMetrics::instrument`]             | Request, error, and validation-failure counters. |
//!
//! ## Wiring
//!
//! ```ignore
//! let hm = HyperMedia::from_env();
//! let orders = Router::new()
//!     .route("/orders", post(create_order))
//!     .route_layer(Extension(hm.consumes(order_types)))
//!     .route_layer(from_fn_with_state(hm.produces(order_types), produces_middleware));
//! let app = hm.register_error_handlers(hm.register_schema_api(orders));
//! ```
//!
//! ## Middleware Stack (execution order)
//!
//! ```text
//! TraceLayer → MetricsMiddleware → ErrorContextMiddleware → Handler
//! ```

pub mod consumes;
pub mod error;
pub mod hypermedia;
pub mod links;
pub mod middleware;
pub mod produces;
pub mod routes;

use axum::routing::get;
use axum::Router;

pub use error::{ApiError, ErrorBody};
pub use hypermedia::HyperMedia;
pub use middleware::metrics::ApiMetrics;

/// Assemble the standalone schema server: health probes, metrics, and the
/// schema API, wrapped in tracing, metrics, and error-context middleware.
pub fn app(hypermedia: HyperMedia) -> Router {
    let metrics = ApiMetrics::new();

    let base = Router::new()
        .merge(routes::health::router())
        .route("/metrics", get(middleware::metrics::snapshot))
        .with_state(hypermedia.clone());

    let router = hypermedia.register_schema_api(base);

    metrics
        .instrument(hypermedia.register_error_handlers(router))
        .layer(middleware::tracing_layer::layer())
}
