//! # hs-api — Binary Entry Point
//!
//! Serves the schema API and health probes for a schema directory.
//! Binds to `PORT` (default 8080).

use hs_api::HyperMedia;
use hs_core::HyperSchemaConfig;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured tracing.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8080);

    let config = HyperSchemaConfig::from_env();
    tracing::info!(
        schema_path = %config.schema_path.display(),
        cache_size = config.cache_size,
        base_url = config.base_url.as_deref().unwrap_or("<per request>"),
        schema_uri = %config.schema_uri,
        "configuration loaded"
    );

    let hypermedia = HyperMedia::new(config);
    match hypermedia.registry().list_schemas() {
        Ok(names) => tracing::info!(count = names.len(), "schemas discovered"),
        Err(e) => tracing::warn!("{e}; readiness probe will fail until it exists"),
    }

    let app = hs_api::app(hypermedia);

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("hyperschema API listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
