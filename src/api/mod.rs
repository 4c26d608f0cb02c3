//! HTTP API.
//!
//! Provides two endpoints:
//! - `/api/domain/:server_name` - grade, servers and metadata of one domain
//! - `/api/consulted` - every domain looked up so far
//!
//! Responses carry `Access-Control-Allow-Origin: *`.

mod handlers;
mod types;

use axum::http::Method;
use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};

use handlers::{consulted_handler, domain_handler};
pub use handlers::{error_status, normalize_domain};
pub use types::ApiState;

/// Builds the router with all routes and the CORS layer.
pub fn router(state: ApiState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET])
        .allow_headers(Any);

    Router::new()
        .route("/api/domain/:server_name", get(domain_handler))
        .route("/api/consulted", get(consulted_handler))
        .layer(cors)
        .with_state(state)
}

/// Serves the API on an already bound listener until the process stops.
pub async fn serve(listener: TcpListener, state: ApiState) -> Result<(), anyhow::Error> {
    axum::serve(listener, router(state))
        .await
        .map_err(|e| anyhow::anyhow!("API server error: {}", e))
}

/// Binds `bind:port` and serves the API until Ctrl-C.
pub async fn start_api_server(bind: &str, port: u16, state: ApiState) -> Result<(), anyhow::Error> {
    let listener = TcpListener::bind(format!("{}:{}", bind, port))
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind API server to {}:{}: {}", bind, port, e))?;

    log::info!("API server listening on http://{}:{}/", bind, port);
    log::info!("  - Lookup: http://{}:{}/api/domain/<name>", bind, port);
    log::info!("  - Consulted: http://{}:{}/api/consulted", bind, port);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| anyhow::anyhow!("API server error: {}", e))
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => log::info!("Shutdown requested, finishing in-flight lookups"),
        Err(e) => {
            log::warn!("Cannot listen for Ctrl-C ({}), serving until killed", e);
            std::future::pending::<()>().await;
        }
    }
}
