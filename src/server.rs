pub mod handlers;
pub mod state;

pub use state::{AppState, Dataset, DatasetSnapshot, Paging};

use axum::{http::Method, routing::get, Router};
use hyper::Server;
use std::net::SocketAddr;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

/// Create the HTTP router with every read-only route
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET])
        .allow_headers(Any);

    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        .route("/api/kpi", get(handlers::kpi))
        .route("/api/jobs", get(handlers::jobs))
        .route("/api/jobs-by-country", get(handlers::by_country))
        .route("/api/jobs-by-region", get(handlers::by_region))
        .route("/api/salary-by-role", get(handlers::salary_by_role_handler))
        .route("/api/top-skills", get(handlers::skills))
        .layer(ServiceBuilder::new().layer(cors))
        .with_state(state)
}

/// Serve until Ctrl-C
pub async fn start_server(state: AppState, host: &str, port: u16) -> anyhow::Result<()> {
    let ip: std::net::IpAddr = host.parse()?;
    let addr = SocketAddr::new(ip, port);
    let app = create_router(state);

    info!("HTTP server running on http://{addr}");
    info!("Health check: http://{addr}/health");

    Server::bind(&addr)
        .serve(app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("HTTP server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for shutdown signal: {e}");
    }
}
