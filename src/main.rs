use std::net::SocketAddr;

use anyhow::Context;
use classbase::logging::init_tracing;
use classbase::metrics::metrics_handle;
use classbase::router::init_router;
use classbase::state::init_app_state;
use classbase_config::{FirebaseConfig, LogConfig, ServerConfig};
use dotenvy::dotenv;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let _log_guard = init_tracing(&LogConfig::from_env())?;

    let server = ServerConfig::from_env();
    let firebase = FirebaseConfig::from_env().context("Invalid Firebase configuration")?;
    info!(project_id = %firebase.project_id, "Using Firebase project");

    let state = init_app_state(&firebase)?;
    let metrics = metrics_handle(&server)?;
    let app = init_router(state, metrics)?;

    let addr = server.socket_addr();
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    info!("🚀 Server running on http://{addr}");
    info!("📚 Swagger UI available at http://{addr}/swagger-ui");
    info!("📖 Scalar UI available at http://{addr}/scalar");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("Server error")?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "Failed to listen for shutdown signal");
    }
    info!("Shutdown signal received");
}
