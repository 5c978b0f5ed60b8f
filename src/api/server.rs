//! Server lifecycle: bind, serve, stop on Ctrl-C.

use std::io;
use std::net::SocketAddr;

use super::router::build_router;
use super::state::AppState;

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

/// Serve the API on `addr` until Ctrl-C.
///
/// # Errors
/// Returns error if the address cannot be bound or the server fails.
pub async fn serve(addr: SocketAddr, state: AppState) -> io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    let local = listener.local_addr()?;
    tracing::info!(%local, "API server listening");

    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("API server stopped");
    Ok(())
}
