//! Binding and serving the router.

use std::{future::Future, net::SocketAddr};

use axum::Router;
use thiserror::Error;
use tokio::net::TcpListener;
use tracing::info;

#[derive(Debug, Error)]
pub enum ListenerError {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("HTTP server failed: {0}")]
    Serve(#[source] std::io::Error),
}

/// Serves `router` on `addr` until `shutdown` completes, then drains
/// in-flight requests.
pub async fn serve<F>(addr: SocketAddr, router: Router, shutdown: F) -> Result<(), ListenerError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| ListenerError::Bind { addr, source })?;
    let local_addr = listener.local_addr().unwrap_or(addr);
    info!(addr = %local_addr, "listening for slash commands");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(ListenerError::Serve)?;

    info!("listener stopped");
    Ok(())
}
