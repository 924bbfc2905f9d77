//! Broker RPC server lifecycle.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::info;

use crate::coordinator::Coordinator;
use crate::router::build_router;

/// Errors that can occur when starting or running the broker server.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Failed to bind to the network address.
    #[error("bind error: {0}")]
    Bind(String),

    /// The server encountered a fatal error while serving.
    #[error("serve error: {0}")]
    Serve(String),
}

/// Bind a listener on `addr`.
pub async fn bind(addr: &str) -> Result<TcpListener, ServerError> {
    TcpListener::bind(addr)
        .await
        .map_err(|e| ServerError::Bind(format!("bind failed on {addr}: {e}")))
}

/// Local address of a bound listener.
pub fn local_addr(listener: &TcpListener) -> Result<SocketAddr, ServerError> {
    listener
        .local_addr()
        .map_err(|e| ServerError::Bind(format!("no local address: {e}")))
}

/// Serve `coordinator` on `listener` until `CloseBroker` is called.
///
/// In-flight calls, including a running `RunGol`, are allowed to finish.
pub async fn serve(listener: TcpListener, coordinator: Arc<Coordinator>) -> Result<(), ServerError> {
    let addr = local_addr(&listener)?;
    let mut closed = coordinator.shutdown_signal();
    let router = build_router(coordinator);

    info!(%addr, "Broker server listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            let _ = closed.wait_for(|closed| *closed).await;
        })
        .await
        .map_err(|e| ServerError::Serve(format!("serve error: {e}")))?;

    info!(%addr, "Broker server stopped");
    Ok(())
}
