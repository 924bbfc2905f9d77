//! Node RPC server lifecycle.
//!
//! [`bind`] and [`serve`] are split so callers can bind port 0 and learn
//! the real address before anything registers it. [`serve`] returns once
//! the node has been closed and in-flight requests have drained.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::info;

use crate::node::ComputeNode;
use crate::router::build_router;

/// Errors that can occur when starting or running the node server.
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

/// Serve `node` on `listener` until the node is closed.
pub async fn serve(listener: TcpListener, node: Arc<ComputeNode>) -> Result<(), ServerError> {
    let addr = local_addr(&listener)?;
    let mut closed = node.shutdown_signal();
    let router = build_router(node);

    info!(%addr, "Node server listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            let _ = closed.wait_for(|closed| *closed).await;
        })
        .await
        .map_err(|e| ServerError::Serve(format!("serve error: {e}")))?;

    info!(%addr, "Node server stopped");
    Ok(())
}
