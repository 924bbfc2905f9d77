//! Error types for the broker.
//!
//! [`CoordinatorError`] converts into an HTTP response carrying an
//! [`ErrorBody`](lifegrid_types::ErrorBody).

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use lifegrid_node::NodeError;
use lifegrid_types::{GridError, NodeOp, ParamsError};

/// Errors that can occur while serving broker operations.
#[derive(Debug, thiserror::Error)]
pub enum CoordinatorError {
    /// `RunGol` arrived while another session is running.
    #[error("a session is already running")]
    SessionActive,

    /// A session control call arrived with no session running.
    #[error("no session is running")]
    NoActiveSession,

    /// `RunGol` arrived before any node registered.
    #[error("no compute nodes are registered")]
    NoNodes,

    /// More nodes are registered than the grid has rows.
    #[error("{nodes} nodes cannot share a grid of {height} rows")]
    TooManyNodes {
        /// Registered nodes.
        nodes: usize,
        /// Grid height.
        height: usize,
    },

    /// The session parameters are invalid.
    #[error(transparent)]
    Params(#[from] ParamsError),

    /// The grid does not match the parameters.
    #[error("grid is {actual_width}x{actual_height}, parameters say {width}x{height}")]
    GridShape {
        /// Configured width.
        width: usize,
        /// Configured height.
        height: usize,
        /// Width of the supplied grid.
        actual_width: usize,
        /// Height of the supplied grid.
        actual_height: usize,
    },

    /// A call to a compute node failed.
    #[error("{op} on {address} failed: {source}")]
    Node {
        /// Address of the node.
        address: String,
        /// Operation that failed.
        op: &'static str,
        /// Underlying node error.
        #[source]
        source: NodeError,
    },

    /// A registering node cannot be linked.
    #[error("cannot link node at {address}: {source}")]
    Unreachable {
        /// Address the node registered with.
        address: String,
        /// Underlying node error.
        #[source]
        source: NodeError,
    },

    /// Node results could not be assembled into a grid.
    #[error(transparent)]
    Grid(#[from] GridError),

    /// The session task ended without producing a result.
    #[error("session task failed: {0}")]
    SessionTask(String),
}

impl CoordinatorError {
    /// Wrap a node failure with the node's address and the operation.
    pub fn node(address: &str, op: NodeOp, source: NodeError) -> Self {
        Self::Node {
            address: address.to_owned(),
            op: op.name(),
            source,
        }
    }

    /// HTTP status the error is reported with.
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::SessionActive | Self::NoActiveSession => StatusCode::CONFLICT,
            Self::NoNodes => StatusCode::SERVICE_UNAVAILABLE,
            Self::TooManyNodes { .. } | Self::Params(_) | Self::GridShape { .. } => {
                StatusCode::BAD_REQUEST
            }
            Self::Node { .. } | Self::Unreachable { .. } => StatusCode::BAD_GATEWAY,
            Self::Grid(_) | Self::SessionTask(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for CoordinatorError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = lifegrid_types::ErrorBody {
            error: self.to_string(),
            status: status.as_u16(),
        };
        (status, axum::Json(body)).into_response()
    }
}
