//! Error types for the compute node.
//!
//! [`NodeError`] converts into an HTTP response carrying an
//! [`ErrorBody`](lifegrid_types::ErrorBody).

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use lifegrid_core::PoolError;
use lifegrid_types::{ErrorBody, GridError, ParamsError};

use crate::rpc::RpcError;

/// Errors that can occur while serving node operations.
#[derive(Debug, thiserror::Error)]
pub enum NodeError {
    /// An operation that needs a band arrived before `Initialise`.
    #[error("node has not been initialised")]
    NotInitialised,

    /// `ProcessTurn` arrived without a completed halo exchange.
    #[error("halo rows missing; run HaloExchange first")]
    HaloMissing,

    /// The band handed to `Initialise` is unusable.
    #[error("invalid band: {0}")]
    InvalidBand(String),

    /// The session parameters are invalid.
    #[error(transparent)]
    Params(#[from] ParamsError),

    /// A neighbour returned a halo row of the wrong width.
    #[error("halo row from {peer} has width {actual}, expected {expected}")]
    BadHaloRow {
        /// Address of the neighbour.
        peer: String,
        /// Band width.
        expected: usize,
        /// Width of the received row.
        actual: usize,
    },

    /// No in-process node is registered at the address.
    #[error("no node reachable at {0}")]
    UnknownPeer(String),

    /// A call to another process failed.
    #[error(transparent)]
    Rpc(#[from] RpcError),

    /// Grid assembly failed.
    #[error(transparent)]
    Grid(#[from] GridError),

    /// The worker pool failed.
    #[error(transparent)]
    Pool(#[from] PoolError),
}

impl NodeError {
    /// HTTP status the error is reported with.
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::NotInitialised | Self::HaloMissing => StatusCode::CONFLICT,
            Self::InvalidBand(_) | Self::Params(_) => StatusCode::BAD_REQUEST,
            Self::BadHaloRow { .. } | Self::UnknownPeer(_) | Self::Rpc(_) => {
                StatusCode::BAD_GATEWAY
            }
            Self::Grid(_) | Self::Pool(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for NodeError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorBody {
            error: self.to_string(),
            status: status.as_u16(),
        };
        (status, axum::Json(body)).into_response()
    }
}
