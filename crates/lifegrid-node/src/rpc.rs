//! JSON-over-HTTP call helper shared by every client in the cluster.
//!
//! A call is a `POST` of the JSON request to `http://<address><path>`.
//! Non-2xx replies carry an [`ErrorBody`]; its message is surfaced as
//! [`RpcError::Remote`].

use lifegrid_types::ErrorBody;
use serde::Serialize;
use serde::de::DeserializeOwned;

/// Errors from a remote call.
#[derive(Debug, thiserror::Error)]
pub enum RpcError {
    /// The request never produced a response.
    #[error("request to {address}{path} failed: {message}")]
    Transport {
        /// Peer address.
        address: String,
        /// Route path.
        path: String,
        /// Underlying error.
        message: String,
    },

    /// The peer answered with an error status.
    #[error("{address}{path} returned {status}: {message}")]
    Remote {
        /// Peer address.
        address: String,
        /// Route path.
        path: String,
        /// HTTP status code.
        status: u16,
        /// Error message from the peer.
        message: String,
    },

    /// The peer's reply could not be decoded.
    #[error("invalid response from {address}{path}: {message}")]
    Decode {
        /// Peer address.
        address: String,
        /// Route path.
        path: String,
        /// Underlying error.
        message: String,
    },
}

impl RpcError {
    /// HTTP status of a [`RpcError::Remote`] reply.
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Remote { status, .. } => Some(*status),
            Self::Transport { .. } | Self::Decode { .. } => None,
        }
    }
}

/// Build the HTTP client used for cluster calls.
pub fn http_client() -> reqwest::Client {
    reqwest::Client::new()
}

/// Send `body` to `path` on `address` and decode the reply.
pub async fn post<Req, Resp>(
    http: &reqwest::Client,
    address: &str,
    path: &str,
    body: &Req,
) -> Result<Resp, RpcError>
where
    Req: Serialize + ?Sized,
    Resp: DeserializeOwned,
{
    let url = format!("http://{address}{path}");

    let response = http
        .post(&url)
        .json(body)
        .send()
        .await
        .map_err(|e| RpcError::Transport {
            address: address.to_owned(),
            path: path.to_owned(),
            message: e.to_string(),
        })?;

    let status = response.status();
    if !status.is_success() {
        let error_body = response
            .text()
            .await
            .unwrap_or_else(|_| "unable to read error body".to_owned());
        let message = serde_json::from_str::<ErrorBody>(&error_body)
            .map_or(error_body, |body| body.error);
        return Err(RpcError::Remote {
            address: address.to_owned(),
            path: path.to_owned(),
            status: status.as_u16(),
            message,
        });
    }

    response.json::<Resp>().await.map_err(|e| RpcError::Decode {
        address: address.to_owned(),
        path: path.to_owned(),
        message: e.to_string(),
    })
}
