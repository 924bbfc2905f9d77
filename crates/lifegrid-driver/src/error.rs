//! Error types for the session driver.

use lifegrid_node::RpcError;
use lifegrid_types::GridError;

/// Errors raised by the image collaborators.
#[derive(Debug, thiserror::Error)]
pub enum ImageError {
    /// The image file could not be read or written.
    #[error("image I/O failed for {path}: {source}")]
    Io {
        /// File involved.
        path: String,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The file is not a binary PGM with maxval 255.
    #[error("malformed PGM: {0}")]
    Format(String),

    /// The image has different dimensions than requested.
    #[error("image is {actual_width}x{actual_height}, expected {width}x{height}")]
    Size {
        /// Requested width.
        width: usize,
        /// Requested height.
        height: usize,
        /// Width found in the file.
        actual_width: usize,
        /// Height found in the file.
        actual_height: usize,
    },

    /// No in-memory image is held for the requested size.
    #[error("no image for {width}x{height}")]
    Missing {
        /// Requested width.
        width: usize,
        /// Requested height.
        height: usize,
    },

    /// The pixel data does not form a grid.
    #[error(transparent)]
    Grid(#[from] GridError),
}

/// Errors that end a driver session.
#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    /// A broker call failed.
    #[error("broker call failed: {0}")]
    Rpc(#[from] RpcError),

    /// Loading or writing an image failed.
    #[error(transparent)]
    Image(#[from] ImageError),
}
