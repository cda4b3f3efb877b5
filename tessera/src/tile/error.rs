//! Error types for tile fetching.

use thiserror::Error;

/// Errors that can occur while fetching a tile payload.
///
/// A failed fetch is local to its tile: the tile moves to
/// [`TileState::Failed`](super::TileState::Failed) and keeps the error for
/// inspection. Nothing here is fatal to the layer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// Transport-level failure (connection, timeout, body read).
    #[error("HTTP error: {0}")]
    Http(String),

    /// The source answered with a non-success status.
    #[error("HTTP {status} from {source_key}")]
    Status { status: u16, source_key: String },

    /// The tile source itself reported a problem.
    #[error("Tile source error: {0}")]
    Source(String),
}
