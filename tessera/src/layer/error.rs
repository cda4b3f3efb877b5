//! Layer error types.

use thiserror::Error;

/// Errors raised by [`TileLayer`](super::TileLayer) operations.
///
/// Fetch failures are not errors at this level; they are recorded on the
/// tile itself and reported through [`LayerEvent::TileFailed`](super::LayerEvent).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LayerError {
    /// The layer configuration is unusable.
    #[error("Invalid layer configuration: {0}")]
    Config(String),

    /// The operation needs a cached tile and none exists for this key.
    #[error("Tile not cached: {0}")]
    NotCached(String),
}
