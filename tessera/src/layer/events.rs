//! Typed layer notifications.
//!
//! The layer never calls into a renderer. Instead it broadcasts
//! [`LayerEvent`]s that a renderer (or anything else) can subscribe to via
//! [`TileLayer::subscribe`](super::TileLayer::subscribe).

use crate::coord::TileIndex;
use crate::tile::FetchError;

/// Capacity of the layer event channel.
///
/// Slow subscribers lag and skip events rather than blocking the layer.
pub const EVENT_CHANNEL_CAPACITY: usize = 1024;

/// Something observable happened to a layer's tiles.
#[derive(Debug, Clone, PartialEq)]
pub enum LayerEvent {
    /// A fetch completed and the tile payload is available.
    TileReady { index: TileIndex },
    /// A fetch failed; the tile stays cached in the failed state.
    TileFailed { index: TileIndex, error: FetchError },
    /// A tile entered the active (drawn) set.
    TileDrawn { index: TileIndex },
    /// A tile left the active set.
    TileRemoved { index: TileIndex },
    /// A tile was dropped from the cache to respect its capacity.
    TileEvicted { index: TileIndex },
    /// Every cached tile was active and the cache grew past capacity.
    CacheOverflow { len: usize, capacity: usize },
    /// The active set and cache were dropped.
    Reset,
}
