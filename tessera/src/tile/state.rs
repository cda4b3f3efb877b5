//! The fetchable tile unit and its state machine.

use bytes::Bytes;
use serde::Serialize;

use super::FetchError;
use crate::coord::TileIndex;

/// Observable fetch state of a tile.
///
/// ```text
/// Pending --complete(Ok)--> Ready
/// Pending --complete(Err)--> Failed --retry()--> Pending
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TileState {
    Pending,
    Ready,
    Failed,
}

impl std::fmt::Display for TileState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TileState::Pending => write!(f, "pending"),
            TileState::Ready => write!(f, "ready"),
            TileState::Failed => write!(f, "failed"),
        }
    }
}

/// Tile dimensions in logical pixels, including the overlap border.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct TileSize {
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone)]
enum Status {
    Pending,
    Ready(Bytes),
    Failed(FetchError),
}

/// One unit of fetchable map data.
///
/// The index and source key are fixed at construction. The status moves out
/// of `Pending` exactly once per fetch; a failed tile only becomes pending
/// again through an explicit [`Tile::retry`].
///
/// Cloning a tile is cheap (the payload is reference counted) and yields a
/// read-only snapshot for rendering.
#[derive(Debug, Clone)]
pub struct Tile {
    index: TileIndex,
    size: TileSize,
    source_key: String,
    status: Status,
    serial: u64,
}

impl Tile {
    /// Create a new pending tile.
    pub fn new(index: TileIndex, size: TileSize, source_key: impl Into<String>) -> Self {
        Self {
            index,
            size,
            source_key: source_key.into(),
            status: Status::Pending,
            serial: 0,
        }
    }

    pub fn index(&self) -> TileIndex {
        self.index
    }

    /// Cache key of this tile (see [`TileIndex::key`]).
    pub fn key(&self) -> String {
        self.index.key()
    }

    pub fn size(&self) -> TileSize {
        self.size
    }

    /// Source key (usually a URL) resolved from the index.
    pub fn source_key(&self) -> &str {
        &self.source_key
    }

    pub fn state(&self) -> TileState {
        match self.status {
            Status::Pending => TileState::Pending,
            Status::Ready(_) => TileState::Ready,
            Status::Failed(_) => TileState::Failed,
        }
    }

    /// Decoded payload, present only once the tile is ready.
    pub fn payload(&self) -> Option<&Bytes> {
        match &self.status {
            Status::Ready(payload) => Some(payload),
            _ => None,
        }
    }

    /// Fetch error, present only once the tile has failed.
    pub fn error(&self) -> Option<&FetchError> {
        match &self.status {
            Status::Failed(err) => Some(err),
            _ => None,
        }
    }

    /// Insertion serial assigned by the cache.
    ///
    /// A fetch completion carries the serial it was issued for; a mismatch
    /// means the tile was evicted and re-created in the meantime.
    pub fn serial(&self) -> u64 {
        self.serial
    }

    pub(crate) fn set_serial(&mut self, serial: u64) {
        self.serial = serial;
    }

    /// Apply a fetch result.
    ///
    /// Returns `false` without touching the tile unless it is pending.
    pub fn complete(&mut self, result: Result<Bytes, FetchError>) -> bool {
        if !matches!(self.status, Status::Pending) {
            return false;
        }
        self.status = match result {
            Ok(payload) => Status::Ready(payload),
            Err(err) => Status::Failed(err),
        };
        true
    }

    /// Re-request a failed tile, moving it back to pending.
    ///
    /// Returns `false` for tiles that are pending or ready.
    pub fn retry(&mut self) -> bool {
        if !matches!(self.status, Status::Failed(_)) {
            return false;
        }
        self.status = Status::Pending;
        true
    }
}
