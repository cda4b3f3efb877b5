//! Results of fetch and view update runs.

use std::fmt;

use serde::Serialize;

/// Outcome of one [`TileLayer::load`](super::TileLayer::load) or
/// [`TileLayer::prefetch`](super::TileLayer::prefetch) run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FetchSummary {
    /// Fetches issued.
    pub requested: usize,
    /// Fetches that made a tile ready.
    pub ready: usize,
    /// Fetches that left a tile failed.
    pub failed: usize,
    /// Tiles not fetched because they were already ready or failed.
    pub skipped: usize,
    /// Completions dropped because their tile was evicted or replaced.
    pub discarded: usize,
    /// Fetches still in flight when the run was cancelled.
    pub cancelled: usize,
    /// Whether the run was cancelled.
    pub was_cancelled: bool,
}

impl FetchSummary {
    /// Number of issued fetches that settled.
    pub fn settled(&self) -> usize {
        self.ready + self.failed + self.discarded
    }
}

impl fmt::Display for FetchSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} requested, {} ready, {} failed, {} skipped, {} discarded",
            self.requested, self.ready, self.failed, self.skipped, self.discarded
        )?;
        if self.was_cancelled {
            write!(f, " (cancelled with {} in flight)", self.cancelled)?;
        }
        Ok(())
    }
}

/// Outcome of [`TileLayer::update_view`](super::TileLayer::update_view).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ViewUpdate {
    /// Tiles covering the viewport.
    pub selected: usize,
    /// Tiles newly added to the active set.
    pub drawn: usize,
    /// Previously active tiles that left the view.
    pub removed: usize,
    /// Fetch statistics for the selected tiles.
    pub fetch: FetchSummary,
}

impl fmt::Display for ViewUpdate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} selected, {} drawn, {} removed; fetch: {}",
            self.selected, self.drawn, self.removed, self.fetch
        )
    }
}
