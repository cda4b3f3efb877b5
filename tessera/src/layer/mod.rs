//! Tile layers
//!
//! A [`TileLayer`] turns a [`Viewport`] into the set of tiles covering it,
//! resolves them through its [`TileCache`](crate::cache::TileCache), fetches
//! pending tiles in [`LoadMetric`] order and tracks which tiles are drawn.
//!
//! # Data flow
//!
//! ```text
//! Viewport ──► select ──► TileCache (get or create Pending)
//!                               │
//!                     load (concurrent fetches)
//!                               │
//!               completions applied in arrival order
//!                               │
//!                  Ready tiles drawn ──► LayerEvent
//! ```

mod config;
mod error;
mod events;
mod metric;
mod scales;
mod selection;
mod summary;
mod tile_layer;

pub use config::{
    LayerConfig, DEFAULT_CACHE_SIZE, DEFAULT_MAX_LEVEL, DEFAULT_MAX_X, DEFAULT_MAX_Y,
    DEFAULT_MIN_LEVEL, DEFAULT_MIN_X, DEFAULT_MIN_Y, DEFAULT_TILE_HEIGHT, DEFAULT_TILE_OVERLAP,
    DEFAULT_TILE_WIDTH, DEFAULT_WRAP_X, DEFAULT_WRAP_Y,
};
pub use error::LayerError;
pub use events::{LayerEvent, EVENT_CHANNEL_CAPACITY};
pub use metric::LoadMetric;
pub use scales::LevelScales;
pub use selection::{TileRange, Viewport};
pub use summary::{FetchSummary, ViewUpdate};
pub use tile_layer::TileLayer;
