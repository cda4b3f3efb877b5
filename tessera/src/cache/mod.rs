//! Tile caching
//!
//! [`TileCache`] keeps recently used tiles in memory, bounded by a capacity,
//! and never evicts tiles that are currently drawn.

mod stats;
mod tile_cache;

pub use stats::CacheStats;
pub use tile_cache::TileCache;
