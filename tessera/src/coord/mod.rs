//! Tile pyramid coordinates
//!
//! Provides the [`TileIndex`] value type, its canonical key scheme, wrap
//! normalisation, and the parent/child relationships of the quad pyramid.
//! Positions are expressed in layer pixels relative to the level being
//! queried: a point `p` lies in tile `floor(p / tile_size)`.

mod types;

pub use types::{CoordError, Point, Size, TileIndex, MAX_SUPPORTED_LEVEL};

/// Number of tiles along one axis at `level` (`2^level`).
#[inline]
pub fn tiles_at_level(level: u8) -> i64 {
    1_i64 << level.min(MAX_SUPPORTED_LEVEL)
}

/// Returns the `(column, row)` of the tile containing `point`.
///
/// # Arguments
///
/// * `point` - Position in layer pixels at the level of interest
/// * `tile_width` - Tile width in pixels
/// * `tile_height` - Tile height in pixels
#[inline]
pub fn tile_at_point(point: Point, tile_width: u32, tile_height: u32) -> (i64, i64) {
    (
        (point.x / tile_width as f64).floor() as i64,
        (point.y / tile_height as f64).floor() as i64,
    )
}
