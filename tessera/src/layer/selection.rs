//! Viewport to tile-range selection.
//!
//! A viewport is a center and size in layer pixels at one zoom level. The
//! covering range starts at the tile containing the top-left corner and ends
//! (exclusive) past the tile containing the bottom-right corner.

use std::ops::Range;

use serde::{Deserialize, Serialize};

use super::LevelScales;
use crate::coord::{tile_at_point, tiles_at_level, Point, Size, TileIndex};

/// What the renderer is looking at.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    /// Zoom level
    pub level: u8,
    /// Center in layer pixels at `level`
    pub center: Point,
    /// Extent in layer pixels at `level`
    pub size: Size,
}

impl Viewport {
    pub fn new(level: u8, center: Point, size: Size) -> Self {
        Self {
            level,
            center,
            size,
        }
    }

    pub fn is_finite(&self) -> bool {
        self.center.is_finite() && self.size.is_finite()
    }

    /// The same view expressed at another level.
    ///
    /// Center and size are rescaled by `2^(level - self.level)`.
    pub fn at_level(&self, level: u8, scales: &LevelScales) -> Self {
        let factor = scales.ratio(self.level, level);
        Self::new(level, self.center.scale(factor), self.size.scale(factor))
    }
}

/// Half-open rectangle of tile columns and rows at one level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileRange {
    pub level: u8,
    pub start_x: i64,
    pub start_y: i64,
    pub end_x: i64,
    pub end_y: i64,
}

impl TileRange {
    /// The range of tiles touched by a viewport.
    ///
    /// # Arguments
    ///
    /// * `level` - Zoom level of the viewport
    /// * `center` - Viewport center in pixels at `level`
    /// * `size` - Viewport size in pixels at `level`
    /// * `tile_width` / `tile_height` - Tile dimensions without overlap
    ///
    /// # Returns
    ///
    /// An empty range when the viewport is not finite or has a negative
    /// extent.
    pub fn covering(
        level: u8,
        center: Point,
        size: Size,
        tile_width: u32,
        tile_height: u32,
    ) -> Self {
        if !center.is_finite() || !size.is_finite() {
            return Self::empty(level);
        }

        let top_left = Point::new(center.x - size.width / 2.0, center.y - size.height / 2.0);
        let (start_x, start_y) = tile_at_point(top_left, tile_width, tile_height);
        let end_x = ((center.x + size.width / 2.0) / tile_width as f64).ceil() as i64;
        let end_y = ((center.y + size.height / 2.0) / tile_height as f64).ceil() as i64;

        Self {
            level,
            start_x,
            start_y,
            end_x,
            end_y,
        }
    }

    fn empty(level: u8) -> Self {
        Self {
            level,
            start_x: 0,
            start_y: 0,
            end_x: 0,
            end_y: 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.start_x >= self.end_x || self.start_y >= self.end_y
    }

    /// Existing tiles in the range, column-major.
    ///
    /// Flagged axes are wrapped into `[0, 2^level)`; on other axes indices
    /// outside that interval are dropped. A wrapped axis never yields the
    /// same column twice, even for a viewport wider than the world.
    pub fn indices(&self, wrap_x: bool, wrap_y: bool) -> Vec<TileIndex> {
        if self.is_empty() {
            return Vec::new();
        }
        let n = tiles_at_level(self.level);
        let xs = axis_span(self.start_x, self.end_x, n, wrap_x);
        let ys = axis_span(self.start_y, self.end_y, n, wrap_y);

        let mut indices = Vec::with_capacity(xs.clone().count() * ys.clone().count());
        for i in xs {
            let x = if wrap_x { i.rem_euclid(n) } else { i };
            for j in ys.clone() {
                let y = if wrap_y { j.rem_euclid(n) } else { j };
                indices.push(TileIndex::new(x as i32, y as i32, self.level));
            }
        }
        indices
    }
}

/// Positions to visit along one axis before wrapping.
///
/// Wrapped spans are capped at one full turn; unwrapped spans are clipped to
/// the tiles that exist.
fn axis_span(start: i64, end: i64, n: i64, wrap: bool) -> Range<i64> {
    if start >= end {
        return 0..0;
    }
    if wrap {
        let end = if end.saturating_sub(start) >= n {
            start.saturating_add(n)
        } else {
            end
        };
        start..end
    } else {
        start.max(0)..end.min(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn range(level: u8, cx: f64, cy: f64, w: f64, h: f64) -> TileRange {
        TileRange::covering(level, Point::new(cx, cy), Size::new(w, h), 256, 256)
    }

    #[test]
    fn test_viewport_inside_single_tile() {
        let r = range(0, 128.0, 128.0, 100.0, 100.0);
        assert_eq!((r.start_x, r.end_x, r.start_y, r.end_y), (0, 1, 0, 1));
        assert_eq!(r.indices(false, false), vec![TileIndex::new(0, 0, 0)]);
    }

    #[test]
    fn test_range_spans_tiles() {
        // 512x512 view centered on the corner shared by four level-1 tiles
        let r = range(1, 256.0, 256.0, 512.0, 512.0);
        let indices = r.indices(false, false);
        assert_eq!(
            indices,
            vec![
                TileIndex::new(0, 0, 1),
                TileIndex::new(0, 1, 1),
                TileIndex::new(1, 0, 1),
                TileIndex::new(1, 1, 1),
            ]
        );
    }

    #[test]
    fn test_inverted_range_is_empty() {
        let r = range(3, 100.0, 100.0, -50.0, 10.0);
        assert!(r.is_empty());
        assert!(r.indices(true, true).is_empty());
    }

    #[test]
    fn test_non_finite_viewport_is_empty() {
        let r = range(3, f64::NAN, 100.0, 50.0, 10.0);
        assert!(r.is_empty());
    }

    #[test]
    fn test_unwrapped_out_of_range_dropped() {
        // Level 1 has two columns; the view reaches one column past each side
        let r = range(1, 256.0, 128.0, 1000.0, 100.0);
        let indices = r.indices(false, false);
        assert_eq!(
            indices,
            vec![TileIndex::new(0, 0, 1), TileIndex::new(1, 0, 1)]
        );
    }

    #[test]
    fn test_wrapped_negative_columns() {
        let r = range(2, 0.0, 128.0, 256.0, 100.0);
        assert_eq!(r.start_x, -1);
        let indices = r.indices(true, false);
        assert_eq!(
            indices,
            vec![TileIndex::new(3, 0, 2), TileIndex::new(0, 0, 2)]
        );
    }

    #[test]
    fn test_wide_wrapped_view_has_no_duplicates() {
        let r = range(1, 0.0, 128.0, 5000.0, 100.0);
        let indices = r.indices(true, false);
        assert_eq!(indices.len(), 2);
        assert_ne!(indices[0], indices[1]);
    }

    #[test]
    fn test_viewport_at_level() {
        let scales = LevelScales::new(10);
        let view = Viewport::new(4, Point::new(800.0, 400.0), Size::new(160.0, 80.0));
        let coarse = view.at_level(2, &scales);
        assert_eq!(coarse.level, 2);
        assert_eq!(coarse.center, Point::new(200.0, 100.0));
        assert_eq!(coarse.size, Size::new(40.0, 20.0));
    }
}
