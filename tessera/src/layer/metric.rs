//! Tile load ordering.

use std::cmp::Ordering;

use super::{LevelScales, Viewport};
use crate::coord::{tiles_at_level, TileIndex};

/// Orders tiles for fetching around a viewport center.
///
/// The order is total and deterministic:
///
/// 1. Tiles from a level closer to the query level come first.
/// 2. Between two levels equally far away, the lower level wins.
/// 3. Within a level, tiles closer to the center come first. Distance is
///    measured from the tile's middle `(x + 0.5, y + 0.5)` to the center,
///    both expressed in tiles at the tile's level. Wrapped axes use the
///    shorter way around.
/// 4. Ties fall back to `(level, y, x)`.
#[derive(Debug, Clone)]
pub struct LoadMetric<'a> {
    scales: &'a LevelScales,
    level: u8,
    center_x: f64,
    center_y: f64,
    wrap_x: bool,
    wrap_y: bool,
}

impl<'a> LoadMetric<'a> {
    /// Build the metric for a viewport.
    ///
    /// # Arguments
    ///
    /// * `viewport` - Query level and center (in pixels at that level)
    /// * `tile_width` / `tile_height` - Tile dimensions without overlap
    /// * `scales` - Level scale table used to move the center between levels
    pub fn new(
        viewport: &Viewport,
        tile_width: u32,
        tile_height: u32,
        scales: &'a LevelScales,
    ) -> Self {
        Self {
            scales,
            level: viewport.level,
            center_x: viewport.center.x / tile_width as f64,
            center_y: viewport.center.y / tile_height as f64,
            wrap_x: false,
            wrap_y: false,
        }
    }

    /// Measure distance the short way around on wrapped axes.
    pub fn with_wrap(mut self, wrap_x: bool, wrap_y: bool) -> Self {
        self.wrap_x = wrap_x;
        self.wrap_y = wrap_y;
        self
    }

    /// Squared distance, in tiles at the tile's own level, from the middle
    /// of `index` to the center.
    pub fn distance_sq(&self, index: &TileIndex) -> f64 {
        let ratio = self.scales.ratio(self.level, index.level);
        let n = tiles_at_level(index.level) as f64;

        let dx = axis_delta(index.x as f64 + 0.5, self.center_x * ratio, n, self.wrap_x);
        let dy = axis_delta(index.y as f64 + 0.5, self.center_y * ratio, n, self.wrap_y);
        dx * dx + dy * dy
    }

    pub fn compare(&self, a: &TileIndex, b: &TileIndex) -> Ordering {
        let level_distance = |index: &TileIndex| index.level.abs_diff(self.level);

        level_distance(a)
            .cmp(&level_distance(b))
            .then_with(|| a.level.cmp(&b.level))
            .then_with(|| self.distance_sq(a).total_cmp(&self.distance_sq(b)))
            .then_with(|| (a.level, a.y, a.x).cmp(&(b.level, b.y, b.x)))
    }

    /// Sort indices into load order.
    pub fn sort(&self, indices: &mut [TileIndex]) {
        indices.sort_by(|a, b| self.compare(a, b));
    }
}

fn axis_delta(tile: f64, center: f64, n: f64, wrap: bool) -> f64 {
    let delta = (tile - center).abs();
    if wrap {
        let delta = delta.rem_euclid(n);
        delta.min(n - delta)
    } else {
        delta
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coord::{Point, Size};

    fn viewport(level: u8, x: f64, y: f64) -> Viewport {
        Viewport::new(level, Point::new(x, y), Size::new(512.0, 512.0))
    }

    #[test]
    fn test_closer_tile_first_same_level() {
        let scales = LevelScales::new(18);
        let view = viewport(3, 640.0, 640.0); // center of tile (2, 2)
        let metric = LoadMetric::new(&view, 256, 256, &scales);

        let near = TileIndex::new(2, 2, 3);
        let far = TileIndex::new(5, 5, 3);
        assert_eq!(metric.compare(&near, &far), Ordering::Less);
        assert_eq!(metric.compare(&far, &near), Ordering::Greater);
        assert_eq!(metric.distance_sq(&near), 0.0);
    }

    #[test]
    fn test_closer_level_first() {
        let scales = LevelScales::new(18);
        let view = viewport(5, 0.0, 0.0);
        let metric = LoadMetric::new(&view, 256, 256, &scales);

        // Level 4 is closer to 5 than level 1, regardless of position
        let close_level = TileIndex::new(15, 15, 4);
        let far_level = TileIndex::new(0, 0, 1);
        assert_eq!(metric.compare(&close_level, &far_level), Ordering::Less);
    }

    #[test]
    fn test_equal_level_distance_prefers_lower_level() {
        let scales = LevelScales::new(18);
        let view = viewport(5, 0.0, 0.0);
        let metric = LoadMetric::new(&view, 256, 256, &scales);

        let coarser = TileIndex::new(0, 0, 4);
        let finer = TileIndex::new(0, 0, 6);
        assert_eq!(metric.compare(&coarser, &finer), Ordering::Less);
    }

    #[test]
    fn test_center_rescaled_to_tile_level() {
        let scales = LevelScales::new(18);
        // Center of tile (4, 4) at level 3 is the center of tile (2, 2) at level 2
        let view = viewport(3, 4.5 * 256.0, 4.5 * 256.0);
        let metric = LoadMetric::new(&view, 256, 256, &scales);

        let coarse = TileIndex::new(2, 2, 2);
        assert!((metric.distance_sq(&coarse) - 0.125).abs() < 1e-12);
        assert!(metric.distance_sq(&coarse) < metric.distance_sq(&TileIndex::new(1, 2, 2)));
    }

    #[test]
    fn test_wrapped_distance_goes_short_way() {
        let scales = LevelScales::new(18);
        // Level 3 has 8 columns; center is in column 0
        let view = viewport(3, 128.0, 128.0);
        let metric = LoadMetric::new(&view, 256, 256, &scales).with_wrap(true, false);

        let across_seam = TileIndex::new(7, 0, 3);
        let two_right = TileIndex::new(2, 0, 3);
        assert_eq!(metric.distance_sq(&across_seam), 1.0);
        assert_eq!(metric.compare(&across_seam, &two_right), Ordering::Less);
    }

    #[test]
    fn test_sort_is_deterministic() {
        let scales = LevelScales::new(18);
        let view = viewport(1, 256.0, 256.0);
        let metric = LoadMetric::new(&view, 256, 256, &scales);

        let mut a = vec![
            TileIndex::new(1, 1, 1),
            TileIndex::new(0, 0, 1),
            TileIndex::new(1, 0, 1),
            TileIndex::new(0, 1, 1),
        ];
        let mut b = a.clone();
        b.reverse();
        metric.sort(&mut a);
        metric.sort(&mut b);
        assert_eq!(a, b);
        // All four are equidistant; ties break by (y, x)
        assert_eq!(a[0], TileIndex::new(0, 0, 1));
        assert_eq!(a[1], TileIndex::new(1, 0, 1));
    }
}
