//! Tile layer configuration.

use serde::Serialize;

use super::LayerError;
use crate::coord::{Point, MAX_SUPPORTED_LEVEL};
use crate::tile::TileSize;

// ==================== Layer Defaults ====================

/// Default minimum zoom level available.
pub const DEFAULT_MIN_LEVEL: u8 = 0;

/// Default maximum zoom level available.
pub const DEFAULT_MAX_LEVEL: u8 = 18;

/// Default tile width as displayed, without overlap.
pub const DEFAULT_TILE_WIDTH: u32 = 256;

/// Default tile height as displayed, without overlap.
pub const DEFAULT_TILE_HEIGHT: u32 = 256;

/// Default overlap between neighbouring tiles in pixels.
pub const DEFAULT_TILE_OVERLAP: u32 = 0;

/// Default maximum number of cached tiles.
pub const DEFAULT_CACHE_SIZE: usize = 200;

/// Default wrapping in the x direction.
pub const DEFAULT_WRAP_X: bool = true;

/// Default wrapping in the y direction.
pub const DEFAULT_WRAP_Y: bool = false;

/// Default local coordinate bounds at level 0.
pub const DEFAULT_MIN_X: f64 = 0.0;
pub const DEFAULT_MAX_X: f64 = 255.0;
pub const DEFAULT_MIN_Y: f64 = 0.0;
pub const DEFAULT_MAX_Y: f64 = 255.0;

/// Configuration for a [`TileLayer`](super::TileLayer).
///
/// Built once and handed to the layer by value. The `with_*` methods
/// consume the config and return the modified copy, so an override never
/// mutates a config that is already shared.
///
/// # Example
///
/// ```
/// use tessera::layer::LayerConfig;
///
/// let config = LayerConfig::default()
///     .with_levels(0, 10)
///     .with_cache_size(64)
///     .with_wrap(false, false);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayerConfig {
    /// The minimum zoom level available.
    pub min_level: u8,
    /// The maximum zoom level available.
    pub max_level: u8,
    /// The tile width as displayed, without overlap.
    pub tile_width: u32,
    /// The tile height as displayed, without overlap.
    pub tile_height: u32,
    /// Number of pixels of overlap between tiles.
    pub tile_overlap: u32,
    /// The maximum number of tiles to cache.
    pub cache_size: usize,
    /// Wrap in the x direction.
    pub wrap_x: bool,
    /// Wrap in the y direction.
    pub wrap_y: bool,
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
}

impl Default for LayerConfig {
    fn default() -> Self {
        Self {
            min_level: DEFAULT_MIN_LEVEL,
            max_level: DEFAULT_MAX_LEVEL,
            tile_width: DEFAULT_TILE_WIDTH,
            tile_height: DEFAULT_TILE_HEIGHT,
            tile_overlap: DEFAULT_TILE_OVERLAP,
            cache_size: DEFAULT_CACHE_SIZE,
            wrap_x: DEFAULT_WRAP_X,
            wrap_y: DEFAULT_WRAP_Y,
            min_x: DEFAULT_MIN_X,
            max_x: DEFAULT_MAX_X,
            min_y: DEFAULT_MIN_Y,
            max_y: DEFAULT_MAX_Y,
        }
    }
}

impl LayerConfig {
    /// Set the available zoom range.
    pub fn with_levels(mut self, min_level: u8, max_level: u8) -> Self {
        self.min_level = min_level;
        self.max_level = max_level;
        self
    }

    /// Set the tile dimensions (without overlap).
    pub fn with_tile_size(mut self, width: u32, height: u32) -> Self {
        self.tile_width = width;
        self.tile_height = height;
        self
    }

    pub fn with_tile_overlap(mut self, overlap: u32) -> Self {
        self.tile_overlap = overlap;
        self
    }

    pub fn with_cache_size(mut self, cache_size: usize) -> Self {
        self.cache_size = cache_size;
        self
    }

    /// Set wrapping per axis.
    pub fn with_wrap(mut self, wrap_x: bool, wrap_y: bool) -> Self {
        self.wrap_x = wrap_x;
        self.wrap_y = wrap_y;
        self
    }

    /// Set the local coordinate bounds at level 0.
    pub fn with_bounds(mut self, min_x: f64, max_x: f64, min_y: f64, max_y: f64) -> Self {
        self.min_x = min_x;
        self.max_x = max_x;
        self.min_y = min_y;
        self.max_y = max_y;
        self
    }

    /// Check the configuration for values the layer cannot work with.
    pub fn validate(&self) -> Result<(), LayerError> {
        if self.min_level > self.max_level {
            return Err(LayerError::Config(format!(
                "min_level {} exceeds max_level {}",
                self.min_level, self.max_level
            )));
        }
        if self.max_level > MAX_SUPPORTED_LEVEL {
            return Err(LayerError::Config(format!(
                "max_level {} exceeds supported maximum {}",
                self.max_level, MAX_SUPPORTED_LEVEL
            )));
        }
        if self.tile_width == 0 || self.tile_height == 0 {
            return Err(LayerError::Config(format!(
                "tile size must be non-zero (got {}x{})",
                self.tile_width, self.tile_height
            )));
        }
        let padded = |side: u32| {
            self.tile_overlap
                .checked_mul(2)
                .and_then(|border| side.checked_add(border))
        };
        if padded(self.tile_width).is_none() || padded(self.tile_height).is_none() {
            return Err(LayerError::Config(format!(
                "tile_overlap {} overflows the {}x{} tile size",
                self.tile_overlap, self.tile_width, self.tile_height
            )));
        }
        if self.cache_size == 0 {
            return Err(LayerError::Config(
                "cache_size must be at least 1".to_string(),
            ));
        }
        let bounds = [self.min_x, self.max_x, self.min_y, self.max_y];
        if bounds.iter().any(|b| !b.is_finite())
            || self.max_x <= self.min_x
            || self.max_y <= self.min_y
        {
            return Err(LayerError::Config(format!(
                "degenerate bounds x=[{}, {}] y=[{}, {}]",
                self.min_x, self.max_x, self.min_y, self.max_y
            )));
        }
        Ok(())
    }

    /// Size of a tile as stored, including the overlap border on both sides.
    pub fn tile_size(&self) -> TileSize {
        TileSize {
            width: self
                .tile_width
                .saturating_add(self.tile_overlap.saturating_mul(2)),
            height: self
                .tile_height
                .saturating_add(self.tile_overlap.saturating_mul(2)),
        }
    }

    /// Convert level-0 layer pixels to map units.
    pub fn from_local(&self, point: Point) -> Point {
        Point::new(
            (self.max_x - self.min_x) * point.x / self.tile_width as f64,
            (self.max_y - self.min_y) * point.y / self.tile_height as f64,
        )
    }

    /// Convert map units to level-0 layer pixels.
    pub fn to_local(&self, point: Point) -> Point {
        Point::new(
            self.tile_width as f64 * point.x / (self.max_x - self.min_x),
            self.tile_height as f64 * point.y / (self.max_y - self.min_y),
        )
    }
}
