//! Core coordinate types for the tile pyramid.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Highest pyramid level supported by [`TileIndex`].
///
/// `2^30` is the largest power of two that still fits in an `i32` index.
pub const MAX_SUPPORTED_LEVEL: u8 = 30;

/// Errors produced by coordinate parsing and validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoordError {
    /// Level is beyond [`MAX_SUPPORTED_LEVEL`].
    #[error("Invalid level: {0} (max: {max})", max = MAX_SUPPORTED_LEVEL)]
    InvalidLevel(u8),

    /// A tile key could not be parsed back into an index.
    #[error("Invalid tile key: {0:?}")]
    InvalidKey(String),
}

/// A position in layer pixel space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    /// Create a new point.
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// True when both coordinates are finite numbers.
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    /// Multiply both coordinates by `factor`.
    pub fn scale(&self, factor: f64) -> Self {
        Self::new(self.x * factor, self.y * factor)
    }

    /// Squared Euclidean distance to `other`.
    pub fn distance_sq(&self, other: &Point) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }

    /// Euclidean distance to `other`.
    pub fn distance(&self, other: &Point) -> f64 {
        self.distance_sq(other).sqrt()
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// A viewport or region extent in layer pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    /// Create a new size.
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// True when both dimensions are finite numbers.
    pub fn is_finite(&self) -> bool {
        self.width.is_finite() && self.height.is_finite()
    }

    /// Multiply both dimensions by `factor`.
    pub fn scale(&self, factor: f64) -> Self {
        Self::new(self.width * factor, self.height * factor)
    }
}

/// Identifies one tile in the quad pyramid.
///
/// Tile `(x, y)` at level `z` is covered by the 2×2 block
/// `(2x, 2y), (2x, 2y + 1), (2x + 1, 2y), (2x + 1, 2y + 1)` at level `z + 1`.
///
/// Indices are signed so that selection can produce positions left of or
/// above the origin before wrapping. Use [`TileIndex::normalize`] to obtain
/// an index that names an existing tile.
///
/// # Example
///
/// ```
/// use tessera::coord::TileIndex;
///
/// let index = TileIndex::new(3, 5, 4);
/// assert_eq!(index.key(), "4-3-5");
/// assert_eq!(index.parent(), Some(TileIndex::new(1, 2, 3)));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TileIndex {
    /// Column (increases eastward)
    pub x: i32,
    /// Row (increases southward)
    pub y: i32,
    /// Pyramid level
    pub level: u8,
}

impl TileIndex {
    /// Create a new tile index.
    pub const fn new(x: i32, y: i32, level: u8) -> Self {
        Self { x, y, level }
    }

    /// Canonical cache key: `"level-x-y"`.
    ///
    /// Injective over all `(x, y, level)` triples because the separators
    /// cannot occur inside a decimal integer except as a leading minus sign,
    /// and [`FromStr`] parses the text back unambiguously.
    pub fn key(&self) -> String {
        format!("{}-{}-{}", self.level, self.x, self.y)
    }

    /// Number of tiles along one axis at this index's level.
    pub fn tiles_at_level(&self) -> i64 {
        super::tiles_at_level(self.level)
    }

    /// True when both axes fall within `[0, 2^level)`.
    pub fn is_in_range(&self) -> bool {
        let n = self.tiles_at_level();
        (0..n).contains(&(self.x as i64)) && (0..n).contains(&(self.y as i64))
    }

    /// Wrap the flagged axes into `[0, 2^level)` using floored modulo.
    ///
    /// Axes whose flag is off are returned untouched, even when out of range.
    pub fn wrap(&self, wrap_x: bool, wrap_y: bool) -> Self {
        let n = self.tiles_at_level();
        let x = if wrap_x {
            (self.x as i64).rem_euclid(n) as i32
        } else {
            self.x
        };
        let y = if wrap_y {
            (self.y as i64).rem_euclid(n) as i32
        } else {
            self.y
        };
        Self::new(x, y, self.level)
    }

    /// Wrap the flagged axes and reject the index if it still names a tile
    /// that does not exist at its level.
    pub fn normalize(&self, wrap_x: bool, wrap_y: bool) -> Option<Self> {
        let wrapped = self.wrap(wrap_x, wrap_y);
        wrapped.is_in_range().then_some(wrapped)
    }

    /// The tile one level up that covers this one, or `None` at level 0.
    pub fn parent(&self) -> Option<Self> {
        if self.level == 0 {
            return None;
        }
        Some(Self::new(
            self.x.div_euclid(2),
            self.y.div_euclid(2),
            self.level - 1,
        ))
    }

    /// The 2×2 block one level down, or `None` at [`MAX_SUPPORTED_LEVEL`]
    /// (or when the doubled index no longer fits in an `i32`).
    pub fn children(&self) -> Option<[Self; 4]> {
        if self.level >= MAX_SUPPORTED_LEVEL {
            return None;
        }
        let x = self.x.checked_mul(2).filter(|x| *x < i32::MAX)?;
        let y = self.y.checked_mul(2).filter(|y| *y < i32::MAX)?;
        let level = self.level + 1;
        Some([
            Self::new(x, y, level),
            Self::new(x, y + 1, level),
            Self::new(x + 1, y, level),
            Self::new(x + 1, y + 1, level),
        ])
    }
}

impl fmt::Display for TileIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}-{}", self.level, self.x, self.y)
    }
}

impl FromStr for TileIndex {
    type Err = CoordError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || CoordError::InvalidKey(s.to_string());

        // Level never carries a sign, so the first '-' ends it. The x/y
        // split is the first '-' after a digit, since y may be negative.
        let (level, rest) = s.split_once('-').ok_or_else(invalid)?;
        let split = rest
            .char_indices()
            .skip(1)
            .find(|&(_, c)| c == '-')
            .map(|(i, _)| i)
            .ok_or_else(invalid)?;
        let (x, y) = (&rest[..split], &rest[split + 1..]);

        let level: u8 = level.parse().map_err(|_| invalid())?;
        if level > MAX_SUPPORTED_LEVEL {
            return Err(CoordError::InvalidLevel(level));
        }
        let x: i32 = x.parse().map_err(|_| invalid())?;
        let y: i32 = y.parse().map_err(|_| invalid())?;
        Ok(Self::new(x, y, level))
    }
}
