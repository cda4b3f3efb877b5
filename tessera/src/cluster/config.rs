//! Clustering configuration.

use serde::Serialize;

use super::ClusterError;
use crate::coord::MAX_SUPPORTED_LEVEL;

/// Default finest level that clusters are maintained for.
pub const DEFAULT_CLUSTER_MAX_LEVEL: u8 = 18;

/// Default merge radius at level 0, in coordinate units.
pub const DEFAULT_CLUSTER_RADIUS: f64 = 5.0;

/// Merge radius per level.
///
/// The threshold table is built once and never changes. By default level
/// `z` merges points within `radius * 2^-z`, so each finer level halves the
/// radius. An explicit table may be supplied instead as long as it never
/// grows from one level to the next.
///
/// # Example
///
/// ```
/// use tessera::cluster::ClusterConfig;
///
/// let config = ClusterConfig::new(4, 8.0).unwrap();
/// assert_eq!(config.threshold(0), 8.0);
/// assert_eq!(config.threshold(3), 1.0);
/// // Levels past the table use the finest threshold
/// assert_eq!(config.threshold(10), 0.5);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClusterConfig {
    max_level: u8,
    radius: f64,
    thresholds: Vec<f64>,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            max_level: DEFAULT_CLUSTER_MAX_LEVEL,
            radius: DEFAULT_CLUSTER_RADIUS,
            thresholds: halving_table(DEFAULT_CLUSTER_MAX_LEVEL, DEFAULT_CLUSTER_RADIUS),
        }
    }
}

impl ClusterConfig {
    /// Thresholds halving from `radius` at level 0 down to `max_level`.
    pub fn new(max_level: u8, radius: f64) -> Result<Self, ClusterError> {
        if max_level > MAX_SUPPORTED_LEVEL {
            return Err(ClusterError::InvalidLevel(max_level));
        }
        if !radius.is_finite() || radius < 0.0 {
            return Err(ClusterError::InvalidRadius(radius));
        }
        Ok(Self {
            max_level,
            radius,
            thresholds: halving_table(max_level, radius),
        })
    }

    /// Explicit per-level thresholds, index 0 being the coarsest level.
    pub fn with_thresholds(thresholds: Vec<f64>) -> Result<Self, ClusterError> {
        if thresholds.is_empty() {
            return Err(ClusterError::InvalidThresholds(
                "at least one level is required".to_string(),
            ));
        }
        if thresholds.len() > MAX_SUPPORTED_LEVEL as usize + 1 {
            return Err(ClusterError::InvalidLevel((thresholds.len() - 1) as u8));
        }
        if let Some((level, value)) = thresholds
            .iter()
            .enumerate()
            .find(|(_, t)| !t.is_finite() || **t < 0.0)
        {
            return Err(ClusterError::InvalidThresholds(format!(
                "level {} has invalid threshold {}",
                level, value
            )));
        }
        if let Some(level) = thresholds.windows(2).position(|w| w[1] > w[0]) {
            return Err(ClusterError::InvalidThresholds(format!(
                "threshold grows from level {} to {}",
                level,
                level + 1
            )));
        }

        Ok(Self {
            max_level: (thresholds.len() - 1) as u8,
            radius: thresholds[0],
            thresholds,
        })
    }

    /// Finest level with its own cluster set.
    pub fn max_level(&self) -> u8 {
        self.max_level
    }

    /// Threshold at level 0.
    pub fn radius(&self) -> f64 {
        self.radius
    }

    /// Merge threshold at `level`, clamped to `max_level`.
    pub fn threshold(&self, level: u8) -> f64 {
        self.thresholds[level.min(self.max_level) as usize]
    }

    pub fn thresholds(&self) -> &[f64] {
        &self.thresholds
    }
}

fn halving_table(max_level: u8, radius: f64) -> Vec<f64> {
    (0..=max_level as i32)
        .map(|level| radius * 2f64.powi(-level))
        .collect()
}
