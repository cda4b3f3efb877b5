//! Clustering error types.

use thiserror::Error;

/// Errors raised by cluster configuration and point insertion.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ClusterError {
    /// A point with a NaN or infinite coordinate was rejected.
    #[error("Point ({x}, {y}) has a non-finite coordinate")]
    NonFinite { x: f64, y: f64 },

    /// The base radius is negative or not finite.
    #[error("Invalid cluster radius: {0}")]
    InvalidRadius(f64),

    /// The maximum level is beyond what the threshold table supports.
    #[error("Invalid cluster max level: {0} (max: {max})", max = crate::coord::MAX_SUPPORTED_LEVEL)]
    InvalidLevel(u8),

    /// An explicit threshold table failed validation.
    #[error("Invalid threshold table: {0}")]
    InvalidThresholds(String),
}
