//! Cache statistics.

use std::fmt;

use serde::Serialize;

/// Counters maintained by [`TileCache`](super::TileCache).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Lookups that found an entry.
    pub hits: u64,
    /// Lookups that found nothing.
    pub misses: u64,
    /// Tiles inserted (including replacements).
    pub insertions: u64,
    /// Entries removed to respect capacity.
    pub evictions: u64,
    /// Insertions that had to exceed capacity because every entry was active.
    pub overflows: u64,
}

impl CacheStats {
    /// Create zeroed statistics.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fraction of lookups that hit, or 0.0 before any lookup.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} hits, {} misses ({:.1}% hit rate), {} insertions, {} evictions, {} overflows",
            self.hits,
            self.misses,
            self.hit_rate() * 100.0,
            self.insertions,
            self.evictions,
            self.overflows
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_default() {
        let stats = CacheStats::default();
        assert_eq!(stats.hits, 0);
        assert_eq!(stats.misses, 0);
        assert_eq!(stats.hit_rate(), 0.0);
    }

    #[test]
    fn test_hit_rate() {
        let stats = CacheStats {
            hits: 3,
            misses: 1,
            ..CacheStats::default()
        };
        assert!((stats.hit_rate() - 0.75).abs() < f64::EPSILON);
    }

    #[test]
    fn test_stats_display() {
        let stats = CacheStats {
            hits: 10,
            misses: 10,
            insertions: 7,
            evictions: 2,
            overflows: 1,
        };
        let display = stats.to_string();
        assert!(display.contains("10 hits"));
        assert!(display.contains("50.0% hit rate"));
        assert!(display.contains("2 evictions"));
        assert!(display.contains("1 overflows"));
    }
}
