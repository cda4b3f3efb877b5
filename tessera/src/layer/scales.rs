//! Per-level scale lookup.

/// Precomputed `2^-level` table.
///
/// `scale(level)` is the size of one level-`level` pixel measured in level-0
/// pixels. Built once per layer; levels past the table are computed on
/// demand.
#[derive(Debug, Clone, PartialEq)]
pub struct LevelScales {
    scales: Vec<f64>,
}

impl LevelScales {
    /// Build the table for levels `0..=max_level`.
    pub fn new(max_level: u8) -> Self {
        let scales = (0..=max_level as i32).map(|l| 2f64.powi(-l)).collect();
        Self { scales }
    }

    /// Pixel scale at `level` relative to level 0.
    pub fn scale(&self, level: u8) -> f64 {
        self.scales
            .get(level as usize)
            .copied()
            .unwrap_or_else(|| 2f64.powi(-(level as i32)))
    }

    /// Factor converting level-`from` pixel coordinates to level-`to`
    /// coordinates: `2^(to - from)`.
    pub fn ratio(&self, from: u8, to: u8) -> f64 {
        self.scale(from) / self.scale(to)
    }

    /// Highest level held in the table.
    pub fn max_level(&self) -> u8 {
        (self.scales.len() - 1) as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scale_values() {
        let scales = LevelScales::new(4);
        assert_eq!(scales.scale(0), 1.0);
        assert_eq!(scales.scale(1), 0.5);
        assert_eq!(scales.scale(4), 0.0625);
        assert_eq!(scales.max_level(), 4);
    }

    #[test]
    fn test_scale_beyond_table() {
        let scales = LevelScales::new(2);
        assert_eq!(scales.scale(3), 0.125);
    }

    #[test]
    fn test_ratio() {
        let scales = LevelScales::new(10);
        assert_eq!(scales.ratio(2, 5), 8.0);
        assert_eq!(scales.ratio(5, 2), 0.125);
        assert_eq!(scales.ratio(7, 7), 1.0);
    }
}
