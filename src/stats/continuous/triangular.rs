//! Triangular distribution.

use crate::stats::distribution::{ContinuousDistribution, Distribution};
use crate::stats::error::{StatsError, StatsResult};

/// Triangular distribution on [min, max] with peak at `mode`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Triangular {
    min: f64,
    mode: f64,
    max: f64,
}

impl Triangular {
    /// Create a triangular distribution on `[min, max]` peaking at `mode`.
    ///
    /// # Errors
    ///
    /// Returns an error if a parameter is not finite, if `min >= max`, or if
    /// `mode` lies outside `[min, max]`.
    pub fn new(min: f64, mode: f64, max: f64) -> StatsResult<Self> {
        if !(min.is_finite() && mode.is_finite() && max.is_finite()) {
            return Err(StatsError::InvalidParameter {
                name: "min, mode, max".to_string(),
                value: f64::NAN,
                reason: "all parameters must be finite".to_string(),
            });
        }
        if min >= max {
            return Err(StatsError::InvalidParameter {
                name: "min".to_string(),
                value: min,
                reason: format!("min must be less than max ({})", max),
            });
        }
        if mode < min || mode > max {
            return Err(StatsError::InvalidParameter {
                name: "mode".to_string(),
                value: mode,
                reason: format!("mode must lie in [{}, {}]", min, max),
            });
        }
        Ok(Self { min, mode, max })
    }

    /// Get the lower end.
    pub fn min(&self) -> f64 {
        self.min
    }

    /// Get the peak.
    pub fn mode(&self) -> f64 {
        self.mode
    }

    /// Get the upper end.
    pub fn max(&self) -> f64 {
        self.max
    }

    /// CDF value at the mode.
    fn split(&self) -> f64 {
        (self.mode - self.min) / (self.max - self.min)
    }
}

impl Distribution for Triangular {
    fn mean(&self) -> f64 {
        (self.min + self.mode + self.max) / 3.0
    }

    fn var(&self) -> f64 {
        let (a, c, b) = (self.min, self.mode, self.max);
        (a * a + b * b + c * c - a * b - a * c - b * c) / 18.0
    }

    fn median(&self) -> f64 {
        // ppf(0.5) is always valid for a constructed distribution
        self.ppf(0.5).unwrap_or(self.mode)
    }
}

impl ContinuousDistribution for Triangular {
    fn pdf(&self, x: f64) -> f64 {
        let (a, c, b) = (self.min, self.mode, self.max);
        if x < a || x > b {
            0.0
        } else if x < c {
            2.0 * (x - a) / ((b - a) * (c - a))
        } else if x > c {
            2.0 * (b - x) / ((b - a) * (b - c))
        } else {
            2.0 / (b - a)
        }
    }

    fn cdf(&self, x: f64) -> f64 {
        let (a, c, b) = (self.min, self.mode, self.max);
        if x <= a {
            0.0
        } else if x >= b {
            1.0
        } else if x <= c {
            (x - a) * (x - a) / ((b - a) * (c - a))
        } else {
            1.0 - (b - x) * (b - x) / ((b - a) * (b - c))
        }
    }

    fn ppf(&self, p: f64) -> StatsResult<f64> {
        if !(0.0..=1.0).contains(&p) {
            return Err(StatsError::InvalidProbability { value: p });
        }
        let (a, c, b) = (self.min, self.mode, self.max);
        if p <= self.split() {
            Ok(a + (p * (b - a) * (c - a)).sqrt())
        } else {
            Ok(b - ((1.0 - p) * (b - a) * (b - c)).sqrt())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_triangular_symmetric() {
        let t = Triangular::new(0.0, 1.0, 2.0).unwrap();
        assert!((t.mean() - 1.0).abs() < 1e-12);
        assert!((t.median() - 1.0).abs() < 1e-12);
        assert!((t.cdf(1.0) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_triangular_ppf_roundtrip() {
        let t = Triangular::new(1.0, 2.0, 6.0).unwrap();
        for p in [0.0, 0.1, 0.2, 0.5, 0.9, 1.0] {
            let x = t.ppf(p).unwrap();
            assert!((t.cdf(x) - p).abs() < 1e-12);
        }
    }

    #[test]
    fn test_triangular_invalid() {
        assert!(Triangular::new(2.0, 1.0, 3.0).is_err());
        assert!(Triangular::new(1.0, 1.0, 1.0).is_err());
    }
}
