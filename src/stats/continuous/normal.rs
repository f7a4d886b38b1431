//! Normal (Gaussian) distribution.

use std::f64::consts::{PI, SQRT_2};

use crate::stats::distribution::{ContinuousDistribution, Distribution};
use crate::stats::error::{StatsError, StatsResult};
use crate::stats::special;

/// Normal distribution N(μ, σ²).
///
/// f(x) = exp(-(x - μ)² / (2σ²)) / (σ √(2π))
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Normal {
    mean: f64,
    std: f64,
}

impl Normal {
    /// Create a new normal distribution with mean `mean` and standard deviation `std`.
    ///
    /// # Errors
    ///
    /// Returns an error if `mean` is not finite or `std` is not positive and
    /// finite.
    pub fn new(mean: f64, std: f64) -> StatsResult<Self> {
        if !mean.is_finite() {
            return Err(StatsError::InvalidParameter {
                name: "mean".to_string(),
                value: mean,
                reason: "must be finite".to_string(),
            });
        }
        if !(std > 0.0 && std.is_finite()) {
            return Err(StatsError::InvalidParameter {
                name: "std".to_string(),
                value: std,
                reason: "standard deviation must be positive and finite".to_string(),
            });
        }
        Ok(Self { mean, std })
    }

    /// Create a standard normal distribution N(0, 1).
    pub fn standard() -> Self {
        Self {
            mean: 0.0,
            std: 1.0,
        }
    }

    /// Location parameter μ.
    pub fn loc(&self) -> f64 {
        self.mean
    }

    /// Scale parameter σ.
    pub fn scale(&self) -> f64 {
        self.std
    }
}

impl Distribution for Normal {
    fn mean(&self) -> f64 {
        self.mean
    }

    fn var(&self) -> f64 {
        self.std * self.std
    }

    fn median(&self) -> f64 {
        self.mean
    }
}

impl ContinuousDistribution for Normal {
    fn pdf(&self, x: f64) -> f64 {
        let z = (x - self.mean) / self.std;
        (-0.5 * z * z).exp() / (self.std * (2.0 * PI).sqrt())
    }

    fn cdf(&self, x: f64) -> f64 {
        0.5 * special::erfc(-(x - self.mean) / (self.std * SQRT_2))
    }

    fn ppf(&self, p: f64) -> StatsResult<f64> {
        if !(0.0..=1.0).contains(&p) {
            return Err(StatsError::InvalidProbability { value: p });
        }
        Ok(self.mean + self.std * special::ndtri(p))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normal_creation() {
        assert!(Normal::new(0.0, 1.0).is_ok());
        assert!(Normal::new(0.0, 0.0).is_err());
        assert!(Normal::new(0.0, -1.0).is_err());
        assert!(Normal::new(f64::NAN, 1.0).is_err());
    }

    #[test]
    fn test_normal_cdf_ppf() {
        let n = Normal::new(10.0, 2.0).unwrap();
        assert!((n.cdf(10.0) - 0.5).abs() < 1e-12);
        // 95th percentile of N(10, 4) is 10 + 2 * 1.6448536
        assert!((n.ppf(0.95).unwrap() - (10.0 + 2.0 * 1.644_853_626_951_472)).abs() < 1e-8);
        for p in [0.05, 0.2, 0.5, 0.8, 0.95] {
            let x = n.ppf(p).unwrap();
            assert!((n.cdf(x) - p).abs() < 1e-10);
        }
    }

    #[test]
    fn test_normal_pdf_peak() {
        let n = Normal::standard();
        assert!((n.pdf(0.0) - 1.0 / (2.0 * PI).sqrt()).abs() < 1e-12);
    }
}
