//! Uniform distribution on a closed interval.

use crate::stats::distribution::{ContinuousDistribution, Distribution};
use crate::stats::error::{StatsError, StatsResult};

/// Every value in `[lower, upper]` equally likely.
///
/// ```
/// use stochr::stats::{ContinuousDistribution, Distribution, Uniform};
///
/// let demand = Uniform::new(20.0, 80.0).unwrap();
/// assert!((demand.mean() - 50.0).abs() < 1e-12);
/// assert!((demand.ppf(0.25).unwrap() - 35.0).abs() < 1e-12);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Uniform {
    lower: f64,
    upper: f64,
}

impl Uniform {
    /// Create a uniform distribution on `[lower, upper]`.
    ///
    /// # Errors
    ///
    /// Returns an error if an end is not finite or if `upper <= lower`.
    pub fn new(lower: f64, upper: f64) -> StatsResult<Self> {
        for (name, value) in [("lower", lower), ("upper", upper)] {
            if !value.is_finite() {
                return Err(StatsError::InvalidParameter {
                    name: name.to_string(),
                    value,
                    reason: "interval end must be finite".to_string(),
                });
            }
        }
        if upper <= lower {
            return Err(StatsError::InvalidParameter {
                name: "upper".to_string(),
                value: upper,
                reason: format!("must exceed lower end {}", lower),
            });
        }
        Ok(Self { lower, upper })
    }

    /// Get the lower end.
    pub fn lower(&self) -> f64 {
        self.lower
    }

    /// Get the upper end.
    pub fn upper(&self) -> f64 {
        self.upper
    }

    fn width(&self) -> f64 {
        self.upper - self.lower
    }
}

impl Distribution for Uniform {
    fn mean(&self) -> f64 {
        0.5 * (self.lower + self.upper)
    }

    fn var(&self) -> f64 {
        self.width().powi(2) / 12.0
    }

    fn median(&self) -> f64 {
        self.mean()
    }
}

impl ContinuousDistribution for Uniform {
    fn pdf(&self, x: f64) -> f64 {
        if (self.lower..=self.upper).contains(&x) {
            self.width().recip()
        } else {
            0.0
        }
    }

    fn cdf(&self, x: f64) -> f64 {
        ((x - self.lower) / self.width()).clamp(0.0, 1.0)
    }

    fn ppf(&self, p: f64) -> StatsResult<f64> {
        if !(0.0..=1.0).contains(&p) {
            return Err(StatsError::InvalidProbability { value: p });
        }
        Ok(self.lower + p * self.width())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniform_rejects_bad_interval() {
        assert!(Uniform::new(1.0, 0.0).is_err());
        assert!(Uniform::new(1.0, 1.0).is_err());
        assert!(Uniform::new(f64::NEG_INFINITY, 1.0).is_err());
    }

    #[test]
    fn test_uniform_quantiles() {
        let u = Uniform::new(2.0, 5.0).unwrap();
        assert!((u.ppf(0.0).unwrap() - 2.0).abs() < 1e-12);
        assert!((u.ppf(1.0).unwrap() - 5.0).abs() < 1e-12);
        assert!(u.ppf(-0.1).is_err());
        for p in [0.1, 0.5, 0.9] {
            assert!((u.cdf(u.ppf(p).unwrap()) - p).abs() < 1e-12);
        }
        assert_eq!(u.cdf(1.0), 0.0);
        assert_eq!(u.cdf(6.0), 1.0);
    }

    #[test]
    fn test_uniform_moments() {
        let u = Uniform::new(2.0, 8.0).unwrap();
        assert!((u.mean() - 5.0).abs() < 1e-12);
        assert!((u.var() - 3.0).abs() < 1e-12);
        assert!((u.pdf(3.0) - 1.0 / 6.0).abs() < 1e-12);
        assert_eq!(u.pdf(9.0), 0.0);
    }
}
