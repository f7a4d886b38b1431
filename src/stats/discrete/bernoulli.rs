//! Bernoulli distribution.

use crate::stats::error::{StatsError, StatsResult};
use crate::stats::{DiscreteDistribution, Distribution};

/// Bernoulli distribution: X = 1 with probability p, X = 0 otherwise.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bernoulli {
    p: f64,
}

impl Bernoulli {
    /// Create a Bernoulli distribution with success probability `p`.
    ///
    /// # Errors
    ///
    /// Returns an error if `p` is outside `[0, 1]`.
    pub fn new(p: f64) -> StatsResult<Self> {
        if !(0.0..=1.0).contains(&p) {
            return Err(StatsError::InvalidParameter {
                name: "p".to_string(),
                value: p,
                reason: "success probability must be in [0, 1]".to_string(),
            });
        }
        Ok(Self { p })
    }

    /// Success probability.
    pub fn p(&self) -> f64 {
        self.p
    }
}

impl Distribution for Bernoulli {
    fn mean(&self) -> f64 {
        self.p
    }

    fn var(&self) -> f64 {
        self.p * (1.0 - self.p)
    }

    fn median(&self) -> f64 {
        if self.p > 0.5 {
            1.0
        } else if self.p < 0.5 {
            0.0
        } else {
            0.5
        }
    }
}

impl DiscreteDistribution for Bernoulli {
    fn pmf(&self, k: i64) -> f64 {
        match k {
            0 => 1.0 - self.p,
            1 => self.p,
            _ => 0.0,
        }
    }

    fn cdf(&self, k: i64) -> f64 {
        if k < 0 {
            0.0
        } else if k == 0 {
            1.0 - self.p
        } else {
            1.0
        }
    }

    fn ppf(&self, p: f64) -> StatsResult<i64> {
        if !(0.0..=1.0).contains(&p) {
            return Err(StatsError::InvalidProbability { value: p });
        }
        if p <= 1.0 - self.p { Ok(0) } else { Ok(1) }
    }

    fn support(&self) -> Option<(i64, i64)> {
        Some((0, 1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bernoulli() {
        let b = Bernoulli::new(0.3).unwrap();
        assert!((b.pmf(1) - 0.3).abs() < 1e-12);
        assert!((b.pmf(0) - 0.7).abs() < 1e-12);
        assert_eq!(b.ppf(0.5).unwrap(), 0);
        assert_eq!(b.ppf(0.8).unwrap(), 1);
        assert!((b.var() - 0.21).abs() < 1e-12);
        assert!(Bernoulli::new(1.5).is_err());
    }
}
