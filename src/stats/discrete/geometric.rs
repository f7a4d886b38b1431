//! Geometric distribution.

use crate::stats::error::{StatsError, StatsResult};
use crate::stats::{DiscreteDistribution, Distribution};

/// Geometric distribution: number of Bernoulli(p) trials up to and including
/// the first success.
///
/// P(X = k) = (1 - p)^(k-1) p  for k = 1, 2, ...
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Geometric {
    p: f64,
}

impl Geometric {
    /// Create a geometric distribution with success probability `p`.
    ///
    /// # Errors
    ///
    /// Returns an error if `p` is outside `(0, 1]`.
    pub fn new(p: f64) -> StatsResult<Self> {
        if !(p > 0.0 && p <= 1.0) {
            return Err(StatsError::InvalidParameter {
                name: "p".to_string(),
                value: p,
                reason: "success probability must be in (0, 1]".to_string(),
            });
        }
        Ok(Self { p })
    }

    /// Success probability.
    pub fn p(&self) -> f64 {
        self.p
    }
}

impl Distribution for Geometric {
    fn mean(&self) -> f64 {
        1.0 / self.p
    }

    fn var(&self) -> f64 {
        (1.0 - self.p) / (self.p * self.p)
    }

    fn median(&self) -> f64 {
        self.ppf(0.5).map(|k| k as f64).unwrap_or(1.0)
    }
}

impl DiscreteDistribution for Geometric {
    fn pmf(&self, k: i64) -> f64 {
        if k < 1 {
            return 0.0;
        }
        (1.0 - self.p).powf((k - 1) as f64) * self.p
    }

    fn cdf(&self, k: i64) -> f64 {
        if k < 1 {
            return 0.0;
        }
        1.0 - (1.0 - self.p).powf(k as f64)
    }

    fn ppf(&self, p: f64) -> StatsResult<i64> {
        if !(0.0..=1.0).contains(&p) {
            return Err(StatsError::InvalidProbability { value: p });
        }
        if p == 0.0 || self.p == 1.0 {
            return Ok(1);
        }
        if p == 1.0 {
            return Ok(i64::MAX);
        }
        // smallest k with 1 - (1-p)^k >= q  =>  k >= ln(1-q) / ln(1-p)
        let k = ((-p).ln_1p() / (-self.p).ln_1p()).ceil() as i64;
        let mut k = k.max(1);
        // guard against rounding at exact CDF steps
        while k > 1 && self.cdf(k - 1) >= p {
            k -= 1;
        }
        while self.cdf(k) < p {
            k += 1;
        }
        Ok(k)
    }

    fn support(&self) -> Option<(i64, i64)> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_geometric() {
        let g = Geometric::new(0.5).unwrap();
        assert!((g.pmf(1) - 0.5).abs() < 1e-12);
        assert!((g.pmf(3) - 0.125).abs() < 1e-12);
        assert!((g.cdf(2) - 0.75).abs() < 1e-12);
        assert!((g.mean() - 2.0).abs() < 1e-12);
        assert_eq!(g.ppf(0.5).unwrap(), 1);
        assert_eq!(g.ppf(0.6).unwrap(), 2);
        assert_eq!(g.ppf(0.75).unwrap(), 2);
        assert_eq!(g.support(), None);
        assert!(Geometric::new(0.0).is_err());
    }

    #[test]
    fn test_geometric_beyond_i32() {
        let g = Geometric::new(1e-10).unwrap();
        let k = 3_000_000_000;
        assert!((g.cdf(k) - (1.0 - (-0.3f64).exp())).abs() < 1e-6);
        assert!(g.pmf(k) > 0.0 && g.pmf(k) < 1e-10);
        assert!(g.cdf(k) < g.cdf(2 * k));
    }
}
