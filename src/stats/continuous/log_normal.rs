//! Log-normal distribution.

use std::f64::consts::{PI, SQRT_2};

use crate::stats::distribution::{ContinuousDistribution, Distribution};
use crate::stats::error::{StatsError, StatsResult};
use crate::stats::special;

/// Log-normal distribution: ln(X) ~ N(μ, σ²).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LogNormal {
    mu: f64,
    sigma: f64,
}

impl LogNormal {
    /// Create a log-normal distribution from the parameters of ln(X).
    ///
    /// # Errors
    ///
    /// Returns an error if `mu` is not finite or `sigma` is not positive and
    /// finite.
    pub fn new(mu: f64, sigma: f64) -> StatsResult<Self> {
        if !mu.is_finite() {
            return Err(StatsError::InvalidParameter {
                name: "mu".to_string(),
                value: mu,
                reason: "must be finite".to_string(),
            });
        }
        if !(sigma > 0.0 && sigma.is_finite()) {
            return Err(StatsError::InvalidParameter {
                name: "sigma".to_string(),
                value: sigma,
                reason: "must be positive and finite".to_string(),
            });
        }
        Ok(Self { mu, sigma })
    }

    /// Mean of ln(X).
    pub fn mu(&self) -> f64 {
        self.mu
    }

    /// Standard deviation of ln(X).
    pub fn sigma(&self) -> f64 {
        self.sigma
    }
}

impl Distribution for LogNormal {
    fn mean(&self) -> f64 {
        (self.mu + self.sigma * self.sigma / 2.0).exp()
    }

    fn var(&self) -> f64 {
        let s2 = self.sigma * self.sigma;
        (s2.exp() - 1.0) * (2.0 * self.mu + s2).exp()
    }

    fn median(&self) -> f64 {
        self.mu.exp()
    }
}

impl ContinuousDistribution for LogNormal {
    fn pdf(&self, x: f64) -> f64 {
        if x <= 0.0 {
            return 0.0;
        }
        let z = (x.ln() - self.mu) / self.sigma;
        (-0.5 * z * z).exp() / (x * self.sigma * (2.0 * PI).sqrt())
    }

    fn cdf(&self, x: f64) -> f64 {
        if x <= 0.0 {
            return 0.0;
        }
        0.5 * special::erfc(-(x.ln() - self.mu) / (self.sigma * SQRT_2))
    }

    fn ppf(&self, p: f64) -> StatsResult<f64> {
        if !(0.0..=1.0).contains(&p) {
            return Err(StatsError::InvalidProbability { value: p });
        }
        Ok((self.mu + self.sigma * special::ndtri(p)).exp())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lognormal_moments() {
        let d = LogNormal::new(0.0, 1.0).unwrap();
        assert!((d.median() - 1.0).abs() < 1e-12);
        assert!((d.mean() - 0.5_f64.exp()).abs() < 1e-12);
    }

    #[test]
    fn test_lognormal_ppf_roundtrip() {
        let d = LogNormal::new(1.0, 0.5).unwrap();
        for p in [0.05, 0.5, 0.95] {
            let x = d.ppf(p).unwrap();
            assert!(x > 0.0);
            assert!((d.cdf(x) - p).abs() < 1e-10);
        }
        assert_eq!(d.ppf(0.0).unwrap(), 0.0);
    }
}
