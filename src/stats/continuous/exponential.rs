//! Exponential distribution.

use crate::stats::distribution::{ContinuousDistribution, Distribution};
use crate::stats::error::{StatsError, StatsResult};

/// Exponential distribution with rate λ.
///
/// f(x) = λ exp(-λx)  for x ≥ 0
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Exponential {
    rate: f64,
}

impl Exponential {
    /// Create an exponential distribution with rate `rate` (mean 1/rate).
    ///
    /// # Errors
    ///
    /// Returns an error if `rate` is not positive and finite.
    pub fn new(rate: f64) -> StatsResult<Self> {
        if !(rate > 0.0 && rate.is_finite()) {
            return Err(StatsError::InvalidParameter {
                name: "rate".to_string(),
                value: rate,
                reason: "rate must be positive and finite".to_string(),
            });
        }
        Ok(Self { rate })
    }

    /// Get the rate λ.
    pub fn rate(&self) -> f64 {
        self.rate
    }
}

impl Distribution for Exponential {
    fn mean(&self) -> f64 {
        1.0 / self.rate
    }

    fn var(&self) -> f64 {
        1.0 / (self.rate * self.rate)
    }

    fn median(&self) -> f64 {
        std::f64::consts::LN_2 / self.rate
    }
}

impl ContinuousDistribution for Exponential {
    fn pdf(&self, x: f64) -> f64 {
        if x < 0.0 {
            0.0
        } else {
            self.rate * (-self.rate * x).exp()
        }
    }

    fn cdf(&self, x: f64) -> f64 {
        if x < 0.0 {
            0.0
        } else {
            -(-self.rate * x).exp_m1()
        }
    }

    fn ppf(&self, p: f64) -> StatsResult<f64> {
        if !(0.0..=1.0).contains(&p) {
            return Err(StatsError::InvalidProbability { value: p });
        }
        Ok(-(-p).ln_1p() / self.rate)
    }
}
