//! Uniform distribution over a range of integers.

use crate::stats::error::{StatsError, StatsResult};
use crate::stats::{DiscreteDistribution, Distribution};

/// Each integer in `low..=high` with probability `1 / count`.
///
/// ```
/// use stochr::stats::{DiscreteDistribution, DiscreteUniform, Distribution};
///
/// let lead_time = DiscreteUniform::new(1, 4).unwrap();
/// assert!((lead_time.pmf(2) - 0.25).abs() < 1e-12);
/// assert!((lead_time.mean() - 2.5).abs() < 1e-12);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiscreteUniform {
    low: i64,
    high: i64,
}

impl DiscreteUniform {
    /// Create a uniform distribution over `low..=high`.
    ///
    /// # Errors
    ///
    /// Returns an error if `high < low`, or if the range holds more integers
    /// than a `u64` can count (only the full `i64` range).
    pub fn new(low: i64, high: i64) -> StatsResult<Self> {
        if high < low {
            return Err(StatsError::InvalidParameter {
                name: "high".to_string(),
                value: high as f64,
                reason: format!("range is empty below low = {}", low),
            });
        }
        if high.abs_diff(low).checked_add(1).is_none() {
            return Err(StatsError::InvalidParameter {
                name: "low, high".to_string(),
                value: low as f64,
                reason: "range covers every i64".to_string(),
            });
        }
        Ok(Self { low, high })
    }

    /// Get the smallest value.
    pub fn low(&self) -> i64 {
        self.low
    }

    /// Get the largest value.
    pub fn high(&self) -> i64 {
        self.high
    }

    /// Number of integers in the support.
    pub fn count(&self) -> u64 {
        self.high.abs_diff(self.low).saturating_add(1)
    }
}

impl Distribution for DiscreteUniform {
    fn mean(&self) -> f64 {
        0.5 * (self.low as f64 + self.high as f64)
    }

    fn var(&self) -> f64 {
        let n = self.count() as f64;
        (n * n - 1.0) / 12.0
    }

    fn median(&self) -> f64 {
        self.mean()
    }
}

impl DiscreteDistribution for DiscreteUniform {
    fn pmf(&self, k: i64) -> f64 {
        if (self.low..=self.high).contains(&k) {
            1.0 / self.count() as f64
        } else {
            0.0
        }
    }

    fn cdf(&self, k: i64) -> f64 {
        match k {
            k if k < self.low => 0.0,
            k if k >= self.high => 1.0,
            k => (k.abs_diff(self.low) as f64 + 1.0) / self.count() as f64,
        }
    }

    fn ppf(&self, p: f64) -> StatsResult<i64> {
        if !(0.0..=1.0).contains(&p) {
            return Err(StatsError::InvalidProbability { value: p });
        }
        // float-to-int casts saturate
        let steps = (p * self.count() as f64).ceil() as u64;
        let offset = steps.saturating_sub(1).min(self.count() - 1);
        Ok(self.low.checked_add_unsigned(offset).unwrap_or(self.high))
    }

    fn support(&self) -> Option<(i64, i64)> {
        Some((self.low, self.high))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_discrete_uniform_mass() {
        let d = DiscreteUniform::new(-1, 2).unwrap();
        assert_eq!(d.count(), 4);
        let total: f64 = (-1..=2).map(|k| d.pmf(k)).sum();
        assert!((total - 1.0).abs() < 1e-12);
        assert_eq!(d.pmf(3), 0.0);
        assert!((d.cdf(0) - 0.5).abs() < 1e-12);
        assert_eq!(d.cdf(-2), 0.0);
    }

    #[test]
    fn test_discrete_uniform_quantiles() {
        let d = DiscreteUniform::new(1, 6).unwrap();
        assert_eq!(d.ppf(0.0).unwrap(), 1);
        assert_eq!(d.ppf(0.5).unwrap(), 3);
        assert_eq!(d.ppf(0.51).unwrap(), 4);
        assert_eq!(d.ppf(1.0).unwrap(), 6);
        assert!(d.ppf(2.0).is_err());
    }

    #[test]
    fn test_discrete_uniform_degenerate() {
        let d = DiscreteUniform::new(5, 5).unwrap();
        assert_eq!(d.pmf(5), 1.0);
        assert_eq!(d.var(), 0.0);
        assert!(DiscreteUniform::new(5, 4).is_err());
    }

    #[test]
    fn test_discrete_uniform_extreme_range() {
        assert!(DiscreteUniform::new(i64::MIN, i64::MAX).is_err());

        let d = DiscreteUniform::new(i64::MIN, i64::MAX - 1).unwrap();
        assert_eq!(d.count(), u64::MAX);
        assert_eq!(d.ppf(0.0).unwrap(), i64::MIN);
        assert_eq!(d.ppf(1.0).unwrap(), i64::MAX - 1);
        assert!((d.cdf(0) - 0.5).abs() < 1e-12);
        assert_eq!(d.cdf(i64::MAX), 1.0);

        let wide = DiscreteUniform::new(-3_000_000_000, 3_000_000_000).unwrap();
        assert_eq!(wide.ppf(0.5).unwrap(), 0);
    }
}
