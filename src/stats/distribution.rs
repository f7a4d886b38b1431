//! Scalar queries shared by every distribution.
//!
//! Discretization needs the quantile function; expected-value problems need
//! the mean. Nothing here works on vectors of draws, sampling goes through
//! `rand_distr`.

use crate::stats::StatsResult;

/// Moments of a random coefficient.
pub trait Distribution {
    fn mean(&self) -> f64;

    fn var(&self) -> f64;

    fn median(&self) -> f64;
}

/// A distribution with a density over the reals.
pub trait ContinuousDistribution: Distribution {
    fn pdf(&self, x: f64) -> f64;

    /// `P(X <= x)`.
    fn cdf(&self, x: f64) -> f64;

    /// Inverse of [`cdf`](Self::cdf); `p` must lie in `[0, 1]`.
    fn ppf(&self, p: f64) -> StatsResult<f64>;
}

/// A distribution over the integers.
pub trait DiscreteDistribution: Distribution {
    /// `P(X = k)`.
    fn pmf(&self, k: i64) -> f64;

    /// `P(X <= k)`.
    fn cdf(&self, k: i64) -> f64;

    /// Smallest `k` with `cdf(k) >= p`.
    fn ppf(&self, p: f64) -> StatsResult<i64>;

    /// Inclusive support, `None` when it is unbounded above.
    fn support(&self) -> Option<(i64, i64)>;
}
