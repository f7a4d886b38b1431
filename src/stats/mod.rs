//! Probability distributions used to describe random model coefficients.
//!
//! Every distribution exposes scalar moments and a quantile function, which is
//! all the discretization strategies in [`crate::sampling`] need.
//!
//! ```
//! use stochr::stats::{ContinuousDistribution, Distribution, Normal};
//!
//! let n = Normal::new(100.0, 15.0).unwrap();
//! let q95 = n.ppf(0.95).unwrap();
//! assert!(q95 > n.mean());
//! ```

// Core modules
mod continuous;
mod discrete;
mod distribution;
mod error;
pub mod special;

// Public API: Distribution traits and types
pub use distribution::{ContinuousDistribution, DiscreteDistribution, Distribution};
pub use error::{StatsError, StatsResult};

// Public API: Continuous distributions
pub use continuous::{Exponential, LogNormal, Normal, Triangular, Uniform};

// Public API: Discrete distributions
pub use discrete::{Bernoulli, DiscreteUniform, Geometric};
