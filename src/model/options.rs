//! Model configuration.

use crate::solver::ObjectiveSense;
use crate::template::CombineRule;

/// Options for a [`StochasticModel`](super::StochasticModel).
#[derive(Debug, Clone)]
pub struct ModelOptions {
    /// Objective direction.
    pub sense: ObjectiveSense,
    /// Rule used to merge every node's override into the template.
    pub combine_rule: CombineRule,
    /// Seed of the model's generator; `None` seeds from the operating system.
    pub seed: Option<u64>,
    /// Tolerance of every probability-sum check.
    pub probability_tol: f64,
    /// Number of points requested from a discretization.
    pub samples_per_variable: usize,
    /// Pair the k-th outcome of every variable instead of forming the full
    /// cross product.
    pub sample_only: bool,
}

impl Default for ModelOptions {
    fn default() -> Self {
        Self {
            sense: ObjectiveSense::Minimize,
            combine_rule: CombineRule::Replace,
            seed: None,
            probability_tol: 1e-4,
            samples_per_variable: 3,
            sample_only: false,
        }
    }
}
