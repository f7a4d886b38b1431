//! Scenario trees and deterministic-equivalent assembly for multi-stage
//! stochastic linear and mixed-integer programs.
//!
//! A stochastic program is described by a deterministic [`CoreTemplate`]
//! whose columns and rows are grouped into stages, plus random data: either
//! explicit scenarios or random variables attached to template coefficients.
//! The random data becomes a [`ScenarioTree`], the tree becomes one large
//! deterministic equivalent, and a [`SolverAdapter`] solves it.
//!
//! ```
//! use stochr::solver::{ObjectiveSense, SimplexSolver};
//! use stochr::template::{CoefficientTarget, CoreTemplate, DeterministicModel};
//! use stochr::sampling::RandomVariable;
//! use stochr::{ModelOptions, ModelStatus, StochasticModel};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut m = DeterministicModel::new();
//! m.add_column(0.0, 1.0, 0.0, 0);
//! m.add_column(0.0, 10.0, 2.0, 1);
//! let core = CoreTemplate::from_deterministic(&m, 2)?;
//!
//! let options = ModelOptions {
//!     sense: ObjectiveSense::Maximize,
//!     ..ModelOptions::default()
//! };
//! let mut model = StochasticModel::with_solver(core, options, SimplexSolver::new());
//! model.add_random_variable(RandomVariable::scenario_based_with_probabilities(
//!     CoefficientTarget::Objective { col: 1 },
//!     1,
//!     vec![2.0, 6.0],
//!     vec![0.2, 0.8],
//! ))?;
//!
//! model.load_deterministic_equivalent()?;
//! assert_eq!(model.solve()?, ModelStatus::Optimal);
//! assert!((model.objective_value().unwrap_or(0.0) - 52.0).abs() < 1e-9);
//! # Ok(())
//! # }
//! ```
//!
//! # Modules
//!
//! - [`template`] - core template, stage overrides, combine rules
//! - [`sampling`] - random variables, discretization, scenario fans
//! - [`tree`] - arena scenario tree and index navigation
//! - [`assemble`] - deterministic equivalent and scenario submodels
//! - [`solver`] - solver adapter trait and the bundled simplex/branch-and-bound
//! - [`model`] - the stochastic model lifecycle and evaluation strategies
//! - [`producer`] - coefficient records from an algebraic modelling layer
//! - [`stats`] - parametric distributions

pub mod assemble;
pub mod error;
pub mod model;
pub mod producer;
pub mod sampling;
pub mod solver;
pub mod stats;
pub mod template;
pub mod tree;

pub use assemble::AssembledProblem;
pub use error::{IndexKind, StochError, StochResult};
pub use model::{
    ExpectedValue, IndependentDistribution, ModelOptions, ModelStatus, ScenarioEvaluation,
    StochasticModel,
};
pub use sampling::RandomVariable;
pub use solver::{SimplexSolver, SolverAdapter};
pub use template::{CombineRule, CoreTemplate, StageOverride};
pub use tree::{NodeId, ScenarioTree};
