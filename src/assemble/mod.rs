//! Deterministic-equivalent and single-scenario assembly.

mod deq;
mod problem;
mod submodel;

pub use deq::assemble_deterministic_equivalent;
pub use problem::AssembledProblem;
pub use submodel::{FixedColumns, ScenarioSubmodel, assemble_core, assemble_scenario};
