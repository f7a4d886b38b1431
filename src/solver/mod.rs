//! Solver boundary.
//!
//! The stochastic layer talks to LP/MIP solvers only through
//! [`SolverAdapter`]. [`SimplexSolver`] is the in-crate implementation: a
//! dense two-phase simplex with branch-and-bound on top.
//!
//! ```text
//! solver/
//! ├── mod.rs              # Exports only
//! ├── traits.rs           # Adapter contract and options
//! ├── impl_generic/       # Simplex and branch-and-bound
//! └── simplex_solver.rs   # SolverAdapter implementation
//! ```

mod error;
mod impl_generic;
mod simplex_solver;
mod traits;

pub use error::{SolverError, SolverResult};
pub use simplex_solver::SimplexSolver;
pub use traits::{
    LinProgOptions, LpProblem, MilpOptions, ObjectiveSense, SolveStatus, SolverAdapter,
};
