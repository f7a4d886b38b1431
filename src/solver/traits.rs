//! Solver adapter contract and solver options.

use sprs::CsMat;

use super::error::{SolverError, SolverResult};

/// Direction of optimisation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ObjectiveSense {
    #[default]
    Minimize,
    Maximize,
}

/// Outcome of a solve that ran to a conclusion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolveStatus {
    Optimal,
    PrimalInfeasible,
    DualInfeasible,
    Abandoned,
}

/// Borrowed LP in row-bound form:
/// `row_lower <= A x <= row_upper`, `col_lower <= x <= col_upper`.
#[derive(Debug, Clone, Copy)]
pub struct LpProblem<'a> {
    /// Constraint matrix in CSR storage.
    pub matrix: &'a CsMat<f64>,
    pub objective: &'a [f64],
    pub col_lower: &'a [f64],
    pub col_upper: &'a [f64],
    pub row_lower: &'a [f64],
    pub row_upper: &'a [f64],
}

impl LpProblem<'_> {
    pub fn num_columns(&self) -> usize {
        self.objective.len()
    }

    pub fn num_rows(&self) -> usize {
        self.row_lower.len()
    }

    /// Check that all arrays agree with the matrix shape.
    pub fn validate(&self) -> SolverResult<()> {
        let n = self.num_columns();
        let m = self.num_rows();
        if !self.matrix.is_csr() {
            return Err(SolverError::InvalidInput {
                context: "constraint matrix must be in CSR storage".to_string(),
            });
        }
        if self.matrix.rows() != m || self.matrix.cols() != n {
            return Err(SolverError::InvalidInput {
                context: format!(
                    "matrix is {}x{} but bounds describe {}x{}",
                    self.matrix.rows(),
                    self.matrix.cols(),
                    m,
                    n
                ),
            });
        }
        if self.col_lower.len() != n || self.col_upper.len() != n || self.row_upper.len() != m {
            return Err(SolverError::InvalidInput {
                context: "bound arrays have inconsistent lengths".to_string(),
            });
        }
        Ok(())
    }
}

/// Options for the simplex solver.
#[derive(Debug, Clone)]
pub struct LinProgOptions {
    /// Maximum number of pivots per phase.
    pub max_iter: usize,
    /// Pivot and optimality tolerance.
    pub tol: f64,
}

impl Default for LinProgOptions {
    fn default() -> Self {
        Self {
            max_iter: 50_000,
            tol: 1e-9,
        }
    }
}

/// Options for mixed-integer solves.
#[derive(Debug, Clone)]
pub struct MilpOptions {
    /// Maximum number of nodes to explore in branch-and-bound.
    pub max_nodes: usize,
    /// Tolerance for integer feasibility.
    pub int_tol: f64,
    /// Tolerance for optimality gap.
    pub gap_tol: f64,
    /// Base LP solver options.
    pub lp_options: LinProgOptions,
}

impl Default for MilpOptions {
    fn default() -> Self {
        Self {
            max_nodes: 10000,
            int_tol: 1e-6,
            gap_tol: 1e-9,
            lp_options: LinProgOptions::default(),
        }
    }
}

/// Boundary to an LP/MIP solver.
///
/// Calls are blocking and there is no partial-result contract: the solution
/// accessors are only meaningful after `solve` returned
/// [`SolveStatus::Optimal`].
pub trait SolverAdapter {
    /// Replace the loaded problem. Integrality marks are cleared.
    fn load(&mut self, problem: &LpProblem<'_>) -> SolverResult<()>;

    /// Mark `indices` as integer columns, replacing any previous marks. An
    /// empty slice relaxes the problem to an LP.
    fn set_integer(&mut self, indices: &[usize]) -> SolverResult<()>;

    fn set_objective_sense(&mut self, sense: ObjectiveSense);

    fn solve(&mut self) -> SolverResult<SolveStatus>;

    /// Objective value of the last optimal solve, in the problem's own sense.
    fn objective_value(&self) -> f64;

    fn column_solution(&self) -> &[f64];

    /// Number of columns currently marked integer.
    fn integer_count(&self) -> usize;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options() {
        let opts = LinProgOptions::default();
        assert_eq!(opts.max_iter, 50_000);
        assert!((opts.tol - 1e-9).abs() < 1e-12);
        let milp = MilpOptions::default();
        assert_eq!(milp.max_nodes, 10000);
    }

    #[test]
    fn test_validate_shape() {
        let matrix = CsMat::new((1, 2), vec![0, 2], vec![0, 1], vec![1.0, 1.0]);
        let lp = LpProblem {
            matrix: &matrix,
            objective: &[1.0, 1.0],
            col_lower: &[0.0, 0.0],
            col_upper: &[1.0, 1.0],
            row_lower: &[0.0],
            row_upper: &[1.0],
        };
        assert!(lp.validate().is_ok());
        let short = LpProblem {
            objective: &[1.0],
            ..lp
        };
        assert!(short.validate().is_err());
        let csc = CsMat::new_csc((1, 2), vec![0, 1, 2], vec![0, 0], vec![1.0, 1.0]);
        let wrong_storage = LpProblem {
            matrix: &csc,
            ..lp
        };
        assert!(wrong_storage.validate().is_err());
    }
}
