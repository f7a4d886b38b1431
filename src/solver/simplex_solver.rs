//! In-crate solver adapter backed by the tableau simplex.

use log::debug;
use sprs::CsMat;

use super::error::{SolverError, SolverResult};
use super::impl_generic::{LpStatus, milp_impl, simplex_impl};
use super::traits::{LpProblem, MilpOptions, ObjectiveSense, SolveStatus, SolverAdapter};

#[derive(Debug, Clone)]
struct LoadedProblem {
    matrix: CsMat<f64>,
    objective: Vec<f64>,
    col_lower: Vec<f64>,
    col_upper: Vec<f64>,
    row_lower: Vec<f64>,
    row_upper: Vec<f64>,
}

/// Dense two-phase simplex with branch-and-bound for integer columns.
///
/// Suited to the small and medium deterministic equivalents built in tests
/// and examples; large instances should go through an external solver
/// implementing [`SolverAdapter`].
#[derive(Debug, Clone)]
pub struct SimplexSolver {
    options: MilpOptions,
    problem: Option<LoadedProblem>,
    integers: Vec<usize>,
    sense: ObjectiveSense,
    objective_value: f64,
    solution: Vec<f64>,
}

impl Default for SimplexSolver {
    fn default() -> Self {
        Self::with_options(MilpOptions::default())
    }
}

impl SimplexSolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: MilpOptions) -> Self {
        Self {
            options,
            problem: None,
            integers: Vec::new(),
            sense: ObjectiveSense::Minimize,
            objective_value: f64::NAN,
            solution: Vec::new(),
        }
    }

    pub fn options(&self) -> &MilpOptions {
        &self.options
    }

    pub fn sense(&self) -> ObjectiveSense {
        self.sense
    }

    fn clear_solution(&mut self) {
        self.objective_value = f64::NAN;
        self.solution.clear();
    }
}

impl SolverAdapter for SimplexSolver {
    fn load(&mut self, problem: &LpProblem<'_>) -> SolverResult<()> {
        problem.validate()?;
        self.problem = Some(LoadedProblem {
            matrix: problem.matrix.clone(),
            objective: problem.objective.to_vec(),
            col_lower: problem.col_lower.to_vec(),
            col_upper: problem.col_upper.to_vec(),
            row_lower: problem.row_lower.to_vec(),
            row_upper: problem.row_upper.to_vec(),
        });
        self.integers.clear();
        self.clear_solution();
        Ok(())
    }

    fn set_integer(&mut self, indices: &[usize]) -> SolverResult<()> {
        let problem = self.problem.as_ref().ok_or(SolverError::NotLoaded)?;
        let n = problem.objective.len();
        if let Some(&bad) = indices.iter().find(|&&j| j >= n) {
            return Err(SolverError::InvalidInput {
                context: format!("integer column {} out of {} columns", bad, n),
            });
        }
        let mut marks = indices.to_vec();
        marks.sort_unstable();
        marks.dedup();
        self.integers = marks;
        Ok(())
    }

    fn set_objective_sense(&mut self, sense: ObjectiveSense) {
        self.sense = sense;
    }

    fn solve(&mut self) -> SolverResult<SolveStatus> {
        self.clear_solution();
        let problem = self.problem.as_ref().ok_or(SolverError::NotLoaded)?;

        let sign = match self.sense {
            ObjectiveSense::Minimize => 1.0,
            ObjectiveSense::Maximize => -1.0,
        };
        let objective: Vec<f64> = problem.objective.iter().map(|c| sign * c).collect();
        let lp = LpProblem {
            matrix: &problem.matrix,
            objective: &objective,
            col_lower: &problem.col_lower,
            col_upper: &problem.col_upper,
            row_lower: &problem.row_lower,
            row_upper: &problem.row_upper,
        };

        let (status, x, fun) = if self.integers.is_empty() {
            let outcome = simplex_impl(&lp, &self.options.lp_options)?;
            debug!("simplex finished in {} pivots: {:?}", outcome.nit, outcome.status);
            (outcome.status, outcome.x, outcome.fun)
        } else {
            let outcome = milp_impl(&lp, &self.integers, &self.options)?;
            debug!(
                "branch-and-bound finished after {} nodes: {:?}",
                outcome.nodes, outcome.status
            );
            (outcome.status, outcome.x, outcome.fun)
        };

        Ok(match status {
            LpStatus::Optimal => {
                self.objective_value = sign * fun;
                self.solution = x;
                SolveStatus::Optimal
            }
            LpStatus::Infeasible => SolveStatus::PrimalInfeasible,
            LpStatus::Unbounded => SolveStatus::DualInfeasible,
        })
    }

    fn objective_value(&self) -> f64 {
        self.objective_value
    }

    fn column_solution(&self) -> &[f64] {
        &self.solution
    }

    fn integer_count(&self) -> usize {
        self.integers.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sprs::TriMat;

    fn problem() -> CsMat<f64> {
        // x + y <= 3.5
        let mut tri = TriMat::new((1, 2));
        tri.add_triplet(0, 0, 1.0);
        tri.add_triplet(0, 1, 1.0);
        tri.to_csr()
    }

    #[test]
    fn test_maximize_with_integers() {
        let a = problem();
        let lp = LpProblem {
            matrix: &a,
            objective: &[1.0, 2.0],
            col_lower: &[0.0, 0.0],
            col_upper: &[10.0, 10.0],
            row_lower: &[f64::NEG_INFINITY],
            row_upper: &[3.5],
        };
        let mut solver = SimplexSolver::new();
        solver.load(&lp).unwrap();
        solver.set_objective_sense(ObjectiveSense::Maximize);

        assert_eq!(solver.solve().unwrap(), SolveStatus::Optimal);
        assert!((solver.objective_value() - 7.0).abs() < 1e-9);

        solver.set_integer(&[1, 1]).unwrap();
        assert_eq!(solver.integer_count(), 1);
        assert_eq!(solver.solve().unwrap(), SolveStatus::Optimal);
        // y = 3, x = 0.5
        assert!((solver.objective_value() - 6.5).abs() < 1e-9);
        assert!((solver.column_solution()[1] - 3.0).abs() < 1e-12);

        solver.set_integer(&[]).unwrap();
        assert_eq!(solver.integer_count(), 0);
        assert!(solver.set_integer(&[2]).is_err());
    }

    #[test]
    fn test_statuses() {
        let a = problem();
        let lp = LpProblem {
            matrix: &a,
            objective: &[1.0, 1.0],
            col_lower: &[0.0, 0.0],
            col_upper: &[f64::INFINITY, f64::INFINITY],
            row_lower: &[5.0],
            row_upper: &[f64::INFINITY],
        };
        let mut solver = SimplexSolver::new();
        assert_eq!(solver.solve(), Err(SolverError::NotLoaded));

        solver.load(&lp).unwrap();
        solver.set_objective_sense(ObjectiveSense::Maximize);
        assert_eq!(solver.solve().unwrap(), SolveStatus::DualInfeasible);
        assert!(solver.objective_value().is_nan());

        let bounded = LpProblem {
            col_upper: &[1.0, 1.0],
            ..lp
        };
        solver.load(&bounded).unwrap();
        assert_eq!(solver.solve().unwrap(), SolveStatus::PrimalInfeasible);
        assert!(solver.column_solution().is_empty());
    }
}
