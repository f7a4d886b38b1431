//! Mixed-integer linear programming via branch-and-bound.

use log::{debug, trace};

use super::simplex::{LpOutcome, LpStatus, simplex_impl};
use crate::solver::error::{SolverError, SolverResult};
use crate::solver::traits::{LpProblem, MilpOptions};

/// Result from branch-and-bound.
#[derive(Debug, Clone)]
pub(crate) struct MilpOutcome {
    pub status: LpStatus,
    /// Incumbent with integer columns rounded; empty unless optimal.
    pub x: Vec<f64>,
    pub fun: f64,
    /// Number of nodes explored.
    pub nodes: usize,
}

struct BnBNode {
    lower: Vec<f64>,
    upper: Vec<f64>,
    lower_bound: f64,
}

/// Minimise `lp` with the columns in `integers` restricted to integer values.
///
/// Returns [`SolverError::IterationLimit`] when the node budget runs out
/// before any integer-feasible point was found.
pub(crate) fn milp_impl(
    lp: &LpProblem<'_>,
    integers: &[usize],
    options: &MilpOptions,
) -> SolverResult<MilpOutcome> {
    lp.validate()?;
    let n = lp.num_columns();
    let mut is_int = vec![false; n];
    for &j in integers {
        let slot = is_int.get_mut(j).ok_or_else(|| SolverError::InvalidInput {
            context: format!("milp: integer column {} out of {} columns", j, n),
        })?;
        *slot = true;
    }

    // Integer columns start from their rounded-inward bounds
    let mut root_lower = lp.col_lower.to_vec();
    let mut root_upper = lp.col_upper.to_vec();
    for j in (0..n).filter(|&j| is_int[j]) {
        root_lower[j] = (root_lower[j] - options.int_tol).ceil();
        root_upper[j] = (root_upper[j] + options.int_tol).floor();
    }

    let mut stack = vec![BnBNode {
        lower: root_lower,
        upper: root_upper,
        lower_bound: f64::NEG_INFINITY,
    }];

    let mut best_solution: Option<Vec<f64>> = None;
    let mut best_objective = f64::INFINITY;
    let mut nodes_explored = 0;
    let mut limit_hit = false;

    while let Some(node) = stack.pop() {
        nodes_explored += 1;
        if nodes_explored > options.max_nodes {
            limit_hit = true;
            break;
        }

        if node.lower_bound >= best_objective - options.gap_tol {
            continue;
        }

        let node_lp = LpProblem {
            col_lower: &node.lower,
            col_upper: &node.upper,
            ..*lp
        };
        let relaxation: LpOutcome = match simplex_impl(&node_lp, &options.lp_options) {
            Ok(r) => r,
            Err(e) => {
                debug!("milp: node {} relaxation failed: {}", nodes_explored, e);
                continue;
            }
        };

        match relaxation.status {
            LpStatus::Optimal => {}
            LpStatus::Unbounded if nodes_explored == 1 => {
                return Ok(MilpOutcome {
                    status: LpStatus::Unbounded,
                    x: Vec::new(),
                    fun: f64::NEG_INFINITY,
                    nodes: nodes_explored,
                });
            }
            _ => continue,
        }

        if relaxation.fun >= best_objective - options.gap_tol {
            continue;
        }

        let x = relaxation.x;
        let mut branch_var = None;
        let mut max_fractionality = 0.0;
        for (i, &xi) in x.iter().enumerate().filter(|&(i, _)| is_int[i]) {
            let frac = xi - xi.floor();
            let fractionality = frac.min(1.0 - frac);
            if fractionality > options.int_tol && fractionality > max_fractionality {
                max_fractionality = fractionality;
                branch_var = Some(i);
            }
        }

        // Branch on the most fractional variable
        let Some(var) = branch_var else {
            trace!("milp: incumbent {} at node {}", relaxation.fun, nodes_explored);
            best_objective = relaxation.fun;
            best_solution = Some(x);
            continue;
        };

        let mut left_upper = node.upper.clone();
        left_upper[var] = left_upper[var].min(x[var].floor());
        if node.lower[var] <= left_upper[var] {
            stack.push(BnBNode {
                lower: node.lower.clone(),
                upper: left_upper,
                lower_bound: relaxation.fun,
            });
        }

        let mut right_lower = node.lower;
        right_lower[var] = right_lower[var].max(x[var].ceil());
        if right_lower[var] <= node.upper[var] {
            stack.push(BnBNode {
                lower: right_lower,
                upper: node.upper,
                lower_bound: relaxation.fun,
            });
        }
    }

    match best_solution {
        Some(x) => {
            let x_rounded: Vec<f64> = x
                .iter()
                .zip(&is_int)
                .map(|(&xi, &int)| if int { xi.round() } else { xi })
                .collect();
            let fun = x_rounded
                .iter()
                .zip(lp.objective)
                .map(|(xi, ci)| xi * ci)
                .sum();
            Ok(MilpOutcome {
                status: LpStatus::Optimal,
                x: x_rounded,
                fun,
                nodes: nodes_explored,
            })
        }
        None if limit_hit => Err(SolverError::IterationLimit {
            iterations: nodes_explored,
        }),
        None => Ok(MilpOutcome {
            status: LpStatus::Infeasible,
            x: Vec::new(),
            fun: f64::INFINITY,
            nodes: nodes_explored,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sprs::{CsMat, TriMat};

    fn csr(rows: usize, cols: usize, entries: &[(usize, usize, f64)]) -> CsMat<f64> {
        let mut tri = TriMat::new((rows, cols));
        for &(r, c, v) in entries {
            tri.add_triplet(r, c, v);
        }
        tri.to_csr()
    }

    #[test]
    fn test_knapsack() {
        // maximize 5a + 4b + 3c, 2a + 3b + c <= 5, 4a + b + 2c <= 11,
        // 3a + 4b + 2c <= 8, binaries
        let a = csr(
            3,
            3,
            &[
                (0, 0, 2.0),
                (0, 1, 3.0),
                (0, 2, 1.0),
                (1, 0, 4.0),
                (1, 1, 1.0),
                (1, 2, 2.0),
                (2, 0, 3.0),
                (2, 1, 4.0),
                (2, 2, 2.0),
            ],
        );
        let lp = LpProblem {
            matrix: &a,
            objective: &[-5.0, -4.0, -3.0],
            col_lower: &[0.0; 3],
            col_upper: &[1.0; 3],
            row_lower: &[f64::NEG_INFINITY; 3],
            row_upper: &[5.0, 11.0, 8.0],
        };
        let result = milp_impl(&lp, &[0, 1, 2], &MilpOptions::default()).unwrap();
        assert_eq!(result.status, LpStatus::Optimal);
        // all three violate row 0; a + b is the best pair
        assert!((result.fun + 9.0).abs() < 1e-9);
        assert_eq!(result.x, vec![1.0, 1.0, 0.0]);
    }

    #[test]
    fn test_fractional_relaxation() {
        // maximize x, 2x <= 3, x integer -> x = 1
        let a = csr(1, 1, &[(0, 0, 2.0)]);
        let lp = LpProblem {
            matrix: &a,
            objective: &[-1.0],
            col_lower: &[0.0],
            col_upper: &[f64::INFINITY],
            row_lower: &[f64::NEG_INFINITY],
            row_upper: &[3.0],
        };
        let result = milp_impl(&lp, &[0], &MilpOptions::default()).unwrap();
        assert!((result.x[0] - 1.0).abs() < 1e-12);
        assert!(result.nodes > 1);

        let relaxed = milp_impl(&lp, &[], &MilpOptions::default()).unwrap();
        assert!((relaxed.x[0] - 1.5).abs() < 1e-9);
    }

    #[test]
    fn test_integer_infeasible() {
        // 2x == 1 with x integer
        let a = csr(1, 1, &[(0, 0, 2.0)]);
        let lp = LpProblem {
            matrix: &a,
            objective: &[1.0],
            col_lower: &[0.0],
            col_upper: &[5.0],
            row_lower: &[1.0],
            row_upper: &[1.0],
        };
        let result = milp_impl(&lp, &[0], &MilpOptions::default()).unwrap();
        assert_eq!(result.status, LpStatus::Infeasible);

        let options = MilpOptions {
            max_nodes: 1,
            ..MilpOptions::default()
        };
        assert!(matches!(
            milp_impl(&lp, &[0], &options),
            Err(SolverError::IterationLimit { .. })
        ));
        assert!(milp_impl(&lp, &[3], &MilpOptions::default()).is_err());
    }
}
