//! Two-phase tableau simplex for LPs in row-bound form.
//!
//! The problem is first rewritten in standard form `A z = b, z >= 0`:
//! columns are shifted onto their finite lower bound (or mirrored onto their
//! upper bound), free columns are split, finite column ranges and ranged rows
//! get explicit rows, and every inequality gets a slack. Pivoting uses
//! Bland's rule, so degenerate problems cannot cycle.

use crate::solver::error::{SolverError, SolverResult};
use crate::solver::traits::{LinProgOptions, LpProblem};

/// Phase-one residual above which the problem is declared infeasible.
const FEASIBILITY_TOL: f64 = 1e-7;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LpStatus {
    Optimal,
    Infeasible,
    Unbounded,
}

/// Result of one LP solve.
#[derive(Debug, Clone)]
pub(crate) struct LpOutcome {
    pub status: LpStatus,
    /// Solution in the original columns; empty unless optimal.
    pub x: Vec<f64>,
    /// Objective value (minimisation); meaningless unless optimal.
    pub fun: f64,
    /// Pivots over both phases.
    pub nit: usize,
}

impl LpOutcome {
    fn without_solution(status: LpStatus, nit: usize) -> Self {
        Self {
            status,
            x: Vec::new(),
            fun: match status {
                LpStatus::Unbounded => f64::NEG_INFINITY,
                _ => f64::INFINITY,
            },
            nit,
        }
    }
}

/// `x_j = shift + Σ coef · z_k`
struct ColumnMap {
    shift: f64,
    terms: Vec<(usize, f64)>,
}

struct StandardForm {
    rows: Vec<Vec<(usize, f64)>>,
    rhs: Vec<f64>,
    /// Slack of each row and its coefficient.
    slack: Vec<Option<(usize, f64)>>,
    cost: Vec<f64>,
    num_vars: usize,
    columns: Vec<ColumnMap>,
}

impl StandardForm {
    fn push(&mut self, coefs: Vec<(usize, f64)>, rhs: f64, slack: Option<(usize, f64)>) {
        self.rows.push(coefs);
        self.rhs.push(rhs);
        self.slack.push(slack);
    }

    fn new_var(&mut self) -> usize {
        self.num_vars += 1;
        self.num_vars - 1
    }
}

/// Standard form of `lp`, or `None` when its bounds are contradictory.
fn standard_form(lp: &LpProblem<'_>, tol: f64) -> Option<StandardForm> {
    let mut sf = StandardForm {
        rows: Vec::new(),
        rhs: Vec::new(),
        slack: Vec::new(),
        cost: Vec::new(),
        num_vars: 0,
        columns: Vec::with_capacity(lp.num_columns()),
    };

    let mut ranges = Vec::new();
    for (&l, &u) in lp.col_lower.iter().zip(lp.col_upper) {
        if l > u + tol || l == f64::INFINITY || u == f64::NEG_INFINITY {
            return None;
        }
        let map = match (l.is_finite(), u.is_finite()) {
            (true, upper_finite) => {
                let z = sf.new_var();
                if upper_finite {
                    ranges.push((z, (u - l).max(0.0)));
                }
                ColumnMap {
                    shift: l,
                    terms: vec![(z, 1.0)],
                }
            }
            (false, true) => ColumnMap {
                shift: u,
                terms: vec![(sf.new_var(), -1.0)],
            },
            (false, false) => {
                let plus = sf.new_var();
                let minus = sf.new_var();
                ColumnMap {
                    shift: 0.0,
                    terms: vec![(plus, 1.0), (minus, -1.0)],
                }
            }
        };
        sf.columns.push(map);
    }

    for (i, row) in lp.matrix.outer_iterator().enumerate() {
        let mut coefs = Vec::with_capacity(row.nnz() + 1);
        let mut shift = 0.0;
        for (j, &a) in row.iter() {
            let map = &sf.columns[j];
            shift += a * map.shift;
            coefs.extend(map.terms.iter().map(|&(k, s)| (k, a * s)));
        }
        let lower = lp.row_lower[i] - shift;
        let upper = lp.row_upper[i] - shift;
        if lower > upper + tol || lower == f64::INFINITY || upper == f64::NEG_INFINITY {
            return None;
        }
        match (lower.is_finite(), upper.is_finite()) {
            (true, true) if upper - lower <= tol => sf.push(coefs, lower, None),
            (true, true) => {
                let surplus = sf.new_var();
                let mut ge = coefs.clone();
                ge.push((surplus, -1.0));
                sf.push(ge, lower, Some((surplus, -1.0)));
                let slack = sf.new_var();
                coefs.push((slack, 1.0));
                sf.push(coefs, upper, Some((slack, 1.0)));
            }
            (false, true) => {
                let slack = sf.new_var();
                coefs.push((slack, 1.0));
                sf.push(coefs, upper, Some((slack, 1.0)));
            }
            (true, false) => {
                let surplus = sf.new_var();
                coefs.push((surplus, -1.0));
                sf.push(coefs, lower, Some((surplus, -1.0)));
            }
            (false, false) => {}
        }
    }

    for (z, width) in ranges {
        let slack = sf.new_var();
        sf.push(vec![(z, 1.0), (slack, 1.0)], width, Some((slack, 1.0)));
    }

    sf.cost = vec![0.0; sf.num_vars];
    for (map, &c) in sf.columns.iter().zip(lp.objective) {
        for &(k, s) in &map.terms {
            sf.cost[k] += c * s;
        }
    }
    Some(sf)
}

/// Dense simplex tableau. Row `r` holds `B⁻¹A` and, in its last slot, the
/// basic value; `obj` holds reduced costs and minus the objective.
struct Tableau {
    rows: Vec<Vec<f64>>,
    obj: Vec<f64>,
    basis: Vec<usize>,
    width: usize,
}

impl Tableau {
    fn rhs(&self, r: usize) -> f64 {
        self.rows[r][self.width]
    }

    fn pivot(&mut self, r: usize, j: usize) -> SolverResult<()> {
        let p = self.rows[r][j];
        if !p.is_finite() || p == 0.0 {
            return Err(SolverError::NumericalError {
                message: format!("pivot element {} at ({}, {})", p, r, j),
            });
        }
        for v in self.rows[r].iter_mut() {
            *v /= p;
        }
        let pivot_row = self.rows[r].clone();
        for (i, row) in self.rows.iter_mut().enumerate() {
            let f = row[j];
            if i != r && f != 0.0 {
                for (v, &pv) in row.iter_mut().zip(&pivot_row) {
                    *v -= f * pv;
                }
            }
        }
        let f = self.obj[j];
        if f != 0.0 {
            for (v, &pv) in self.obj.iter_mut().zip(&pivot_row) {
                *v -= f * pv;
            }
        }
        self.basis[r] = j;
        Ok(())
    }

    /// Pivot until optimal. Only columns `< allowed` may enter. Returns
    /// `false` when the objective is unbounded below.
    fn run(&mut self, allowed: usize, options: &LinProgOptions, nit: &mut usize) -> SolverResult<bool> {
        let tol = options.tol;
        let mut pivots = 0;
        loop {
            // Bland: lowest-index improving column
            let Some(j) = (0..allowed).find(|&j| self.obj[j] < -tol) else {
                return Ok(true);
            };

            let mut leave: Option<(usize, f64)> = None;
            for r in 0..self.rows.len() {
                let a = self.rows[r][j];
                if a <= tol {
                    continue;
                }
                let ratio = self.rhs(r) / a;
                leave = match leave {
                    None => Some((r, ratio)),
                    Some((best, best_ratio)) => {
                        if ratio < best_ratio - tol
                            || ((ratio - best_ratio).abs() <= tol
                                && self.basis[r] < self.basis[best])
                        {
                            Some((r, ratio))
                        } else {
                            Some((best, best_ratio))
                        }
                    }
                };
            }
            let Some((r, _)) = leave else {
                return Ok(false);
            };

            self.pivot(r, j)?;
            pivots += 1;
            *nit += 1;
            if pivots > options.max_iter {
                return Err(SolverError::IterationLimit { iterations: *nit });
            }
        }
    }
}

/// Minimise `lp.objective · x` over the LP.
pub(crate) fn simplex_impl(lp: &LpProblem<'_>, options: &LinProgOptions) -> SolverResult<LpOutcome> {
    lp.validate()?;
    let tol = options.tol;
    let Some(sf) = standard_form(lp, tol) else {
        return Ok(LpOutcome::without_solution(LpStatus::Infeasible, 0));
    };

    let n = sf.num_vars;
    let m = sf.rows.len();

    // Initial basis: a slack with a positive coefficient, else an artificial.
    let mut dense = Vec::with_capacity(m);
    let mut starts = Vec::with_capacity(m);
    let mut artificials = 0;
    for r in 0..m {
        let mut row = vec![0.0; n + 1];
        for &(k, v) in &sf.rows[r] {
            row[k] += v;
        }
        row[n] = sf.rhs[r];
        let mut slack = sf.slack[r];
        if row[n] < 0.0 {
            row.iter_mut().for_each(|v| *v = -*v);
            slack = slack.map(|(k, s)| (k, -s));
        }
        match slack {
            Some((k, s)) if s > 0.0 => starts.push(Some(k)),
            _ => {
                starts.push(None);
                artificials += 1;
            }
        }
        dense.push(row);
    }

    let width = n + artificials;
    let mut tableau = Tableau {
        rows: Vec::with_capacity(m),
        obj: vec![0.0; width + 1],
        basis: Vec::with_capacity(m),
        width,
    };
    let mut next_artificial = n;
    for (mut row, start) in dense.into_iter().zip(starts) {
        let rhs = row[n];
        row.truncate(n);
        row.resize(width + 1, 0.0);
        row[width] = rhs;
        let basic = match start {
            Some(k) => k,
            None => {
                let a = next_artificial;
                next_artificial += 1;
                row[a] = 1.0;
                for (o, &v) in tableau.obj.iter_mut().zip(&row).take(n) {
                    *o -= v;
                }
                tableau.obj[width] -= rhs;
                a
            }
        };
        tableau.rows.push(row);
        tableau.basis.push(basic);
    }

    let mut nit = 0;
    if artificials > 0 {
        tableau.run(width, options, &mut nit)?;
        let residual = -tableau.obj[width];
        let scale = 1.0 + sf.rhs.iter().fold(0.0_f64, |acc, b| acc.max(b.abs()));
        if residual > FEASIBILITY_TOL * scale {
            return Ok(LpOutcome::without_solution(LpStatus::Infeasible, nit));
        }

        // Drive artificials out of the basis; rows where that is impossible
        // are linearly dependent and dropped.
        let mut redundant = Vec::new();
        for r in 0..tableau.rows.len() {
            if tableau.basis[r] < n {
                continue;
            }
            match (0..n).find(|&j| tableau.rows[r][j].abs() > tol) {
                Some(j) => tableau.pivot(r, j)?,
                None => redundant.push(r),
            }
        }
        for &r in redundant.iter().rev() {
            tableau.rows.remove(r);
            tableau.basis.remove(r);
        }
    }

    // Phase two: reduced costs of the true objective.
    tableau.obj = vec![0.0; width + 1];
    tableau.obj[..n].copy_from_slice(&sf.cost);
    for r in 0..tableau.rows.len() {
        let cb = sf.cost[tableau.basis[r]];
        if cb != 0.0 {
            for (o, &v) in tableau.obj.iter_mut().zip(&tableau.rows[r]) {
                *o -= cb * v;
            }
        }
    }
    if !tableau.run(n, options, &mut nit)? {
        return Ok(LpOutcome::without_solution(LpStatus::Unbounded, nit));
    }

    let mut z = vec![0.0; n];
    for (r, &b) in tableau.basis.iter().enumerate() {
        z[b] = tableau.rhs(r).max(0.0);
    }
    let x: Vec<f64> = sf
        .columns
        .iter()
        .map(|map| map.shift + map.terms.iter().map(|&(k, s)| s * z[k]).sum::<f64>())
        .collect();
    let fun = x.iter().zip(lp.objective).map(|(xi, ci)| xi * ci).sum();

    Ok(LpOutcome {
        status: LpStatus::Optimal,
        x,
        fun,
        nit,
    })
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

    const INF: f64 = f64::INFINITY;

    #[test]
    fn test_linprog_simple() {
        // Maximize x + 2y (minimize -x - 2y)
        //   x + y <= 4, x <= 2, y <= 3, x, y >= 0
        let a = csr(1, 2, &[(0, 0, 1.0), (0, 1, 1.0)]);
        let lp = LpProblem {
            matrix: &a,
            objective: &[-1.0, -2.0],
            col_lower: &[0.0, 0.0],
            col_upper: &[2.0, 3.0],
            row_lower: &[-INF],
            row_upper: &[4.0],
        };
        let result = simplex_impl(&lp, &LinProgOptions::default()).unwrap();
        assert_eq!(result.status, LpStatus::Optimal);
        assert!((result.fun + 7.0).abs() < 1e-9);
        assert!((result.x[0] - 1.0).abs() < 1e-9);
        assert!((result.x[1] - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_equality_and_ranged_rows() {
        // minimize x + y, x + y == 3, 1 <= x - y <= 2, x, y free
        let a = csr(2, 2, &[(0, 0, 1.0), (0, 1, 1.0), (1, 0, 1.0), (1, 1, -1.0)]);
        let lp = LpProblem {
            matrix: &a,
            objective: &[1.0, 1.0],
            col_lower: &[-INF, -INF],
            col_upper: &[INF, INF],
            row_lower: &[3.0, 1.0],
            row_upper: &[3.0, 2.0],
        };
        let result = simplex_impl(&lp, &LinProgOptions::default()).unwrap();
        assert_eq!(result.status, LpStatus::Optimal);
        assert!((result.fun - 3.0).abs() < 1e-9);
        let diff = result.x[0] - result.x[1];
        assert!((1.0 - 1e-9..=2.0 + 1e-9).contains(&diff));
    }

    #[test]
    fn test_negative_bounds_and_ge_rows() {
        // minimize 2x - y, x >= -5, y <= 4, x + y >= -1
        let a = csr(1, 2, &[(0, 0, 1.0), (0, 1, 1.0)]);
        let lp = LpProblem {
            matrix: &a,
            objective: &[2.0, -1.0],
            col_lower: &[-5.0, -INF],
            col_upper: &[INF, 4.0],
            row_lower: &[-1.0],
            row_upper: &[INF],
        };
        let result = simplex_impl(&lp, &LinProgOptions::default()).unwrap();
        assert_eq!(result.status, LpStatus::Optimal);
        assert!((result.x[0] + 5.0).abs() < 1e-9);
        assert!((result.x[1] - 4.0).abs() < 1e-9);
        assert!((result.fun + 14.0).abs() < 1e-9);
    }

    #[test]
    fn test_infeasible() {
        // x + y <= 1, x + y >= 2
        let a = csr(2, 2, &[(0, 0, 1.0), (0, 1, 1.0), (1, 0, 1.0), (1, 1, 1.0)]);
        let lp = LpProblem {
            matrix: &a,
            objective: &[1.0, 1.0],
            col_lower: &[0.0, 0.0],
            col_upper: &[INF, INF],
            row_lower: &[-INF, 2.0],
            row_upper: &[1.0, INF],
        };
        let result = simplex_impl(&lp, &LinProgOptions::default()).unwrap();
        assert_eq!(result.status, LpStatus::Infeasible);

        let crossed = LpProblem {
            col_lower: &[3.0, 0.0],
            col_upper: &[2.0, 1.0],
            ..lp
        };
        let result = simplex_impl(&crossed, &LinProgOptions::default()).unwrap();
        assert_eq!(result.status, LpStatus::Infeasible);
    }

    #[test]
    fn test_unbounded() {
        // minimize -x, x - y <= 1, x, y >= 0
        let a = csr(1, 2, &[(0, 0, 1.0), (0, 1, -1.0)]);
        let lp = LpProblem {
            matrix: &a,
            objective: &[-1.0, 0.0],
            col_lower: &[0.0, 0.0],
            col_upper: &[INF, INF],
            row_lower: &[-INF],
            row_upper: &[1.0],
        };
        let result = simplex_impl(&lp, &LinProgOptions::default()).unwrap();
        assert_eq!(result.status, LpStatus::Unbounded);
    }

    #[test]
    fn test_redundant_equalities() {
        // x + y == 2 twice, minimize x
        let a = csr(2, 2, &[(0, 0, 1.0), (0, 1, 1.0), (1, 0, 1.0), (1, 1, 1.0)]);
        let lp = LpProblem {
            matrix: &a,
            objective: &[1.0, 0.0],
            col_lower: &[0.0, 0.0],
            col_upper: &[INF, INF],
            row_lower: &[2.0, 2.0],
            row_upper: &[2.0, 2.0],
        };
        let result = simplex_impl(&lp, &LinProgOptions::default()).unwrap();
        assert_eq!(result.status, LpStatus::Optimal);
        assert!(result.fun.abs() < 1e-9);
        assert!((result.x[1] - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_iteration_limit() {
        let a = csr(1, 2, &[(0, 0, 1.0), (0, 1, 1.0)]);
        let lp = LpProblem {
            matrix: &a,
            objective: &[-1.0, -2.0],
            col_lower: &[0.0, 0.0],
            col_upper: &[2.0, 3.0],
            row_lower: &[1.0],
            row_upper: &[4.0],
        };
        let options = LinProgOptions {
            max_iter: 0,
            ..LinProgOptions::default()
        };
        assert!(matches!(
            simplex_impl(&lp, &options),
            Err(SolverError::IterationLimit { .. })
        ));
    }
}
