//! Evaluation strategies: wait-and-see, expected value and the expected
//! result of the expected-value solution, plus the EVPI and VSS built on
//! them.

use log::{debug, warn};

use crate::assemble::{FixedColumns, assemble_core, assemble_scenario};
use crate::error::{StochError, StochResult};
use crate::solver::{ObjectiveSense, SolveStatus, SolverAdapter};
use crate::template::CoreTemplate;

use super::{ModelStatus, Solved, StochasticModel, solve_problem, strategy_of};

/// Solve of one scenario submodel.
#[derive(Debug, Clone, PartialEq)]
pub struct ScenarioOutcome {
    pub scenario: usize,
    /// Normalised scenario probability.
    pub probability: f64,
    pub status: SolveStatus,
    /// Optimal objective, or ±∞ for an infeasible or unbounded submodel.
    pub objective: f64,
    /// Decision vector in template order; empty unless optimal.
    pub solution: Vec<f64>,
}

/// Probability-weighted evaluation over every scenario.
#[derive(Debug, Clone, PartialEq)]
pub struct ScenarioEvaluation {
    pub scenarios: Vec<ScenarioOutcome>,
    /// `Σ probability × objective`.
    pub value: f64,
}

/// Solve of the core template alone.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpectedValue {
    pub status: SolveStatus,
    pub objective: f64,
    /// Stage-0 decisions; empty unless optimal.
    pub first_stage: Vec<f64>,
    /// All decisions in template order; empty unless optimal.
    pub solution: Vec<f64>,
}

/// Objective charged for a submodel without an optimal solution.
fn unresolved_objective(status: SolveStatus, sense: ObjectiveSense) -> f64 {
    match (status, sense) {
        (SolveStatus::PrimalInfeasible, ObjectiveSense::Minimize)
        | (SolveStatus::DualInfeasible, ObjectiveSense::Maximize) => f64::INFINITY,
        (SolveStatus::PrimalInfeasible, ObjectiveSense::Maximize)
        | (SolveStatus::DualInfeasible, ObjectiveSense::Minimize) => f64::NEG_INFINITY,
        _ => f64::NAN,
    }
}

impl<S: SolverAdapter> StochasticModel<S> {
    /// Wait-and-see: solve every scenario on its own.
    ///
    /// A scenario whose solve fails is recorded as `Abandoned` with a NaN
    /// objective and the remaining scenarios are still solved; the value is
    /// then NaN.
    pub fn solve_wait_and_see(&mut self) -> StochResult<ScenarioEvaluation> {
        let evaluation = self.evaluate_scenarios(None)?;
        debug!("wait-and-see value {}", evaluation.value);
        Ok(evaluation)
    }

    /// Expected value: solve the core template, ignoring all randomness.
    pub fn solve_expected_value(&mut self) -> StochResult<ExpectedValue> {
        let solver = self.solver.as_mut().ok_or(StochError::NoSolver)?;
        let sub = assemble_core(&self.core, None)?;
        let solved = solve_problem(solver, &sub.problem, self.options.sense)?;

        let (objective, first_stage, solution) = if solved.status == SolveStatus::Optimal {
            (
                solved.objective,
                sub.stage_solution(&self.core, &solved.solution, 0)?.to_vec(),
                sub.column_solution(&self.core, &solved.solution)?,
            )
        } else {
            (
                unresolved_objective(solved.status, self.options.sense),
                Vec::new(),
                Vec::new(),
            )
        };
        debug!("expected-value problem: {:?}, objective {}", solved.status, objective);
        Ok(ExpectedValue {
            status: solved.status,
            objective,
            first_stage,
            solution,
        })
    }

    /// Expected result of the expected-value solution: fix the EV stage-0
    /// decisions and solve every scenario under that fixation. Failed
    /// scenario solves are recorded as in
    /// [`solve_wait_and_see`](Self::solve_wait_and_see).
    pub fn solve_expected_result_of_ev(&mut self) -> StochResult<ScenarioEvaluation> {
        let ev = self.solve_expected_value()?;
        if ev.status != SolveStatus::Optimal {
            return Err(StochError::InvalidInput {
                context: format!("expected-value problem ended {:?}", ev.status),
            });
        }
        let fixed = FixedColumns::new(0, ev.first_stage);
        let evaluation = self.evaluate_scenarios(Some(&fixed))?;
        debug!("expected result of the EV solution {}", evaluation.value);
        Ok(evaluation)
    }

    /// `|WS − RP|`, solving the deterministic equivalent first if needed.
    pub fn expected_value_of_perfect_information(&mut self) -> StochResult<f64> {
        let rp = self.recourse_value()?;
        let ws = self.solve_wait_and_see()?.value;
        Ok((ws - rp).abs())
    }

    /// `|RP − EEV|`, solving the deterministic equivalent first if needed.
    pub fn value_of_stochastic_solution(&mut self) -> StochResult<f64> {
        let rp = self.recourse_value()?;
        let eev = self.solve_expected_result_of_ev()?.value;
        Ok((rp - eev).abs())
    }

    /// Optimal value of the deterministic equivalent.
    fn recourse_value(&mut self) -> StochResult<f64> {
        match self.status {
            ModelStatus::Optimal => {}
            ModelStatus::Attached => {
                self.solve()?;
            }
            ModelStatus::Detached | ModelStatus::SolverOnly | ModelStatus::Abandoned => {
                self.load_deterministic_equivalent()?;
                self.solve()?;
            }
            ModelStatus::PrimalInfeasible | ModelStatus::DualInfeasible => {}
        }
        self.objective.ok_or_else(|| StochError::InvalidInput {
            context: format!("deterministic equivalent is {}", self.status),
        })
    }

    fn evaluate_scenarios(&mut self, fixed: Option<&FixedColumns>) -> StochResult<ScenarioEvaluation> {
        if self.solver.is_none() {
            return Err(StochError::NoSolver);
        }
        self.prepare_tree(false)?;

        let core: &CoreTemplate = &self.core;
        let tree = &self.tree;
        let sense = self.options.sense;
        let strategy = strategy_of(&self.strategy, &self.options.combine_rule);
        let solver = self.solver.as_mut().ok_or(StochError::NoSolver)?;
        let total = tree.total_probability();

        let mut scenarios = Vec::with_capacity(tree.scenario_count());
        let mut value = 0.0;
        for scenario in 0..tree.scenario_count() {
            let sub = assemble_scenario(core, tree, scenario, strategy, fixed)?;
            let solved = match solve_problem(solver, &sub.problem, sense) {
                Ok(solved) => solved,
                Err(e) => {
                    warn!("scenario {}: solver failed ({}), recorded as abandoned", scenario, e);
                    Solved {
                        status: SolveStatus::Abandoned,
                        objective: f64::NAN,
                        solution: Vec::new(),
                    }
                }
            };
            let probability = tree.scenario_probability(scenario)? / total;
            let (objective, solution) = if solved.status == SolveStatus::Optimal {
                (solved.objective, sub.column_solution(core, &solved.solution)?)
            } else {
                (unresolved_objective(solved.status, sense), Vec::new())
            };
            if probability > 0.0 {
                value += probability * objective;
            }
            scenarios.push(ScenarioOutcome {
                scenario,
                probability,
                status: solved.status,
                objective,
                solution,
            });
        }
        Ok(ScenarioEvaluation { scenarios, value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unresolved_objective() {
        use ObjectiveSense::{Maximize, Minimize};
        assert_eq!(
            unresolved_objective(SolveStatus::PrimalInfeasible, Minimize),
            f64::INFINITY
        );
        assert_eq!(
            unresolved_objective(SolveStatus::PrimalInfeasible, Maximize),
            f64::NEG_INFINITY
        );
        assert_eq!(
            unresolved_objective(SolveStatus::DualInfeasible, Minimize),
            f64::NEG_INFINITY
        );
        assert!(unresolved_objective(SolveStatus::Abandoned, Minimize).is_nan());
    }
}
