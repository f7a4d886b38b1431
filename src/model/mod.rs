//! Stochastic model: the template, its random data, the scenario tree and the
//! solver, driven through sample → fan → tree → assembly → solve.
//!
//! ```text
//! model/
//! ├── mod.rs          # StochasticModel and the attach/solve lifecycle
//! ├── options.rs      # ModelOptions
//! ├── status.rs       # ModelStatus
//! ├── independent.rs  # IndependentDistribution
//! ├── evaluate.rs     # WS, EV, EEV, EVPI, VSS
//! └── tests.rs        # End-to-end suite
//! ```

mod evaluate;
mod independent;
mod options;
mod status;


pub use evaluate::{ExpectedValue, ScenarioEvaluation, ScenarioOutcome};
pub use independent::{DiscreteEntry, IndependentDistribution};
pub use options::ModelOptions;
pub use status::ModelStatus;

use std::sync::Arc;

use log::{debug, error, warn};
use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::assemble::{AssembledProblem, assemble_deterministic_equivalent};
use crate::error::{StochError, StochResult};
use crate::producer::{CoefficientRecord, ingest, into_core};
use crate::sampling::{
    RandomVariable, SamplingMode, StageSamples, build_fan, build_scenario_fan, draw_samples,
    sample, sampling_mode,
};
use crate::solver::{
    LpProblem, ObjectiveSense, SolveStatus, SolverAdapter, SolverError, SolverResult,
};
use crate::template::{
    CombineRule, CombineStrategy, CoreTemplate, DeterministicModel, StageOverride,
};
use crate::tree::{NodeId, ScenarioTree, build_tree};

/// A multi-stage stochastic program over a shared core template.
///
/// Scenarios come either from explicit [`generate_scenario`] calls or from
/// declared random variables; the two cannot be mixed. With random
/// variables, every [`load_deterministic_equivalent`] resamples and rebuilds
/// the tree from scratch.
///
/// [`generate_scenario`]: StochasticModel::generate_scenario
/// [`load_deterministic_equivalent`]: StochasticModel::load_deterministic_equivalent
pub struct StochasticModel<S> {
    core: Arc<CoreTemplate>,
    options: ModelOptions,
    strategy: Option<Box<dyn CombineStrategy>>,
    variables: Vec<RandomVariable>,
    tree: ScenarioTree,
    /// The tree reflects the current random variables.
    tree_current: bool,
    rng: StdRng,
    solver: Option<S>,
    problem: Option<AssembledProblem>,
    solution: Vec<f64>,
    objective: Option<f64>,
    status: ModelStatus,
}

/// Outcome of one load-and-solve round trip.
pub(crate) struct Solved {
    pub status: SolveStatus,
    pub objective: f64,
    pub solution: Vec<f64>,
}

impl<S: SolverAdapter> StochasticModel<S> {
    pub fn new(core: impl Into<Arc<CoreTemplate>>, options: ModelOptions) -> Self {
        let core = core.into();
        let rng = match options.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self {
            tree: ScenarioTree::new(core.stages()),
            core,
            options,
            strategy: None,
            variables: Vec::new(),
            tree_current: true,
            rng,
            solver: None,
            problem: None,
            solution: Vec::new(),
            objective: None,
            status: ModelStatus::Detached,
        }
    }

    pub fn with_solver(core: impl Into<Arc<CoreTemplate>>, options: ModelOptions, solver: S) -> Self {
        let mut model = Self::new(core, options);
        model.attach_solver(solver);
        model
    }

    /// Build a model from producer records: deterministic values go into
    /// `model`, stage-random ones become scenario-based random variables.
    pub fn from_records(
        mut model: DeterministicModel,
        records: &[CoefficientRecord],
        stages: usize,
        options: ModelOptions,
    ) -> StochResult<Self> {
        let random = ingest(records, &mut model)?;
        let core = CoreTemplate::from_deterministic(&model, stages)?;
        let random = into_core(random, &core)?;
        let mut stochastic = Self::new(core, options);
        for var in random {
            stochastic.add_random_variable(var)?;
        }
        Ok(stochastic)
    }

    pub fn attach_solver(&mut self, solver: S) {
        self.solver = Some(solver);
        self.discard_problem();
    }

    pub fn detach_solver(&mut self) -> Option<S> {
        let solver = self.solver.take();
        self.discard_problem();
        solver
    }

    /// Use `strategy` instead of the configured [`CombineRule`].
    pub fn set_combine_strategy(&mut self, strategy: impl CombineStrategy + 'static) {
        self.strategy = Some(Box::new(strategy));
        self.discard_problem();
    }

    pub fn core(&self) -> &CoreTemplate {
        &self.core
    }

    pub fn options(&self) -> &ModelOptions {
        &self.options
    }

    pub fn tree(&self) -> &ScenarioTree {
        &self.tree
    }

    pub fn random_variables(&self) -> &[RandomVariable] {
        &self.variables
    }

    pub fn scenario_count(&self) -> usize {
        self.tree.scenario_count()
    }

    pub fn status(&self) -> ModelStatus {
        self.status
    }

    /// Objective value of the last optimal solve of the deterministic
    /// equivalent.
    pub fn objective_value(&self) -> Option<f64> {
        self.objective
    }

    /// The loaded deterministic equivalent.
    pub fn problem(&self) -> Option<&AssembledProblem> {
        self.problem.as_ref()
    }

    pub fn solver(&self) -> Option<&S> {
        self.solver.as_ref()
    }

    pub fn solver_mut(&mut self) -> Option<&mut S> {
        self.solver.as_mut()
    }

    /// Add a scenario explicitly. See [`ScenarioTree::generate_scenario`].
    pub fn generate_scenario(
        &mut self,
        overrides: Vec<Option<StageOverride>>,
        branch_stage: usize,
        ancestor: Option<usize>,
        probability: f64,
    ) -> StochResult<usize> {
        if !self.variables.is_empty() {
            return Err(StochError::InvalidInput {
                context: "explicit scenarios cannot be added to a model with random variables"
                    .to_string(),
            });
        }
        let scenario = self.tree.generate_scenario(
            &self.core,
            overrides,
            branch_stage,
            ancestor,
            probability,
        )?;
        self.discard_problem();
        debug!(
            "scenario {} branches at stage {} from {:?} with probability {}",
            scenario, branch_stage, ancestor, probability
        );
        Ok(scenario)
    }

    /// Declare a random coefficient, revealed at `var.stage`.
    pub fn add_random_variable(&mut self, var: RandomVariable) -> StochResult<()> {
        self.check_random_variable(&var, &self.variables)?;
        self.variables.push(var);
        self.tree_current = false;
        self.discard_problem();
        Ok(())
    }

    /// Declare every random variable of `distribution` and adopt its combine
    /// rule. Returns the number of variables added.
    ///
    /// Nothing is declared unless every entry is valid.
    pub fn process_discrete_distribution(
        &mut self,
        distribution: &IndependentDistribution,
    ) -> StochResult<usize> {
        let core = Arc::clone(&self.core);
        let vars = distribution.variables(|target| target.stage(&core))?;
        let mut declared = self.variables.clone();
        for var in vars {
            self.check_random_variable(&var, &declared)?;
            declared.push(var);
        }

        let count = declared.len() - self.variables.len();
        if count > 0 {
            self.variables = declared;
            self.tree_current = false;
        }
        self.options.combine_rule = distribution.combine_rule;
        self.discard_problem();
        Ok(count)
    }

    /// Assemble the deterministic equivalent and load it into the solver.
    ///
    /// With random variables the tree is resampled and rebuilt first.
    pub fn load_deterministic_equivalent(&mut self) -> StochResult<&AssembledProblem> {
        if self.solver.is_none() {
            return Err(StochError::NoSolver);
        }
        self.discard_problem();
        self.prepare_tree(true)?;

        let strategy = strategy_of(&self.strategy, &self.options.combine_rule);
        let problem = assemble_deterministic_equivalent(
            &self.core,
            &mut self.tree,
            strategy,
            self.options.probability_tol,
        )?;
        let solver = self.solver.as_mut().ok_or(StochError::NoSolver)?;
        load_problem(solver, &problem, self.options.sense)?;

        self.status = ModelStatus::Attached;
        Ok(self.problem.insert(problem))
    }

    /// Solve the loaded deterministic equivalent.
    ///
    /// Infeasibility and unboundedness are statuses. A failed integer solve
    /// is retried once as a continuous relaxation; any other failure leaves
    /// the model `Abandoned` with its problem discarded.
    pub fn solve(&mut self) -> StochResult<ModelStatus> {
        let solver = self.solver.as_mut().ok_or(StochError::NoSolver)?;
        let problem = self.problem.as_ref().ok_or(StochError::NotAttached)?;

        match solve_problem(solver, problem, self.options.sense) {
            Ok(solved) if solved.status != SolveStatus::Abandoned => {
                self.status = solved.status.into();
                if solved.status == SolveStatus::Optimal {
                    self.objective = Some(solved.objective);
                    self.solution = solved.solution;
                }
                debug!("deterministic equivalent: {}", self.status);
            }
            result => {
                match result {
                    Err(e) => error!("solver failed on the deterministic equivalent: {}", e),
                    Ok(_) => error!("solver abandoned the deterministic equivalent"),
                }
                self.discard_problem();
                self.status = ModelStatus::Abandoned;
            }
        }
        Ok(self.status)
    }

    pub fn leaf(&self, scenario: usize) -> StochResult<NodeId> {
        self.tree.leaf(scenario)
    }

    /// Parent of `id` in the current tree, `None` at the root. An id left
    /// over from an earlier tree is a navigation error.
    pub fn parent(&self, id: NodeId) -> StochResult<Option<NodeId>> {
        self.tree.parent(id)
    }

    /// Solution of the last optimal solve, in assembled order.
    pub fn solution(&self) -> StochResult<&[f64]> {
        if self.status != ModelStatus::Optimal {
            return Err(StochError::NotAttached);
        }
        Ok(&self.solution)
    }

    /// Decision vector of `scenario` in template order.
    pub fn column_solution(&self, scenario: usize) -> StochResult<Vec<f64>> {
        self.tree
            .column_solution(&self.core, self.solution()?, scenario)
    }

    /// Decisions of `scenario` at `stage`; empty for a virtual stage.
    pub fn stage_solution(&self, scenario: usize, stage: usize) -> StochResult<&[f64]> {
        self.tree
            .stage_solution(&self.core, self.solution()?, scenario, stage)
    }

    /// Value of core column `col` at `stage` of `scenario`.
    pub fn column_value(&self, scenario: usize, stage: usize, col: usize) -> StochResult<f64> {
        self.tree
            .column_value(&self.core, self.solution()?, scenario, stage, col)
    }

    /// Check `var` against the template and against `declared`.
    fn check_random_variable(
        &self,
        var: &RandomVariable,
        declared: &[RandomVariable],
    ) -> StochResult<()> {
        if self.variables.is_empty() && !self.tree.is_empty() {
            return Err(StochError::InvalidInput {
                context: "random variables cannot be added to a model with explicit scenarios"
                    .to_string(),
            });
        }
        let stages = self.core.stages();
        if var.stage == 0 || var.stage >= stages {
            return Err(StochError::BranchStageOutOfRange {
                stage: var.stage,
                stages,
            });
        }
        let mut patch = StageOverride::new(var.stage);
        patch.set_target(var.target, 0.0);
        patch.validate(&self.core)?;
        match sampling_mode(declared)? {
            Some(mode) if mode != var.mode() => Err(StochError::MixedSamplingModes),
            _ => Ok(()),
        }
    }

    fn discard_problem(&mut self) {
        self.problem = None;
        self.solution.clear();
        self.objective = None;
        self.status = if self.solver.is_some() {
            ModelStatus::SolverOnly
        } else {
            ModelStatus::Detached
        };
    }

    /// Make sure a tree exists and its probabilities sum to one. With random
    /// variables the tree is rebuilt when `resample` is set or when the
    /// variables changed since the last build.
    fn prepare_tree(&mut self, resample: bool) -> StochResult<()> {
        if !self.variables.is_empty() && (resample || !self.tree_current) {
            self.rebuild_tree()?;
        }
        if self.tree.is_empty() {
            return Err(StochError::InvalidInput {
                context: "model has no scenarios".to_string(),
            });
        }
        self.tree.check_probability(self.options.probability_tol)
    }

    fn rebuild_tree(&mut self) -> StochResult<()> {
        let stages = self.core.stages();
        let tol = self.options.probability_tol;
        let mode = sampling_mode(&self.variables)?;

        // stage-major, declaration order within a stage
        let mut order: Vec<usize> = (0..self.variables.len()).collect();
        order.sort_by_key(|&k| self.variables[k].stage);

        // sample-only fans take raw equiprobable draws
        let draw_only = self.options.sample_only && mode == Some(SamplingMode::Independent);
        let count = self.options.samples_per_variable;
        let mut samples: Vec<StageSamples> = Vec::new();
        for &k in &order {
            let var = &self.variables[k];
            let outcomes = if draw_only {
                draw_samples(var, count, tol, &mut self.rng)?
            } else {
                sample(var, count, tol, &mut self.rng)?
            };
            match samples.last_mut() {
                Some(s) if s.stage == var.stage => s.variables.push(outcomes),
                _ => samples.push(StageSamples {
                    stage: var.stage,
                    variables: vec![outcomes],
                }),
            }
        }

        let fan = match mode {
            Some(SamplingMode::Scenario) => build_scenario_fan(&samples, tol)?,
            _ => build_fan(&samples, self.options.sample_only, tol)?,
        };
        debug!(
            "sampled {} random variables into a fan of {} paths",
            self.variables.len(),
            fan.len()
        );

        let paths: Vec<(Vec<StageOverride>, f64)> = fan
            .into_iter()
            .map(|entry| {
                let mut path: Vec<StageOverride> = (0..stages).map(StageOverride::new).collect();
                for (&k, &value) in order.iter().zip(&entry.values) {
                    let var = &self.variables[k];
                    path[var.stage].set_target(var.target, value);
                }
                (path, entry.probability)
            })
            .collect();

        let specs = build_tree(&paths, tol)?;
        let tree = ScenarioTree::from_specs(&self.core, specs)?;
        debug!(
            "scenario tree: {} scenarios, {} nodes",
            tree.scenario_count(),
            tree.node_count()
        );
        self.tree = tree;
        self.tree_current = true;
        Ok(())
    }
}

fn strategy_of<'a>(
    strategy: &'a Option<Box<dyn CombineStrategy>>,
    rule: &'a CombineRule,
) -> &'a dyn CombineStrategy {
    match strategy {
        Some(s) => s.as_ref(),
        None => rule,
    }
}

fn load_problem<S: SolverAdapter>(
    solver: &mut S,
    problem: &AssembledProblem,
    sense: ObjectiveSense,
) -> SolverResult<()> {
    let matrix = problem.csr();
    solver.load(&LpProblem {
        matrix: &matrix,
        objective: &problem.objective,
        col_lower: &problem.col_lower,
        col_upper: &problem.col_upper,
        row_lower: &problem.row_lower,
        row_upper: &problem.row_upper,
    })?;
    solver.set_integer(&problem.integer_columns())?;
    solver.set_objective_sense(sense);
    Ok(())
}

/// Solve whatever is loaded, relaxing integrality once if the integer solve
/// fails.
fn run_solver<S: SolverAdapter>(solver: &mut S) -> SolverResult<SolveStatus> {
    match solver.solve() {
        Err(e) if solver.integer_count() > 0 => {
            warn!("integer solve failed ({}), retrying the continuous relaxation", e);
            solver.set_integer(&[])?;
            solver.solve()
        }
        result => result,
    }
}

pub(crate) fn solve_problem<S: SolverAdapter>(
    solver: &mut S,
    problem: &AssembledProblem,
    sense: ObjectiveSense,
) -> Result<Solved, SolverError> {
    load_problem(solver, problem, sense)?;
    let status = run_solver(solver)?;
    let (objective, solution) = if status == SolveStatus::Optimal {
        (solver.objective_value(), solver.column_solution().to_vec())
    } else {
        (f64::NAN, Vec::new())
    };
    Ok(Solved {
        status,
        objective,
        solution,
    })
}
