//! Single-path submodels: one scenario, or the core template alone.

use crate::error::{StochError, StochResult};
use crate::template::{CombineRule, CombineStrategy, CoreTemplate, combine};
use crate::tree::{NodeId, ScenarioTree};

use super::problem::{AssembledProblem, ProblemBuilder};

/// Values pinning every column of one stage (lower = upper = value).
#[derive(Debug, Clone, PartialEq)]
pub struct FixedColumns {
    pub stage: usize,
    pub values: Vec<f64>,
}

impl FixedColumns {
    pub fn new(stage: usize, values: Vec<f64>) -> Self {
        Self { stage, values }
    }
}

/// A single root-to-leaf path assembled with probability one.
#[derive(Debug, Clone)]
pub struct ScenarioSubmodel {
    pub problem: AssembledProblem,
    /// Scenario index, `None` for the core template.
    pub scenario: Option<usize>,
    pub path: Vec<NodeId>,
    /// Column offset per stage, `None` where the path node is virtual.
    pub col_offsets: Vec<Option<usize>>,
    pub row_offsets: Vec<Option<usize>>,
}

impl ScenarioSubmodel {
    /// Slice of `solution` owned by `stage`; empty for a virtual stage.
    pub fn stage_solution<'a>(
        &self,
        core: &CoreTemplate,
        solution: &'a [f64],
        stage: usize,
    ) -> StochResult<&'a [f64]> {
        let offset = self
            .col_offsets
            .get(stage)
            .ok_or_else(|| StochError::NavigationOutOfRange {
                context: format!("stage {} of a {}-stage submodel", stage, self.col_offsets.len()),
            })?;
        let Some(start) = *offset else {
            return Ok(&[]);
        };
        let end = start + core.columns(stage).len();
        solution
            .get(start..end)
            .ok_or_else(|| StochError::NavigationOutOfRange {
                context: format!(
                    "columns {}..{} outside a solution of length {}",
                    start,
                    end,
                    solution.len()
                ),
            })
    }

    /// Concatenated decision vector in template order.
    pub fn column_solution(&self, core: &CoreTemplate, solution: &[f64]) -> StochResult<Vec<f64>> {
        let mut values = Vec::with_capacity(solution.len());
        for stage in 0..self.col_offsets.len() {
            values.extend_from_slice(self.stage_solution(core, solution, stage)?);
        }
        Ok(values)
    }
}

fn check_fixed(core: &CoreTemplate, fixed: Option<&FixedColumns>) -> StochResult<()> {
    if let Some(f) = fixed {
        if f.stage >= core.stages() || f.values.len() != core.columns(f.stage).len() {
            return Err(StochError::InvalidInput {
                context: format!(
                    "{} fixed values for stage {}",
                    f.values.len(),
                    f.stage
                ),
            });
        }
    }
    Ok(())
}

/// Assemble the path of `scenario` as a standalone model with probability one.
///
/// `fixed`, when given, pins the columns of its stage. A fixation on a
/// virtual stage has no effect.
pub fn assemble_scenario(
    core: &CoreTemplate,
    tree: &ScenarioTree,
    scenario: usize,
    strategy: &dyn CombineStrategy,
    fixed: Option<&FixedColumns>,
) -> StochResult<ScenarioSubmodel> {
    check_fixed(core, fixed)?;
    let path = tree.path(scenario)?;

    let mut builder = ProblemBuilder::new();
    let mut col_offsets = Vec::with_capacity(path.len());
    let mut row_offsets = Vec::with_capacity(path.len());
    for &id in &path {
        let stage = tree.node(id)?.stage();
        match tree.override_of(id)? {
            None => {
                col_offsets.push(None);
                row_offsets.push(None);
            }
            Some(patch) => {
                let data = combine(core, stage, Some(patch), strategy)?;
                let (col, row) = builder.place(core, data, 1.0, |s| col_offsets[s]);
                col_offsets.push(Some(col));
                row_offsets.push(Some(row));
            }
        }
    }
    apply_fixed(&mut builder, &col_offsets, fixed);

    Ok(ScenarioSubmodel {
        problem: builder.finish(),
        scenario: Some(scenario),
        path,
        col_offsets,
        row_offsets,
    })
}

/// Assemble the core template alone, one block per stage, ignoring every
/// override.
pub fn assemble_core(
    core: &CoreTemplate,
    fixed: Option<&FixedColumns>,
) -> StochResult<ScenarioSubmodel> {
    check_fixed(core, fixed)?;
    let mut builder = ProblemBuilder::new();
    let mut col_offsets = Vec::with_capacity(core.stages());
    let mut row_offsets = Vec::with_capacity(core.stages());
    for stage in 0..core.stages() {
        let data = combine(core, stage, None, &CombineRule::Replace)?;
        let (col, row) = builder.place(core, data, 1.0, |s| col_offsets[s]);
        col_offsets.push(Some(col));
        row_offsets.push(Some(row));
    }
    apply_fixed(&mut builder, &col_offsets, fixed);

    Ok(ScenarioSubmodel {
        problem: builder.finish(),
        scenario: None,
        path: Vec::new(),
        col_offsets,
        row_offsets,
    })
}

fn apply_fixed(
    builder: &mut ProblemBuilder,
    col_offsets: &[Option<usize>],
    fixed: Option<&FixedColumns>,
) {
    if let Some(f) = fixed {
        if let Some(offset) = col_offsets[f.stage] {
            builder.fix_columns(offset, &f.values);
        }
    }
}
