//! Merging a stage override into the core template.

use crate::error::{IndexKind, StochError, StochResult};

use super::core_template::{CoreTemplate, RowSense, SparseRow};
use super::overrides::StageOverride;

/// Policy for merging an override value into a template value.
pub trait CombineStrategy {
    /// Combined value for a slot the override mentions.
    fn apply(&self, template: f64, value: f64) -> f64;
}

/// Built-in combine rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CombineRule {
    /// Override values replace template values.
    #[default]
    Replace,
    /// Override values are added onto template values.
    Add,
}

impl CombineStrategy for CombineRule {
    fn apply(&self, template: f64, value: f64) -> f64 {
        match self {
            Self::Replace => value,
            Self::Add => template + value,
        }
    }
}

/// Fully resolved data for one stage of one node.
///
/// Vectors are indexed relative to the stage's column and row ranges. Row
/// coefficients keep core column indices and may reference earlier stages.
#[derive(Debug, Clone, PartialEq)]
pub struct StageData {
    pub stage: usize,
    pub col_lower: Vec<f64>,
    pub col_upper: Vec<f64>,
    pub objective: Vec<f64>,
    pub row_lower: Vec<f64>,
    pub row_upper: Vec<f64>,
    pub rows: Vec<SparseRow>,
}

/// Resolve `stage` of `core` under an optional override.
pub fn combine(
    core: &CoreTemplate,
    stage: usize,
    patch: Option<&StageOverride>,
    strategy: &dyn CombineStrategy,
) -> StochResult<StageData> {
    if stage >= core.stages() {
        return Err(StochError::BranchStageOutOfRange {
            stage,
            stages: core.stages(),
        });
    }
    let cols = core.columns(stage);
    let rows = core.rows(stage);

    let mut data = StageData {
        stage,
        col_lower: core.col_lower()[cols.clone()].to_vec(),
        col_upper: core.col_upper()[cols.clone()].to_vec(),
        objective: core.objective()[cols.clone()].to_vec(),
        row_lower: core.row_lower()[rows.clone()].to_vec(),
        row_upper: core.row_upper()[rows.clone()].to_vec(),
        rows: Vec::with_capacity(rows.len()),
    };

    let patch = match patch {
        Some(p) if !p.is_empty() => p,
        _ => {
            data.rows.extend(rows.map(|r| core.row(r).clone()));
            return Ok(data);
        }
    };
    if patch.stage() != stage {
        return Err(StochError::InvalidInput {
            context: format!(
                "override for stage {} applied to stage {}",
                patch.stage(),
                stage
            ),
        });
    }
    patch.validate(core)?;

    let apply_cols = |target: &mut [f64], entries: &[(usize, f64)]| {
        for &(col, value) in entries {
            let slot = &mut target[col - cols.start];
            *slot = strategy.apply(*slot, value);
        }
    };
    apply_cols(&mut data.col_lower, patch.col_lower());
    apply_cols(&mut data.col_upper, patch.col_upper());
    apply_cols(&mut data.objective, patch.objective());

    for &(row, value) in patch.row_lower() {
        let slot = &mut data.row_lower[row - rows.start];
        *slot = strategy.apply(*slot, value);
    }
    for &(row, value) in patch.row_upper() {
        let slot = &mut data.row_upper[row - rows.start];
        *slot = strategy.apply(*slot, value);
    }
    for &(row, value) in patch.rhs() {
        let local = row - rows.start;
        route_rhs(
            core.row_sense(row),
            row,
            &mut data.row_lower[local],
            &mut data.row_upper[local],
            value,
            strategy,
        )?;
    }

    // One dense buffer for the whole call, reset through the touched list.
    let width = core.columns_through(stage);
    let mut dense = vec![0.0; width];
    let mut marked = vec![false; width];
    let mut touched: Vec<usize> = Vec::new();

    for row in rows {
        let entries = patch.matrix_row(row);
        let template = core.row(row);
        if entries.is_empty() {
            data.rows.push(template.clone());
            continue;
        }

        for (col, value) in template.iter() {
            dense[col] = value;
            marked[col] = true;
            touched.push(col);
        }
        for &((_, col), value) in entries {
            if col >= width {
                return Err(StochError::IndexOutOfStage {
                    kind: IndexKind::Column,
                    index: col,
                    stage,
                    context: "matrix override".to_string(),
                });
            }
            dense[col] = strategy.apply(dense[col], value);
            if !marked[col] {
                marked[col] = true;
                touched.push(col);
            }
        }

        touched.sort_unstable();
        let mut merged = SparseRow::default();
        for &col in &touched {
            if dense[col] != 0.0 {
                merged.indices.push(col);
                merged.values.push(dense[col]);
            }
            dense[col] = 0.0;
            marked[col] = false;
        }
        touched.clear();
        data.rows.push(merged);
    }

    Ok(data)
}

fn route_rhs(
    sense: RowSense,
    row: usize,
    lower: &mut f64,
    upper: &mut f64,
    value: f64,
    strategy: &dyn CombineStrategy,
) -> StochResult<()> {
    match sense {
        RowSense::LessEqual => *upper = strategy.apply(*upper, value),
        RowSense::GreaterEqual => *lower = strategy.apply(*lower, value),
        RowSense::Equal => {
            let rhs = strategy.apply(*upper, value);
            *lower = rhs;
            *upper = rhs;
        }
        RowSense::Ranged => {
            let width = *upper - *lower;
            *upper = strategy.apply(*upper, value);
            *lower = *upper - width;
        }
        RowSense::Free => return Err(StochError::InvalidRowSense { row }),
    }
    Ok(())
}
