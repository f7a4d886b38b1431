//! Stage-partitioned core template.

use std::collections::BTreeMap;
use std::ops::Range;

use crate::error::{IndexKind, StochError, StochResult};

use super::deterministic::{ColumnKind, DeterministicModel};

/// Comparison sense of a row, derived from its bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowSense {
    /// `a·x <= upper`
    LessEqual,
    /// `a·x >= lower`
    GreaterEqual,
    /// `a·x == lower == upper`
    Equal,
    /// `lower <= a·x <= upper` with both finite
    Ranged,
    /// No finite bound.
    Free,
}

impl RowSense {
    pub fn from_bounds(lower: f64, upper: f64) -> Self {
        match (lower.is_finite(), upper.is_finite()) {
            (true, true) if lower == upper => Self::Equal,
            (true, true) => Self::Ranged,
            (false, true) => Self::LessEqual,
            (true, false) => Self::GreaterEqual,
            (false, false) => Self::Free,
        }
    }
}

/// A sparse matrix row with ascending column indices.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SparseRow {
    pub indices: Vec<usize>,
    pub values: Vec<f64>,
}

impl SparseRow {
    pub fn nnz(&self) -> usize {
        self.indices.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.indices.iter().copied().zip(self.values.iter().copied())
    }

    /// Coefficient at `col`, zero if absent.
    pub fn get(&self, col: usize) -> f64 {
        match self.indices.binary_search(&col) {
            Ok(pos) => self.values[pos],
            Err(_) => 0.0,
        }
    }
}

/// Immutable, stage-partitioned prototype of a multi-stage model.
///
/// Columns and rows are stored in *core order*: stable-sorted by stage so that
/// each stage owns a contiguous range. The permutation from the producer's
/// order is kept so callers can translate indices in both directions.
///
/// Rows and columns that nothing references keep their slot. An unused column
/// still receives an offset and bounds in every assembled problem; an empty row
/// is emitted with its bounds and no coefficients.
#[derive(Debug, Clone)]
pub struct CoreTemplate {
    stages: usize,
    col_start: Vec<usize>,
    row_start: Vec<usize>,
    col_lower: Vec<f64>,
    col_upper: Vec<f64>,
    objective: Vec<f64>,
    col_kind: Vec<ColumnKind>,
    col_stage: Vec<usize>,
    row_lower: Vec<f64>,
    row_upper: Vec<f64>,
    row_stage: Vec<usize>,
    rows: Vec<SparseRow>,
    col_position: Vec<usize>,
    col_original: Vec<usize>,
    row_position: Vec<usize>,
    row_original: Vec<usize>,
    integers: Vec<Vec<usize>>,
    binaries: Vec<Vec<usize>>,
}

impl CoreTemplate {
    /// Build the template from a flat model with `stages` stages.
    pub fn from_deterministic(model: &DeterministicModel, stages: usize) -> StochResult<Self> {
        model.validate()?;
        if stages == 0 {
            return Err(StochError::InvalidInput {
                context: "a model needs at least one stage".to_string(),
            });
        }
        for (j, &s) in model.col_stage.iter().enumerate() {
            if s >= stages {
                return Err(StochError::IndexOutOfStage {
                    kind: IndexKind::Column,
                    index: j,
                    stage: s,
                    context: format!("stage label beyond {} stages", stages),
                });
            }
        }
        for (i, &s) in model.row_stage.iter().enumerate() {
            if s >= stages {
                return Err(StochError::IndexOutOfStage {
                    kind: IndexKind::Row,
                    index: i,
                    stage: s,
                    context: format!("stage label beyond {} stages", stages),
                });
            }
        }

        let (col_original, col_position, col_start) = stage_permutation(&model.col_stage, stages);
        let (row_original, row_position, row_start) = stage_permutation(&model.row_stage, stages);

        let mut accum: Vec<BTreeMap<usize, f64>> = vec![BTreeMap::new(); model.num_rows()];
        for &(row, col, value) in &model.entries {
            if model.col_stage[col] > model.row_stage[row] {
                return Err(StochError::IndexOutOfStage {
                    kind: IndexKind::Column,
                    index: col,
                    stage: model.row_stage[row],
                    context: format!("row {} references a later-stage column", row),
                });
            }
            *accum[row_position[row]]
                .entry(col_position[col])
                .or_insert(0.0) += value;
        }
        let rows: Vec<SparseRow> = accum
            .into_iter()
            .map(|entries| {
                let (indices, values) = entries.into_iter().filter(|&(_, v)| v != 0.0).unzip();
                SparseRow { indices, values }
            })
            .collect();

        let permute =
            |src: &[f64], order: &[usize]| -> Vec<f64> { order.iter().map(|&k| src[k]).collect() };
        let col_kind: Vec<ColumnKind> = col_original.iter().map(|&k| model.col_kind[k]).collect();
        let col_stage: Vec<usize> = col_original.iter().map(|&k| model.col_stage[k]).collect();
        let row_stage: Vec<usize> = row_original.iter().map(|&k| model.row_stage[k]).collect();

        let mut integers = vec![Vec::new(); stages];
        let mut binaries = vec![Vec::new(); stages];
        for (j, kind) in col_kind.iter().enumerate() {
            match kind {
                ColumnKind::Integer => integers[col_stage[j]].push(j),
                ColumnKind::Binary => binaries[col_stage[j]].push(j),
                ColumnKind::Continuous => {}
            }
        }

        Ok(Self {
            stages,
            col_start,
            row_start,
            col_lower: permute(&model.col_lower, &col_original),
            col_upper: permute(&model.col_upper, &col_original),
            objective: permute(&model.objective, &col_original),
            col_kind,
            col_stage,
            row_lower: permute(&model.row_lower, &row_original),
            row_upper: permute(&model.row_upper, &row_original),
            row_stage,
            rows,
            col_position,
            col_original,
            row_position,
            row_original,
            integers,
            binaries,
        })
    }

    pub fn stages(&self) -> usize {
        self.stages
    }

    pub fn num_columns(&self) -> usize {
        self.col_lower.len()
    }

    pub fn num_rows(&self) -> usize {
        self.row_lower.len()
    }

    /// Core column range of `stage`.
    pub fn columns(&self, stage: usize) -> Range<usize> {
        self.col_start[stage]..self.col_start[stage + 1]
    }

    /// Core row range of `stage`.
    pub fn rows(&self, stage: usize) -> Range<usize> {
        self.row_start[stage]..self.row_start[stage + 1]
    }

    /// Number of core columns in stages `0..=stage`.
    pub fn columns_through(&self, stage: usize) -> usize {
        self.col_start[stage + 1]
    }

    pub fn column_stage(&self, col: usize) -> usize {
        self.col_stage[col]
    }

    pub fn row_stage(&self, row: usize) -> usize {
        self.row_stage[row]
    }

    pub fn col_lower(&self) -> &[f64] {
        &self.col_lower
    }

    pub fn col_upper(&self) -> &[f64] {
        &self.col_upper
    }

    pub fn objective(&self) -> &[f64] {
        &self.objective
    }

    pub fn col_kind(&self) -> &[ColumnKind] {
        &self.col_kind
    }

    pub fn row_lower(&self) -> &[f64] {
        &self.row_lower
    }

    pub fn row_upper(&self) -> &[f64] {
        &self.row_upper
    }

    pub fn row(&self, row: usize) -> &SparseRow {
        &self.rows[row]
    }

    pub fn row_sense(&self, row: usize) -> RowSense {
        RowSense::from_bounds(self.row_lower[row], self.row_upper[row])
    }

    /// Core index of a column given in producer order.
    pub fn col_position(&self, original: usize) -> Option<usize> {
        self.col_position.get(original).copied()
    }

    /// Core index of a row given in producer order.
    pub fn row_position(&self, original: usize) -> Option<usize> {
        self.row_position.get(original).copied()
    }

    /// Producer-order index of a core column.
    pub fn col_original(&self, col: usize) -> Option<usize> {
        self.col_original.get(col).copied()
    }

    /// Producer-order index of a core row.
    pub fn row_original(&self, row: usize) -> Option<usize> {
        self.row_original.get(row).copied()
    }

    /// Integer (non-binary) core columns of `stage`.
    pub fn integers(&self, stage: usize) -> &[usize] {
        &self.integers[stage]
    }

    /// Binary core columns of `stage`.
    pub fn binaries(&self, stage: usize) -> &[usize] {
        &self.binaries[stage]
    }

    pub fn has_integers(&self) -> bool {
        self.integers.iter().chain(&self.binaries).any(|l| !l.is_empty())
    }
}

/// Stable sort of indices by stage. Returns (core -> original,
/// original -> core, stage start offsets).
fn stage_permutation(stage_of: &[usize], stages: usize) -> (Vec<usize>, Vec<usize>, Vec<usize>) {
    let mut order: Vec<usize> = (0..stage_of.len()).collect();
    order.sort_by_key(|&k| stage_of[k]);

    let mut position = vec![0; stage_of.len()];
    for (core, &orig) in order.iter().enumerate() {
        position[orig] = core;
    }

    let mut start = vec![0; stages + 1];
    for &s in stage_of {
        start[s + 1] += 1;
    }
    for s in 0..stages {
        start[s + 1] += start[s];
    }
    (order, position, start)
}
