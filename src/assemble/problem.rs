//! Flat LP/MIP arrays produced by assembly.

use log::warn;
use sprs::{CsMat, TriMat};

use crate::template::{CoreTemplate, StageData};

/// A flat LP/MIP in row-bound form: `row_lower <= A x <= row_upper`,
/// `col_lower <= x <= col_upper`, objective `c·x`.
///
/// Columns and rows are grouped by stage.
#[derive(Debug)]
pub struct AssembledProblem {
    pub matrix: TriMat<f64>,
    pub col_lower: Vec<f64>,
    pub col_upper: Vec<f64>,
    pub objective: Vec<f64>,
    pub row_lower: Vec<f64>,
    pub row_upper: Vec<f64>,
    pub integers: Vec<usize>,
    pub binaries: Vec<usize>,
    pub col_stage: Vec<usize>,
    pub row_stage: Vec<usize>,
}

// `TriMat` does not implement `Clone`; rebuild it from its triplets.
impl Clone for AssembledProblem {
    fn clone(&self) -> Self {
        Self {
            matrix: TriMat::from_triplets(
                self.matrix.shape(),
                self.matrix.row_inds().to_vec(),
                self.matrix.col_inds().to_vec(),
                self.matrix.data().to_vec(),
            ),
            col_lower: self.col_lower.clone(),
            col_upper: self.col_upper.clone(),
            objective: self.objective.clone(),
            row_lower: self.row_lower.clone(),
            row_upper: self.row_upper.clone(),
            integers: self.integers.clone(),
            binaries: self.binaries.clone(),
            col_stage: self.col_stage.clone(),
            row_stage: self.row_stage.clone(),
        }
    }
}

impl AssembledProblem {
    pub fn num_columns(&self) -> usize {
        self.col_lower.len()
    }

    pub fn num_rows(&self) -> usize {
        self.row_lower.len()
    }

    pub fn nnz(&self) -> usize {
        self.matrix.nnz()
    }

    /// Compressed row form of the constraint matrix.
    pub fn csr(&self) -> CsMat<f64> {
        self.matrix.to_csr()
    }

    /// Coefficient (row, col) of the constraint matrix.
    pub fn coefficient(&self, row: usize, col: usize) -> f64 {
        self.matrix
            .row_inds()
            .iter()
            .zip(self.matrix.col_inds())
            .zip(self.matrix.data())
            .filter(|&((&r, &c), _)| r == row && c == col)
            .map(|(_, &v)| v)
            .sum()
    }

    /// All integer-constrained columns (general integers and binaries), sorted.
    pub fn integer_columns(&self) -> Vec<usize> {
        let mut cols: Vec<usize> = self.integers.iter().chain(&self.binaries).copied().collect();
        cols.sort_unstable();
        cols
    }

    pub fn has_integers(&self) -> bool {
        !self.integers.is_empty() || !self.binaries.is_empty()
    }
}

/// Incremental builder shared by every assembly variant.
pub(crate) struct ProblemBuilder {
    rows: Vec<usize>,
    cols: Vec<usize>,
    vals: Vec<f64>,
    col_lower: Vec<f64>,
    col_upper: Vec<f64>,
    objective: Vec<f64>,
    row_lower: Vec<f64>,
    row_upper: Vec<f64>,
    integers: Vec<usize>,
    binaries: Vec<usize>,
    col_stage: Vec<usize>,
    row_stage: Vec<usize>,
    dropped: usize,
}

impl ProblemBuilder {
    pub(crate) fn new() -> Self {
        Self {
            rows: Vec::new(),
            cols: Vec::new(),
            vals: Vec::new(),
            col_lower: Vec::new(),
            col_upper: Vec::new(),
            objective: Vec::new(),
            row_lower: Vec::new(),
            row_upper: Vec::new(),
            integers: Vec::new(),
            binaries: Vec::new(),
            col_stage: Vec::new(),
            row_stage: Vec::new(),
            dropped: 0,
        }
    }

    pub(crate) fn next_column(&self) -> usize {
        self.col_lower.len()
    }

    pub(crate) fn next_row(&self) -> usize {
        self.row_lower.len()
    }

    /// Append one node's stage block and return its (column, row) offsets.
    ///
    /// `ancestor_offset(s)` gives the column offset of the node at stage
    /// `s < data.stage` on the current path, `None` when that node is
    /// virtual. Coefficients referencing a virtual ancestor are dropped.
    pub(crate) fn place<F>(
        &mut self,
        core: &CoreTemplate,
        data: StageData,
        weight: f64,
        ancestor_offset: F,
    ) -> (usize, usize)
    where
        F: Fn(usize) -> Option<usize>,
    {
        let stage = data.stage;
        let col_offset = self.next_column();
        let row_offset = self.next_row();
        let cols = core.columns(stage);

        self.col_lower.extend_from_slice(&data.col_lower);
        self.col_upper.extend_from_slice(&data.col_upper);
        self.objective
            .extend(data.objective.iter().map(|&c| c * weight));
        self.col_stage.extend(std::iter::repeat_n(stage, cols.len()));
        self.integers.extend(
            core.integers(stage)
                .iter()
                .map(|&c| col_offset + (c - cols.start)),
        );
        self.binaries.extend(
            core.binaries(stage)
                .iter()
                .map(|&c| col_offset + (c - cols.start)),
        );

        self.row_lower.extend_from_slice(&data.row_lower);
        self.row_upper.extend_from_slice(&data.row_upper);
        self.row_stage
            .extend(std::iter::repeat_n(stage, data.rows.len()));

        for (k, row) in data.rows.iter().enumerate() {
            let global_row = row_offset + k;
            for (c, v) in row.iter() {
                let owner = core.column_stage(c);
                let offset = if owner == stage {
                    Some(col_offset)
                } else {
                    ancestor_offset(owner)
                };
                match offset {
                    Some(offset) => {
                        self.rows.push(global_row);
                        self.cols.push(offset + (c - core.columns(owner).start));
                        self.vals.push(v);
                    }
                    None => {
                        warn!(
                            "dropping coefficient of column {} (stage {}) in row {}: ancestor is virtual",
                            c, owner, global_row
                        );
                        self.dropped += 1;
                    }
                }
            }
        }
        (col_offset, row_offset)
    }

    /// Pin the columns `offset..offset + values.len()` to `values`.
    pub(crate) fn fix_columns(&mut self, offset: usize, values: &[f64]) {
        for (k, &v) in values.iter().enumerate() {
            self.col_lower[offset + k] = v;
            self.col_upper[offset + k] = v;
        }
    }

    pub(crate) fn dropped(&self) -> usize {
        self.dropped
    }

    pub(crate) fn finish(self) -> AssembledProblem {
        let shape = (self.row_lower.len(), self.col_lower.len());
        AssembledProblem {
            matrix: TriMat::from_triplets(shape, self.rows, self.cols, self.vals),
            col_lower: self.col_lower,
            col_upper: self.col_upper,
            objective: self.objective,
            row_lower: self.row_lower,
            row_upper: self.row_upper,
            integers: self.integers,
            binaries: self.binaries,
            col_stage: self.col_stage,
            row_stage: self.row_stage,
        }
    }
}
