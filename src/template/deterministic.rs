//! Flat deterministic model snapshot.
//!
//! This is the hand-off format from whatever builds the algebraic model: plain
//! bound/objective arrays, a coordinate list of matrix coefficients, and one
//! stage label per column and per row.

use crate::error::{StochError, StochResult};

/// Integrality of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColumnKind {
    #[default]
    Continuous,
    Integer,
    Binary,
}

/// A deterministic model with stage labels, in the producer's column/row order.
#[derive(Debug, Clone, Default)]
pub struct DeterministicModel {
    pub col_lower: Vec<f64>,
    pub col_upper: Vec<f64>,
    pub objective: Vec<f64>,
    pub col_kind: Vec<ColumnKind>,
    pub col_stage: Vec<usize>,
    pub row_lower: Vec<f64>,
    pub row_upper: Vec<f64>,
    pub row_stage: Vec<usize>,
    /// Coefficients as (row, column, value); duplicates are summed.
    pub entries: Vec<(usize, usize, f64)>,
}

impl DeterministicModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn num_columns(&self) -> usize {
        self.col_lower.len()
    }

    pub fn num_rows(&self) -> usize {
        self.row_lower.len()
    }

    /// Add a continuous column and return its index.
    pub fn add_column(&mut self, lower: f64, upper: f64, objective: f64, stage: usize) -> usize {
        self.push_column(lower, upper, objective, stage, ColumnKind::Continuous)
    }

    /// Add a general integer column and return its index.
    pub fn add_integer_column(
        &mut self,
        lower: f64,
        upper: f64,
        objective: f64,
        stage: usize,
    ) -> usize {
        self.push_column(lower, upper, objective, stage, ColumnKind::Integer)
    }

    /// Add a binary column (bounds [0, 1]) and return its index.
    pub fn add_binary_column(&mut self, objective: f64, stage: usize) -> usize {
        self.push_column(0.0, 1.0, objective, stage, ColumnKind::Binary)
    }

    /// Add a row `lower <= a·x <= upper` and return its index.
    pub fn add_row(&mut self, lower: f64, upper: f64, stage: usize) -> usize {
        self.row_lower.push(lower);
        self.row_upper.push(upper);
        self.row_stage.push(stage);
        self.row_lower.len() - 1
    }

    /// Add `value` to coefficient (row, col).
    pub fn add_coefficient(&mut self, row: usize, col: usize, value: f64) {
        self.entries.push((row, col, value));
    }

    /// Number of stages implied by the stage labels.
    pub fn implied_stages(&self) -> usize {
        let cols = self.col_stage.iter().copied().max();
        let rows = self.row_stage.iter().copied().max();
        cols.max(rows).map_or(1, |s| s + 1)
    }

    /// Check that all per-column and per-row arrays agree in length and that
    /// every coefficient addresses an existing row and column.
    pub fn validate(&self) -> StochResult<()> {
        let n = self.num_columns();
        let m = self.num_rows();
        let col_arrays = [
            ("col_upper", self.col_upper.len()),
            ("objective", self.objective.len()),
            ("col_kind", self.col_kind.len()),
            ("col_stage", self.col_stage.len()),
        ];
        for (name, len) in col_arrays {
            if len != n {
                return Err(StochError::InvalidInput {
                    context: format!("{} has {} entries, expected {}", name, len, n),
                });
            }
        }
        let row_arrays = [
            ("row_upper", self.row_upper.len()),
            ("row_stage", self.row_stage.len()),
        ];
        for (name, len) in row_arrays {
            if len != m {
                return Err(StochError::InvalidInput {
                    context: format!("{} has {} entries, expected {}", name, len, m),
                });
            }
        }
        for &(row, col, _) in &self.entries {
            if row >= m || col >= n {
                return Err(StochError::InvalidInput {
                    context: format!(
                        "coefficient ({}, {}) outside a {}x{} model",
                        row, col, m, n
                    ),
                });
            }
        }
        Ok(())
    }

    fn push_column(
        &mut self,
        lower: f64,
        upper: f64,
        objective: f64,
        stage: usize,
        kind: ColumnKind,
    ) -> usize {
        self.col_lower.push(lower);
        self.col_upper.push(upper);
        self.objective.push(objective);
        self.col_kind.push(kind);
        self.col_stage.push(stage);
        self.col_lower.len() - 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_and_validate() {
        let mut m = DeterministicModel::new();
        let x = m.add_column(0.0, 10.0, 1.0, 0);
        let y = m.add_binary_column(2.0, 1);
        let r = m.add_row(f64::NEG_INFINITY, 5.0, 1);
        m.add_coefficient(r, x, 1.0);
        m.add_coefficient(r, y, 3.0);

        assert_eq!(m.num_columns(), 2);
        assert_eq!(m.num_rows(), 1);
        assert_eq!(m.implied_stages(), 2);
        assert_eq!(m.col_kind[y], ColumnKind::Binary);
        assert!(m.validate().is_ok());

        m.add_coefficient(3, x, 1.0);
        assert!(m.validate().is_err());
    }
}
