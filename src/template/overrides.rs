//! Sparse per-stage patches to the core template.

use std::hash::{Hash, Hasher};

use crate::error::{IndexKind, StochError, StochResult};

use super::core_template::CoreTemplate;

/// A single coefficient slot of the core template, in core indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CoefficientTarget {
    Matrix { row: usize, col: usize },
    Rhs { row: usize },
    Objective { col: usize },
    ColumnLower { col: usize },
    ColumnUpper { col: usize },
}

impl CoefficientTarget {
    /// Stage owning this slot: the row's stage for row-based targets, the
    /// column's stage otherwise.
    pub fn stage(&self, core: &CoreTemplate) -> StochResult<usize> {
        match *self {
            Self::Matrix { row, .. } | Self::Rhs { row } => {
                check_index(IndexKind::Row, row, core.num_rows())?;
                Ok(core.row_stage(row))
            }
            Self::Objective { col } | Self::ColumnLower { col } | Self::ColumnUpper { col } => {
                check_index(IndexKind::Column, col, core.num_columns())?;
                Ok(core.column_stage(col))
            }
        }
    }

    /// Value the template holds for this slot. A right-hand side reads the
    /// finite bound of the row (upper first).
    pub fn template_value(&self, core: &CoreTemplate) -> StochResult<f64> {
        self.stage(core)?;
        Ok(match *self {
            Self::Matrix { row, col } => core.row(row).get(col),
            Self::Rhs { row } => {
                let upper = core.row_upper()[row];
                if upper.is_finite() {
                    upper
                } else {
                    core.row_lower()[row]
                }
            }
            Self::Objective { col } => core.objective()[col],
            Self::ColumnLower { col } => core.col_lower()[col],
            Self::ColumnUpper { col } => core.col_upper()[col],
        })
    }
}

fn check_index(kind: IndexKind, index: usize, len: usize) -> StochResult<()> {
    if index >= len {
        return Err(StochError::InvalidInput {
            context: format!("{} {} does not exist (template has {})", kind, index, len),
        });
    }
    Ok(())
}

/// Sparse patch for one stage of one tree node.
///
/// Entry lists are kept sorted by index with at most one entry per index; a
/// later `set_*` on the same slot replaces the earlier value. Two overrides are
/// equal exactly when their contents are bit-for-bit identical.
#[derive(Debug, Clone, Default)]
pub struct StageOverride {
    stage: usize,
    col_lower: Vec<(usize, f64)>,
    col_upper: Vec<(usize, f64)>,
    objective: Vec<(usize, f64)>,
    rhs: Vec<(usize, f64)>,
    row_lower: Vec<(usize, f64)>,
    row_upper: Vec<(usize, f64)>,
    matrix: Vec<((usize, usize), f64)>,
}

fn upsert<K: Ord + Copy>(list: &mut Vec<(K, f64)>, key: K, value: f64) {
    match list.binary_search_by(|(k, _)| k.cmp(&key)) {
        Ok(pos) => list[pos].1 = value,
        Err(pos) => list.insert(pos, (key, value)),
    }
}

fn bits_eq<K: PartialEq>(a: &[(K, f64)], b: &[(K, f64)]) -> bool {
    a.len() == b.len()
        && a
            .iter()
            .zip(b)
            .all(|((ka, va), (kb, vb))| ka == kb && va.to_bits() == vb.to_bits())
}

fn bits_hash<K: Hash, H: Hasher>(list: &[(K, f64)], state: &mut H) {
    list.len().hash(state);
    for (k, v) in list {
        k.hash(state);
        v.to_bits().hash(state);
    }
}

impl StageOverride {
    pub fn new(stage: usize) -> Self {
        Self {
            stage,
            ..Self::default()
        }
    }

    pub fn stage(&self) -> usize {
        self.stage
    }

    pub fn is_empty(&self) -> bool {
        self.col_lower.is_empty()
            && self.col_upper.is_empty()
            && self.objective.is_empty()
            && self.rhs.is_empty()
            && self.row_lower.is_empty()
            && self.row_upper.is_empty()
            && self.matrix.is_empty()
    }

    pub fn set_col_lower(&mut self, col: usize, value: f64) -> &mut Self {
        upsert(&mut self.col_lower, col, value);
        self
    }

    pub fn set_col_upper(&mut self, col: usize, value: f64) -> &mut Self {
        upsert(&mut self.col_upper, col, value);
        self
    }

    pub fn set_objective(&mut self, col: usize, value: f64) -> &mut Self {
        upsert(&mut self.objective, col, value);
        self
    }

    /// Right-hand side, routed to a bound by the row's sense when combined.
    pub fn set_rhs(&mut self, row: usize, value: f64) -> &mut Self {
        upsert(&mut self.rhs, row, value);
        self
    }

    pub fn set_row_lower(&mut self, row: usize, value: f64) -> &mut Self {
        upsert(&mut self.row_lower, row, value);
        self
    }

    pub fn set_row_upper(&mut self, row: usize, value: f64) -> &mut Self {
        upsert(&mut self.row_upper, row, value);
        self
    }

    pub fn set_matrix(&mut self, row: usize, col: usize, value: f64) -> &mut Self {
        upsert(&mut self.matrix, (row, col), value);
        self
    }

    /// Set the slot named by `target`.
    pub fn set_target(&mut self, target: CoefficientTarget, value: f64) -> &mut Self {
        match target {
            CoefficientTarget::Matrix { row, col } => self.set_matrix(row, col, value),
            CoefficientTarget::Rhs { row } => self.set_rhs(row, value),
            CoefficientTarget::Objective { col } => self.set_objective(col, value),
            CoefficientTarget::ColumnLower { col } => self.set_col_lower(col, value),
            CoefficientTarget::ColumnUpper { col } => self.set_col_upper(col, value),
        }
    }

    pub fn col_lower(&self) -> &[(usize, f64)] {
        &self.col_lower
    }

    pub fn col_upper(&self) -> &[(usize, f64)] {
        &self.col_upper
    }

    pub fn objective(&self) -> &[(usize, f64)] {
        &self.objective
    }

    pub fn rhs(&self) -> &[(usize, f64)] {
        &self.rhs
    }

    pub fn row_lower(&self) -> &[(usize, f64)] {
        &self.row_lower
    }

    pub fn row_upper(&self) -> &[(usize, f64)] {
        &self.row_upper
    }

    /// Matrix entries sorted by (row, column).
    pub fn matrix(&self) -> &[((usize, usize), f64)] {
        &self.matrix
    }

    /// Matrix entries of `row`, sorted by column.
    pub fn matrix_row(&self, row: usize) -> &[((usize, usize), f64)] {
        let start = self.matrix.partition_point(|&((r, _), _)| r < row);
        let end = self.matrix.partition_point(|&((r, _), _)| r <= row);
        &self.matrix[start..end]
    }

    /// Check every index against the stage ranges of `core`.
    ///
    /// Column and row entries must lie in this override's stage. Matrix
    /// columns may lie in any stage up to the row's stage.
    pub fn validate(&self, core: &CoreTemplate) -> StochResult<()> {
        if self.stage >= core.stages() {
            return Err(StochError::BranchStageOutOfRange {
                stage: self.stage,
                stages: core.stages(),
            });
        }
        let cols = core.columns(self.stage);
        let rows = core.rows(self.stage);
        let out_of_stage = |kind, index, context: &str| StochError::IndexOutOfStage {
            kind,
            index,
            stage: self.stage,
            context: context.to_string(),
        };

        let col_lists = [
            ("column lower bound override", &self.col_lower),
            ("column upper bound override", &self.col_upper),
            ("objective override", &self.objective),
        ];
        for (context, list) in col_lists {
            if let Some(&(col, _)) = list.iter().find(|(c, _)| !cols.contains(c)) {
                return Err(out_of_stage(IndexKind::Column, col, context));
            }
        }
        let row_lists = [
            ("right-hand-side override", &self.rhs),
            ("row lower bound override", &self.row_lower),
            ("row upper bound override", &self.row_upper),
        ];
        for (context, list) in row_lists {
            if let Some(&(row, _)) = list.iter().find(|(r, _)| !rows.contains(r)) {
                return Err(out_of_stage(IndexKind::Row, row, context));
            }
        }
        let width = core.columns_through(self.stage);
        for &((row, col), _) in &self.matrix {
            if !rows.contains(&row) {
                return Err(out_of_stage(IndexKind::Row, row, "matrix override"));
            }
            if col >= width {
                return Err(out_of_stage(IndexKind::Column, col, "matrix override"));
            }
        }
        Ok(())
    }
}

impl PartialEq for StageOverride {
    fn eq(&self, other: &Self) -> bool {
        self.stage == other.stage
            && bits_eq(&self.col_lower, &other.col_lower)
            && bits_eq(&self.col_upper, &other.col_upper)
            && bits_eq(&self.objective, &other.objective)
            && bits_eq(&self.rhs, &other.rhs)
            && bits_eq(&self.row_lower, &other.row_lower)
            && bits_eq(&self.row_upper, &other.row_upper)
            && bits_eq(&self.matrix, &other.matrix)
    }
}

impl Eq for StageOverride {}

impl Hash for StageOverride {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.stage.hash(state);
        bits_hash(&self.col_lower, state);
        bits_hash(&self.col_upper, state);
        bits_hash(&self.objective, state);
        bits_hash(&self.rhs, state);
        bits_hash(&self.row_lower, state);
        bits_hash(&self.row_upper, state);
        bits_hash(&self.matrix, state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::DeterministicModel;
    use std::collections::HashSet;

    fn two_stage() -> CoreTemplate {
        let mut m = DeterministicModel::new();
        let x = m.add_column(0.0, 10.0, 1.0, 0);
        let y = m.add_column(0.0, 10.0, 1.0, 1);
        let r0 = m.add_row(f64::NEG_INFINITY, 8.0, 0);
        let r1 = m.add_row(2.0, f64::INFINITY, 1);
        m.add_coefficient(r0, x, 1.0);
        m.add_coefficient(r1, x, 1.0);
        m.add_coefficient(r1, y, 4.0);
        CoreTemplate::from_deterministic(&m, 2).unwrap()
    }

    #[test]
    fn test_canonical_equality() {
        let mut a = StageOverride::new(1);
        a.set_matrix(1, 1, 3.0).set_rhs(1, 5.0).set_matrix(1, 0, 2.0);
        let mut b = StageOverride::new(1);
        b.set_rhs(1, 7.0).set_matrix(1, 0, 2.0).set_matrix(1, 1, 3.0).set_rhs(1, 5.0);
        assert_eq!(a, b);

        let mut set = HashSet::new();
        set.insert(a.clone());
        assert!(set.contains(&b));

        b.set_rhs(1, 5.000000001);
        assert_ne!(a, b);
    }

    #[test]
    fn test_negative_zero_distinct() {
        let mut a = StageOverride::new(0);
        a.set_objective(0, 0.0);
        let mut b = StageOverride::new(0);
        b.set_objective(0, -0.0);
        assert_ne!(a, b);
    }

    #[test]
    fn test_matrix_row_slice() {
        let mut o = StageOverride::new(1);
        o.set_matrix(2, 0, 1.0).set_matrix(1, 1, 2.0).set_matrix(1, 0, 3.0);
        let row = o.matrix_row(1);
        assert_eq!(row.len(), 2);
        assert_eq!(row[0].0, (1, 0));
        assert!(o.matrix_row(0).is_empty());
    }

    #[test]
    fn test_validate() {
        let core = two_stage();
        let mut ok = StageOverride::new(1);
        ok.set_matrix(1, 0, 2.0).set_col_upper(1, 4.0).set_rhs(1, 3.0);
        assert!(ok.validate(&core).is_ok());

        let mut wrong_col = StageOverride::new(1);
        wrong_col.set_objective(0, 2.0);
        assert!(matches!(
            wrong_col.validate(&core),
            Err(StochError::IndexOutOfStage {
                kind: IndexKind::Column,
                ..
            })
        ));

        let mut wrong_row = StageOverride::new(0);
        wrong_row.set_rhs(1, 2.0);
        assert!(matches!(
            wrong_row.validate(&core),
            Err(StochError::IndexOutOfStage {
                kind: IndexKind::Row,
                ..
            })
        ));

        assert!(matches!(
            StageOverride::new(2).validate(&core),
            Err(StochError::BranchStageOutOfRange { stage: 2, stages: 2 })
        ));
    }

    #[test]
    fn test_target_stage_and_value() {
        let core = two_stage();
        let t = CoefficientTarget::Matrix { row: 1, col: 1 };
        assert_eq!(t.stage(&core).unwrap(), 1);
        assert!((t.template_value(&core).unwrap() - 4.0).abs() < 1e-12);
        let rhs = CoefficientTarget::Rhs { row: 1 };
        assert!((rhs.template_value(&core).unwrap() - 2.0).abs() < 1e-12);
        assert!(CoefficientTarget::Objective { col: 9 }.stage(&core).is_err());
    }
}
