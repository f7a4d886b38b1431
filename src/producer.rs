//! Coefficient-record boundary.
//!
//! An algebraic modelling layer flattens a stage-annotated model into
//! [`CoefficientRecord`]s. [`ingest`] writes their deterministic values into a
//! [`DeterministicModel`] and collects the stage-random ones as scenario-based
//! [`RandomVariable`]s. Indices are the producer's own (model order) until
//! [`into_core`] maps them onto a [`CoreTemplate`].

use log::debug;

use crate::error::{StochError, StochResult};
use crate::sampling::RandomVariable;
use crate::template::{CoefficientTarget, CoreTemplate, DeterministicModel, RowSense};

/// Marker index: `column == NONE` is a right-hand side, `row == NONE` an
/// objective coefficient.
pub const NONE: i64 = -1;

/// One coefficient emitted by the producer.
#[derive(Debug, Clone, PartialEq)]
pub struct CoefficientRecord {
    pub column: i64,
    pub row: i64,
    /// Deterministic (template) value.
    pub value: f64,
    /// Stage of the column, or of the row for a right-hand side.
    pub variable_stage: usize,
    /// Stage at which the coefficient is revealed.
    pub random_stage: usize,
    /// One value per scenario; empty for a deterministic coefficient.
    pub per_scenario_values: Vec<f64>,
}

impl CoefficientRecord {
    pub fn matrix(row: usize, column: usize, value: f64, stage: usize) -> Self {
        Self::new(row as i64, column as i64, value, stage)
    }

    pub fn rhs(row: usize, value: f64, stage: usize) -> Self {
        Self::new(row as i64, NONE, value, stage)
    }

    pub fn objective(column: usize, value: f64, stage: usize) -> Self {
        Self::new(NONE, column as i64, value, stage)
    }

    fn new(row: i64, column: i64, value: f64, stage: usize) -> Self {
        Self {
            column,
            row,
            value,
            variable_stage: stage,
            random_stage: stage,
            per_scenario_values: Vec::new(),
        }
    }

    /// Make the record stage-random, revealed at `random_stage`.
    pub fn with_scenarios(mut self, random_stage: usize, values: Vec<f64>) -> Self {
        self.random_stage = random_stage;
        self.per_scenario_values = values;
        self
    }

    pub fn is_random(&self) -> bool {
        !self.per_scenario_values.is_empty()
    }

    /// Template slot addressed by this record, in model indices.
    pub fn target(&self) -> StochResult<CoefficientTarget> {
        let index = |value: i64, what: &str| -> StochResult<usize> {
            usize::try_from(value).map_err(|_| StochError::InvalidInput {
                context: format!("{} index {} in coefficient record", what, value),
            })
        };
        match (self.row, self.column) {
            (NONE, NONE) => Err(StochError::InvalidInput {
                context: "coefficient record with neither row nor column".to_string(),
            }),
            (row, NONE) => Ok(CoefficientTarget::Rhs {
                row: index(row, "row")?,
            }),
            (NONE, col) => Ok(CoefficientTarget::Objective {
                col: index(col, "column")?,
            }),
            (row, col) => Ok(CoefficientTarget::Matrix {
                row: index(row, "row")?,
                col: index(col, "column")?,
            }),
        }
    }
}

/// Write `records` into `model` and return the stage-random ones as
/// scenario-based random variables (model indices).
///
/// Matrix coefficients are accumulated, objective coefficients replace the
/// column's cost, and right-hand sides are routed by the row's current sense.
pub fn ingest(
    records: &[CoefficientRecord],
    model: &mut DeterministicModel,
) -> StochResult<Vec<RandomVariable>> {
    model.validate()?;
    let mut random = Vec::new();
    for record in records {
        let target = record.target()?;
        match target {
            CoefficientTarget::Matrix { row, col } => {
                check_model_index(model, Some(row), Some(col))?;
                check_stage(model.col_stage[col], record)?;
                model.add_coefficient(row, col, record.value);
            }
            CoefficientTarget::Objective { col } => {
                check_model_index(model, None, Some(col))?;
                check_stage(model.col_stage[col], record)?;
                model.objective[col] = record.value;
            }
            CoefficientTarget::Rhs { row } => {
                check_model_index(model, Some(row), None)?;
                check_stage(model.row_stage[row], record)?;
                route_rhs(model, row, record.value)?;
            }
            CoefficientTarget::ColumnLower { .. } | CoefficientTarget::ColumnUpper { .. } => {
                return Err(StochError::InvalidInput {
                    context: format!("record addresses bound slot {:?}", target),
                });
            }
        }
        if record.is_random() {
            random.push(RandomVariable::scenario_based(
                target,
                record.random_stage,
                record.per_scenario_values.clone(),
            ));
        }
    }
    debug!(
        "ingested {} coefficient records ({} random)",
        records.len(),
        random.len()
    );
    Ok(random)
}

/// Map the model-index targets of `vars` onto `core` positions.
pub fn into_core(vars: Vec<RandomVariable>, core: &CoreTemplate) -> StochResult<Vec<RandomVariable>> {
    let col = |c: usize| {
        core.col_position(c).ok_or_else(|| StochError::InvalidInput {
            context: format!("model column {} is not in the template", c),
        })
    };
    let row = |r: usize| {
        core.row_position(r).ok_or_else(|| StochError::InvalidInput {
            context: format!("model row {} is not in the template", r),
        })
    };
    vars.into_iter()
        .map(|mut var| {
            var.target = match var.target {
                CoefficientTarget::Matrix { row: r, col: c } => CoefficientTarget::Matrix {
                    row: row(r)?,
                    col: col(c)?,
                },
                CoefficientTarget::Rhs { row: r } => CoefficientTarget::Rhs { row: row(r)? },
                CoefficientTarget::Objective { col: c } => {
                    CoefficientTarget::Objective { col: col(c)? }
                }
                CoefficientTarget::ColumnLower { col: c } => {
                    CoefficientTarget::ColumnLower { col: col(c)? }
                }
                CoefficientTarget::ColumnUpper { col: c } => {
                    CoefficientTarget::ColumnUpper { col: col(c)? }
                }
            };
            Ok(var)
        })
        .collect()
}

fn check_model_index(
    model: &DeterministicModel,
    row: Option<usize>,
    col: Option<usize>,
) -> StochResult<()> {
    let row_ok = row.is_none_or(|r| r < model.num_rows());
    let col_ok = col.is_none_or(|c| c < model.num_columns());
    if row_ok && col_ok {
        return Ok(());
    }
    Err(StochError::InvalidInput {
        context: format!(
            "coefficient record ({:?}, {:?}) outside a {}x{} model",
            row,
            col,
            model.num_rows(),
            model.num_columns()
        ),
    })
}

fn check_stage(stage: usize, record: &CoefficientRecord) -> StochResult<()> {
    if stage != record.variable_stage {
        return Err(StochError::InvalidInput {
            context: format!(
                "record ({}, {}) claims stage {} but the model places it at stage {}",
                record.row, record.column, record.variable_stage, stage
            ),
        });
    }
    Ok(())
}

fn route_rhs(model: &mut DeterministicModel, row: usize, value: f64) -> StochResult<()> {
    let (lower, upper) = (model.row_lower[row], model.row_upper[row]);
    match RowSense::from_bounds(lower, upper) {
        RowSense::LessEqual => model.row_upper[row] = value,
        RowSense::GreaterEqual => model.row_lower[row] = value,
        RowSense::Equal => {
            model.row_lower[row] = value;
            model.row_upper[row] = value;
        }
        RowSense::Ranged => {
            model.row_lower[row] = value - (upper - lower);
            model.row_upper[row] = value;
        }
        RowSense::Free => return Err(StochError::InvalidRowSense { row }),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sampling::RandomVariableKind;

    fn model() -> DeterministicModel {
        let mut m = DeterministicModel::new();
        m.add_column(0.0, 10.0, 0.0, 1);
        m.add_column(0.0, 5.0, 0.0, 0);
        m.add_row(f64::NEG_INFINITY, 0.0, 1);
        m.add_row(0.0, 0.0, 0);
        m
    }

    #[test]
    fn test_ingest_routes_values() {
        let mut m = model();
        let records = vec![
            CoefficientRecord::objective(0, 3.0, 1),
            CoefficientRecord::matrix(0, 0, 1.0, 1),
            CoefficientRecord::matrix(0, 0, 0.5, 1),
            CoefficientRecord::rhs(0, 8.0, 1),
            CoefficientRecord::rhs(1, 2.0, 0),
        ];
        let random = ingest(&records, &mut m).unwrap();
        assert!(random.is_empty());
        assert!((m.objective[0] - 3.0).abs() < 1e-12);
        assert!((m.row_upper[0] - 8.0).abs() < 1e-12);
        assert_eq!(m.row_lower[0], f64::NEG_INFINITY);
        assert!((m.row_lower[1] - 2.0).abs() < 1e-12);
        assert!((m.row_upper[1] - 2.0).abs() < 1e-12);
        assert_eq!(m.entries.len(), 2);
    }

    #[test]
    fn test_random_records_become_variables() {
        let mut m = model();
        let records = vec![
            CoefficientRecord::objective(0, 2.0, 1).with_scenarios(1, vec![2.0, 6.0]),
        ];
        let random = ingest(&records, &mut m).unwrap();
        assert_eq!(random.len(), 1);
        assert_eq!(random[0].target, CoefficientTarget::Objective { col: 0 });
        assert_eq!(random[0].stage, 1);
        match &random[0].kind {
            RandomVariableKind::ScenarioBased { values, probabilities } => {
                assert_eq!(values, &vec![2.0, 6.0]);
                assert!(probabilities.is_none());
            }
            other => panic!("unexpected kind {:?}", other),
        }

        // model column 0 lives at stage 1, so it moves behind column 1
        let core = CoreTemplate::from_deterministic(&m, 2).unwrap();
        let mapped = into_core(random, &core).unwrap();
        assert_eq!(mapped[0].target, CoefficientTarget::Objective { col: 1 });
    }

    #[test]
    fn test_rejected_records() {
        let mut m = model();
        let both = CoefficientRecord {
            column: NONE,
            row: NONE,
            value: 1.0,
            variable_stage: 0,
            random_stage: 0,
            per_scenario_values: Vec::new(),
        };
        assert!(matches!(
            ingest(&[both], &mut m),
            Err(StochError::InvalidInput { .. })
        ));
        assert!(ingest(&[CoefficientRecord::matrix(5, 0, 1.0, 1)], &mut m).is_err());
        assert!(ingest(&[CoefficientRecord::matrix(0, 0, 1.0, 0)], &mut m).is_err());

        m.add_row(f64::NEG_INFINITY, f64::INFINITY, 0);
        assert_eq!(
            ingest(&[CoefficientRecord::rhs(2, 1.0, 0)], &mut m),
            Err(StochError::InvalidRowSense { row: 2 })
        );
    }
}
