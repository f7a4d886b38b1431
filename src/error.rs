//! Error types for scenario-tree construction and deterministic-equivalent assembly.
//!
//! Only configuration and programming errors are raised here. Infeasibility
//! and unboundedness are reported through [`crate::ModelStatus`].

use std::fmt;

use crate::solver::SolverError;
use crate::stats::StatsError;

/// Result type for model operations.
pub type StochResult<T> = Result<T, StochError>;

/// What kind of index an [`StochError::IndexOutOfStage`] refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexKind {
    Column,
    Row,
}

impl fmt::Display for IndexKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Column => write!(f, "column"),
            Self::Row => write!(f, "row"),
        }
    }
}

/// Errors raised while building, assembling or navigating a stochastic model.
#[derive(Debug, Clone, PartialEq)]
pub enum StochError {
    /// Scenario-based and parametric random variables declared in one model.
    MixedSamplingModes,

    /// Probabilities do not sum to one.
    ProbabilityMismatch {
        total: f64,
        tolerance: f64,
        context: String,
    },

    /// A branch stage beyond the declared stage count.
    BranchStageOutOfRange { stage: usize, stages: usize },

    /// An override or coefficient touches an index outside its stage's range.
    IndexOutOfStage {
        kind: IndexKind,
        index: usize,
        stage: usize,
        context: String,
    },

    /// A right-hand-side override hit a row whose sense cannot take it.
    InvalidRowSense { row: usize },

    /// A scenario/stage/column combination outside the tree.
    NavigationOutOfRange { context: String },

    /// Reference to a scenario that was never generated.
    UnknownScenario { scenario: usize },

    /// Malformed input.
    InvalidInput { context: String },

    /// An operation needs a solver but none is attached.
    NoSolver,

    /// An operation needs a loaded deterministic equivalent.
    NotAttached,

    /// Error from a distribution.
    Stats(StatsError),

    /// Error from the solver adapter.
    Solver(SolverError),
}

impl fmt::Display for StochError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MixedSamplingModes => write!(
                f,
                "scenario-based and parametric random variables cannot be mixed in one model"
            ),
            Self::ProbabilityMismatch {
                total,
                tolerance,
                context,
            } => write!(
                f,
                "{}: probabilities sum to {} (must be 1 within {:.1e})",
                context, total, tolerance
            ),
            Self::BranchStageOutOfRange { stage, stages } => write!(
                f,
                "branch stage {} is out of range for a model with {} stages",
                stage, stages
            ),
            Self::IndexOutOfStage {
                kind,
                index,
                stage,
                context,
            } => write!(
                f,
                "{}: {} {} is outside the range of stage {}",
                context, kind, index, stage
            ),
            Self::InvalidRowSense { row } => write!(
                f,
                "row {} has no finite bound to receive a right-hand-side override",
                row
            ),
            Self::NavigationOutOfRange { context } => {
                write!(f, "navigation out of range: {}", context)
            }
            Self::UnknownScenario { scenario } => write!(f, "unknown scenario {}", scenario),
            Self::InvalidInput { context } => write!(f, "invalid input: {}", context),
            Self::NoSolver => write!(f, "no solver attached to the model"),
            Self::NotAttached => write!(f, "deterministic equivalent has not been loaded"),
            Self::Stats(err) => write!(f, "stats error: {}", err),
            Self::Solver(err) => write!(f, "solver error: {}", err),
        }
    }
}

impl std::error::Error for StochError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Stats(err) => Some(err),
            Self::Solver(err) => Some(err),
            _ => None,
        }
    }
}

impl From<StatsError> for StochError {
    fn from(err: StatsError) -> Self {
        Self::Stats(err)
    }
}

impl From<SolverError> for StochError {
    fn from(err: SolverError) -> Self {
        Self::Solver(err)
    }
}

/// Check that `total` is one within `tolerance`.
pub(crate) fn check_probability_sum(total: f64, tolerance: f64, context: &str) -> StochResult<()> {
    if (total - 1.0).abs() > tolerance || !total.is_finite() {
        return Err(StochError::ProbabilityMismatch {
            total,
            tolerance,
            context: context.to_string(),
        });
    }
    Ok(())
}
