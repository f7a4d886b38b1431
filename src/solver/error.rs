//! Error types for the solver adapter.

use std::fmt;

/// Result type for solver operations.
pub type SolverResult<T> = Result<T, SolverError>;

/// Errors raised by a solver adapter. Infeasibility and unboundedness are
/// statuses, not errors.
#[derive(Debug, Clone, PartialEq)]
pub enum SolverError {
    /// Problem data is inconsistent.
    InvalidInput { context: String },

    /// The iteration or node budget ran out before a conclusion.
    IterationLimit { iterations: usize },

    /// A pivot or bound computation broke down numerically.
    NumericalError { message: String },

    /// `solve` was called before `load`.
    NotLoaded,
}

impl fmt::Display for SolverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidInput { context } => write!(f, "Invalid input: {}", context),
            Self::IterationLimit { iterations } => {
                write!(f, "Iteration limit reached after {} iterations", iterations)
            }
            Self::NumericalError { message } => write!(f, "Numerical error: {}", message),
            Self::NotLoaded => write!(f, "No problem loaded"),
        }
    }
}

impl std::error::Error for SolverError {}
