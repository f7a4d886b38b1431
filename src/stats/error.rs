//! Error types for probability distributions.

use std::fmt;

/// Result type for distribution operations.
pub type StatsResult<T> = Result<T, StatsError>;

/// Errors that can occur when building or querying a distribution.
#[derive(Debug, Clone, PartialEq)]
pub enum StatsError {
    /// A distribution parameter is outside its valid domain.
    InvalidParameter {
        name: String,
        value: f64,
        reason: String,
    },

    /// A probability argument is outside [0, 1].
    InvalidProbability { value: f64 },

    /// The requested operation needs a finite support.
    UnboundedSupport { context: String },
}

impl fmt::Display for StatsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidParameter {
                name,
                value,
                reason,
            } => write!(f, "Invalid parameter '{}' = {}: {}", name, value, reason),
            Self::InvalidProbability { value } => {
                write!(f, "Invalid probability {}: must lie in [0, 1]", value)
            }
            Self::UnboundedSupport { context } => {
                write!(f, "Unbounded support: {}", context)
            }
        }
    }
}

impl std::error::Error for StatsError {}
