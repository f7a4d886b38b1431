//! Model lifecycle status.

use std::fmt;

use crate::solver::SolveStatus;

/// Where a model is in its lifecycle.
///
/// `Detached → SolverOnly → Attached → {Optimal, PrimalInfeasible,
/// DualInfeasible, Abandoned}`. Changing the stochastic data of an attached
/// model drops it back to `SolverOnly`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ModelStatus {
    /// No solver.
    #[default]
    Detached,
    /// Solver present, nothing loaded.
    SolverOnly,
    /// Deterministic equivalent loaded, not yet solved.
    Attached,
    Optimal,
    PrimalInfeasible,
    DualInfeasible,
    /// The solver failed; the loaded problem was discarded.
    Abandoned,
}

impl ModelStatus {
    /// True once a solve has concluded, successfully or not.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::Optimal | Self::PrimalInfeasible | Self::DualInfeasible | Self::Abandoned
        )
    }

    /// True while a deterministic equivalent is loaded in the solver.
    pub fn has_problem(self) -> bool {
        matches!(
            self,
            Self::Attached | Self::Optimal | Self::PrimalInfeasible | Self::DualInfeasible
        )
    }
}

impl From<SolveStatus> for ModelStatus {
    fn from(status: SolveStatus) -> Self {
        match status {
            SolveStatus::Optimal => Self::Optimal,
            SolveStatus::PrimalInfeasible => Self::PrimalInfeasible,
            SolveStatus::DualInfeasible => Self::DualInfeasible,
            SolveStatus::Abandoned => Self::Abandoned,
        }
    }
}

impl fmt::Display for ModelStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Detached => "detached",
            Self::SolverOnly => "solver only",
            Self::Attached => "attached",
            Self::Optimal => "optimal",
            Self::PrimalInfeasible => "primal infeasible",
            Self::DualInfeasible => "dual infeasible",
            Self::Abandoned => "abandoned",
        };
        write!(f, "{}", name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classes() {
        assert!(!ModelStatus::Attached.is_terminal());
        assert!(ModelStatus::Abandoned.is_terminal());
        assert!(!ModelStatus::Abandoned.has_problem());
        assert!(ModelStatus::PrimalInfeasible.has_problem());
        assert_eq!(ModelStatus::from(SolveStatus::DualInfeasible), ModelStatus::DualInfeasible);
        assert_eq!(ModelStatus::default(), ModelStatus::Detached);
    }
}
