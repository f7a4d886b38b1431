//! Core template, stage overrides and the rule that merges them.

mod combine;
mod core_template;
mod deterministic;
mod overrides;

pub use combine::{CombineRule, CombineStrategy, StageData, combine};
pub use core_template::{CoreTemplate, RowSense, SparseRow};
pub use deterministic::{ColumnKind, DeterministicModel};
pub use overrides::{CoefficientTarget, StageOverride};
