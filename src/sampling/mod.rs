//! Random variables, discretization strategies and the scenario fan.

mod discretize;
mod fan;
mod random_variable;

pub use discretize::{Discretization, ParametricDistribution};
pub use fan::{FanEntry, StageSamples, build_fan, build_scenario_fan};
pub use random_variable::{
    Outcome, RandomVariable, RandomVariableKind, SamplingMode, draw_samples, sample, sampling_mode,
};
