//! Random coefficients and the sampler that turns them into outcome tables.

use rand::Rng;
use rand::distr::Distribution as _;
use rand::distr::weighted::WeightedIndex;

use crate::error::{StochError, StochResult, check_probability_sum};
use crate::stats::{StatsError, StatsResult};
use crate::template::CoefficientTarget;

use super::discretize::{Discretization, ParametricDistribution, merge_coincident};

/// One (value, probability) pair of a sampled random variable.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Outcome {
    pub value: f64,
    pub probability: f64,
}

impl Outcome {
    pub fn new(value: f64, probability: f64) -> Self {
        Self { value, probability }
    }
}

/// How a random variable produces its outcomes.
#[derive(Debug, Clone, PartialEq)]
pub enum RandomVariableKind {
    /// One value per scenario index, uniform unless probabilities are given.
    ScenarioBased {
        values: Vec<f64>,
        probabilities: Option<Vec<f64>>,
    },
    /// A distribution discretized by a strategy.
    Parametric {
        distribution: ParametricDistribution,
        discretization: Discretization,
    },
    /// A declared (value, probability) table.
    Discrete { outcomes: Vec<(f64, f64)> },
}

/// Sampling mode of a model. All random variables of one model share it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SamplingMode {
    /// Values are indexed by scenario and paired across variables.
    Scenario,
    /// Every variable is sampled independently.
    Independent,
}

/// A random coefficient of the core template.
#[derive(Debug, Clone, PartialEq)]
pub struct RandomVariable {
    pub target: CoefficientTarget,
    pub stage: usize,
    pub kind: RandomVariableKind,
}

impl RandomVariable {
    pub fn scenario_based(target: CoefficientTarget, stage: usize, values: Vec<f64>) -> Self {
        Self {
            target,
            stage,
            kind: RandomVariableKind::ScenarioBased {
                values,
                probabilities: None,
            },
        }
    }

    pub fn scenario_based_with_probabilities(
        target: CoefficientTarget,
        stage: usize,
        values: Vec<f64>,
        probabilities: Vec<f64>,
    ) -> Self {
        Self {
            target,
            stage,
            kind: RandomVariableKind::ScenarioBased {
                values,
                probabilities: Some(probabilities),
            },
        }
    }

    pub fn parametric(
        target: CoefficientTarget,
        stage: usize,
        distribution: impl Into<ParametricDistribution>,
        discretization: Discretization,
    ) -> Self {
        Self {
            target,
            stage,
            kind: RandomVariableKind::Parametric {
                distribution: distribution.into(),
                discretization,
            },
        }
    }

    pub fn discrete(target: CoefficientTarget, stage: usize, outcomes: Vec<(f64, f64)>) -> Self {
        Self {
            target,
            stage,
            kind: RandomVariableKind::Discrete { outcomes },
        }
    }

    pub fn mode(&self) -> SamplingMode {
        match self.kind {
            RandomVariableKind::ScenarioBased { .. } => SamplingMode::Scenario,
            _ => SamplingMode::Independent,
        }
    }
}

/// Common sampling mode of `vars`, or `None` for an empty list.
pub fn sampling_mode(vars: &[RandomVariable]) -> StochResult<Option<SamplingMode>> {
    let mut mode = None;
    for var in vars {
        match mode {
            None => mode = Some(var.mode()),
            Some(m) if m != var.mode() => return Err(StochError::MixedSamplingModes),
            Some(_) => {}
        }
    }
    Ok(mode)
}

/// Produce the outcome table of `rv`.
///
/// `count` is the number of points requested from a discretization; it is
/// ignored for scenario-based variables, declared tables and the extended
/// Pearson-Tukey strategy. Only double discretization consumes `rng`.
pub fn sample<R: Rng>(
    rv: &RandomVariable,
    count: usize,
    tolerance: f64,
    rng: &mut R,
) -> StochResult<Vec<Outcome>> {
    match &rv.kind {
        RandomVariableKind::ScenarioBased {
            values,
            probabilities,
        } => {
            if values.is_empty() {
                return Err(StochError::InvalidInput {
                    context: "scenario-based random variable without values".to_string(),
                });
            }
            let outcomes: Vec<Outcome> = match probabilities {
                None => {
                    let p = 1.0 / values.len() as f64;
                    values.iter().map(|&v| Outcome::new(v, p)).collect()
                }
                Some(probs) => {
                    if probs.len() != values.len() {
                        return Err(StochError::InvalidInput {
                            context: format!(
                                "{} scenario values but {} probabilities",
                                values.len(),
                                probs.len()
                            ),
                        });
                    }
                    check_probability_sum(
                        probs.iter().sum(),
                        tolerance,
                        "scenario probabilities",
                    )?;
                    values
                        .iter()
                        .zip(probs)
                        .map(|(&v, &p)| Outcome::new(v, p))
                        .collect()
                }
            };
            Ok(outcomes)
        }
        RandomVariableKind::Parametric {
            distribution,
            discretization,
        } => discretization.discretize(distribution, count, rng),
        RandomVariableKind::Discrete { outcomes } => {
            Ok(merge_coincident(discrete_table(outcomes, tolerance)?))
        }
    }
}

/// Draw `count` independent values of `rv`, each with probability
/// `1 / count`.
///
/// Draws are never merged, so every draw can become a scenario of its own.
/// Parametric variables draw from their distribution whatever their
/// discretization; declared tables draw by weight. Scenario-based variables
/// keep their indexed values.
pub fn draw_samples<R: Rng>(
    rv: &RandomVariable,
    count: usize,
    tolerance: f64,
    rng: &mut R,
) -> StochResult<Vec<Outcome>> {
    let values: Vec<f64> = match &rv.kind {
        RandomVariableKind::ScenarioBased { .. } => return sample(rv, count, tolerance, rng),
        _ if count == 0 => {
            return Err(StochError::InvalidInput {
                context: "independent draws need at least one sample".to_string(),
            });
        }
        RandomVariableKind::Parametric { distribution, .. } => (0..count)
            .map(|_| distribution.draw(&mut *rng))
            .collect::<StatsResult<Vec<_>>>()?,
        RandomVariableKind::Discrete { outcomes } => {
            let table = discrete_table(outcomes, tolerance)?;
            let index = WeightedIndex::new(table.iter().map(|o| o.probability)).map_err(|e| {
                StochError::InvalidInput {
                    context: format!("discrete random variable: {}", e),
                }
            })?;
            (0..count)
                .map(|_| table[index.sample(&mut *rng)].value)
                .collect()
        }
    };
    let p = 1.0 / count as f64;
    Ok(values.into_iter().map(|v| Outcome::new(v, p)).collect())
}

/// Validated, unmerged outcomes of a declared table.
fn discrete_table(outcomes: &[(f64, f64)], tolerance: f64) -> StochResult<Vec<Outcome>> {
    if outcomes.is_empty() {
        return Err(StochError::InvalidInput {
            context: "discrete random variable without outcomes".to_string(),
        });
    }
    if let Some(&(_, p)) = outcomes.iter().find(|(_, p)| !(0.0..=1.0).contains(p)) {
        return Err(StatsError::InvalidProbability { value: p }.into());
    }
    check_probability_sum(
        outcomes.iter().map(|&(_, p)| p).sum(),
        tolerance,
        "discrete distribution",
    )?;
    Ok(outcomes.iter().map(|&(v, p)| Outcome::new(v, p)).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::Uniform;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    const TARGET: CoefficientTarget = CoefficientTarget::Rhs { row: 0 };

    #[test]
    fn test_scenario_based_uniform_probabilities() {
        let rv = RandomVariable::scenario_based(TARGET, 1, vec![3.0, 3.0, 5.0, 7.0]);
        let mut rng = StdRng::seed_from_u64(0);
        let out = sample(&rv, 10, 1e-4, &mut rng).unwrap();
        // scenario values stay indexed, no merging
        assert_eq!(out.len(), 4);
        assert!(out.iter().all(|o| (o.probability - 0.25).abs() < 1e-12));
        assert_eq!(rv.mode(), SamplingMode::Scenario);
    }

    #[test]
    fn test_scenario_based_explicit_probabilities() {
        let rv = RandomVariable::scenario_based_with_probabilities(
            TARGET,
            1,
            vec![2.0, 6.0],
            vec![0.2, 0.8],
        );
        let mut rng = StdRng::seed_from_u64(0);
        let out = sample(&rv, 1, 1e-4, &mut rng).unwrap();
        assert!((out[1].probability - 0.8).abs() < 1e-12);

        let bad = RandomVariable::scenario_based_with_probabilities(
            TARGET,
            1,
            vec![2.0, 6.0],
            vec![0.2, 0.7],
        );
        assert!(matches!(
            sample(&bad, 1, 1e-4, &mut rng),
            Err(StochError::ProbabilityMismatch { .. })
        ));

        let short = RandomVariable::scenario_based_with_probabilities(
            TARGET,
            1,
            vec![2.0, 6.0],
            vec![1.0],
        );
        assert!(sample(&short, 1, 1e-4, &mut rng).is_err());
    }

    #[test]
    fn test_discrete_table() {
        let rv = RandomVariable::discrete(TARGET, 2, vec![(1.0, 0.5), (4.0, 0.25), (1.0, 0.25)]);
        let mut rng = StdRng::seed_from_u64(0);
        let out = sample(&rv, 0, 1e-4, &mut rng).unwrap();
        assert_eq!(out.len(), 2);
        assert!((out[0].probability - 0.75).abs() < 1e-12);
        assert_eq!(rv.mode(), SamplingMode::Independent);

        let negative = RandomVariable::discrete(TARGET, 2, vec![(1.0, 1.5), (2.0, -0.5)]);
        assert!(sample(&negative, 0, 1e-4, &mut rng).is_err());
    }

    #[test]
    fn test_parametric() {
        let rv = RandomVariable::parametric(
            TARGET,
            1,
            Uniform::new(0.0, 1.0).unwrap(),
            Discretization::BracketMedian,
        );
        let mut rng = StdRng::seed_from_u64(0);
        let out = sample(&rv, 2, 1e-4, &mut rng).unwrap();
        assert!((out[0].value - 0.25).abs() < 1e-12);
        assert!((out[1].value - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_draws_are_unmerged_and_equiprobable() {
        let mut rng = StdRng::seed_from_u64(3);
        let coin = RandomVariable::discrete(TARGET, 1, vec![(0.0, 0.5), (1.0, 0.5)]);
        let draws = draw_samples(&coin, 5, 1e-4, &mut rng).unwrap();
        assert_eq!(draws.len(), 5);
        assert!(draws.iter().all(|o| (o.probability - 0.2).abs() < 1e-12));
        assert!(draws.iter().all(|o| o.value == 0.0 || o.value == 1.0));

        let ept = RandomVariable::parametric(
            TARGET,
            1,
            Uniform::new(0.0, 1.0).unwrap(),
            Discretization::ExtendedPearsonTukey,
        );
        let draws = draw_samples(&ept, 4, 1e-4, &mut rng).unwrap();
        assert_eq!(draws.len(), 4);
        assert!(draws.iter().all(|o| (0.0..=1.0).contains(&o.value)));
        assert!(draws.iter().all(|o| (o.probability - 0.25).abs() < 1e-12));

        assert!(draw_samples(&coin, 0, 1e-4, &mut rng).is_err());
        let bad = RandomVariable::discrete(TARGET, 1, vec![(0.0, 0.5)]);
        assert!(draw_samples(&bad, 3, 1e-4, &mut rng).is_err());
    }

    #[test]
    fn test_mixed_modes() {
        let a = RandomVariable::scenario_based(TARGET, 1, vec![1.0]);
        let b = RandomVariable::discrete(TARGET, 1, vec![(1.0, 1.0)]);
        assert_eq!(sampling_mode(&[]).unwrap(), None);
        assert_eq!(
            sampling_mode(std::slice::from_ref(&a)).unwrap(),
            Some(SamplingMode::Scenario)
        );
        assert_eq!(sampling_mode(&[a, b]), Err(StochError::MixedSamplingModes));
    }
}
