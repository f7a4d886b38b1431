//! Parametric distributions and the strategies that turn them into finite
//! (value, probability) tables.

use rand::Rng;
use rand::distr::{Bernoulli as BernoulliSampler, Distribution as _, Uniform as UniformSampler};
use rand_distr::{
    Exp as ExpSampler, Geometric as GeometricSampler, LogNormal as LogNormalSampler,
    Normal as NormalSampler, Triangular as TriangularSampler,
};

use crate::error::{StochError, StochResult};
use crate::stats::{
    Bernoulli, ContinuousDistribution, DiscreteDistribution, DiscreteUniform, Distribution,
    Exponential, Geometric, LogNormal, Normal, StatsError, StatsResult, Triangular, Uniform,
};

use super::random_variable::Outcome;

/// Sub-intervals per bracket used to integrate the quantile function.
const BRACKET_MEAN_POINTS: usize = 64;

/// Extended Pearson-Tukey percentiles and weights.
const EPT_POINTS: [(f64, f64); 3] = [(0.05, 0.185), (0.5, 0.630), (0.95, 0.185)];

/// Distribution of a parametric random coefficient.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParametricDistribution {
    DiscreteUniform(DiscreteUniform),
    Bernoulli(Bernoulli),
    Geometric(Geometric),
    Uniform(Uniform),
    Normal(Normal),
    LogNormal(LogNormal),
    Exponential(Exponential),
    Triangular(Triangular),
}

macro_rules! impl_from_distribution {
    ($($name:ident),*) => {
        $(
            impl From<$name> for ParametricDistribution {
                fn from(d: $name) -> Self {
                    Self::$name(d)
                }
            }
        )*
    };
}

impl_from_distribution!(
    DiscreteUniform,
    Bernoulli,
    Geometric,
    Uniform,
    Normal,
    LogNormal,
    Exponential,
    Triangular
);

fn sampler_error(err: impl std::fmt::Display) -> StatsError {
    StatsError::InvalidParameter {
        name: "sampler".to_string(),
        value: f64::NAN,
        reason: err.to_string(),
    }
}

impl ParametricDistribution {
    /// Inverse CDF at `p`.
    pub fn quantile(&self, p: f64) -> StatsResult<f64> {
        match self {
            Self::DiscreteUniform(d) => d.ppf(p).map(|k| k as f64),
            Self::Bernoulli(d) => d.ppf(p).map(|k| k as f64),
            Self::Geometric(d) => d.ppf(p).map(|k| k as f64),
            Self::Uniform(d) => d.ppf(p),
            Self::Normal(d) => d.ppf(p),
            Self::LogNormal(d) => d.ppf(p),
            Self::Exponential(d) => d.ppf(p),
            Self::Triangular(d) => d.ppf(p),
        }
    }

    pub fn mean(&self) -> f64 {
        match self {
            Self::DiscreteUniform(d) => d.mean(),
            Self::Bernoulli(d) => d.mean(),
            Self::Geometric(d) => d.mean(),
            Self::Uniform(d) => d.mean(),
            Self::Normal(d) => d.mean(),
            Self::LogNormal(d) => d.mean(),
            Self::Exponential(d) => d.mean(),
            Self::Triangular(d) => d.mean(),
        }
    }

    /// Finite integer support of a discrete distribution. `None` for
    /// continuous and unbounded discrete distributions.
    pub fn support(&self) -> Option<(i64, i64)> {
        match self {
            Self::DiscreteUniform(d) => d.support(),
            Self::Bernoulli(d) => d.support(),
            Self::Geometric(d) => d.support(),
            _ => None,
        }
    }

    pub fn is_discrete(&self) -> bool {
        matches!(
            self,
            Self::DiscreteUniform(_) | Self::Bernoulli(_) | Self::Geometric(_)
        )
    }

    fn pmf(&self, k: i64) -> f64 {
        match self {
            Self::DiscreteUniform(d) => d.pmf(k),
            Self::Bernoulli(d) => d.pmf(k),
            Self::Geometric(d) => d.pmf(k),
            _ => 0.0,
        }
    }

    /// One independent draw.
    pub fn draw<R: Rng>(&self, rng: &mut R) -> StatsResult<f64> {
        let value = match self {
            Self::DiscreteUniform(d) => rng.random_range(d.low()..=d.high()) as f64,
            Self::Bernoulli(d) => {
                let sampler = BernoulliSampler::new(d.p()).map_err(sampler_error)?;
                if sampler.sample(rng) { 1.0 } else { 0.0 }
            }
            Self::Geometric(d) => {
                // rand_distr counts failures before the first success
                let sampler = GeometricSampler::new(d.p()).map_err(sampler_error)?;
                sampler.sample(rng) as f64 + 1.0
            }
            Self::Uniform(d) => UniformSampler::new(d.lower(), d.upper())
                .map_err(sampler_error)?
                .sample(rng),
            Self::Normal(d) => NormalSampler::new(d.loc(), d.scale())
                .map_err(sampler_error)?
                .sample(rng),
            Self::LogNormal(d) => LogNormalSampler::new(d.mu(), d.sigma())
                .map_err(sampler_error)?
                .sample(rng),
            Self::Exponential(d) => ExpSampler::new(d.rate())
                .map_err(sampler_error)?
                .sample(rng),
            Self::Triangular(d) => TriangularSampler::new(d.min(), d.max(), d.mode())
                .map_err(sampler_error)?
                .sample(rng),
        };
        Ok(value)
    }
}

/// Strategy turning a [`ParametricDistribution`] into a finite table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Discretization {
    /// `count` equiprobable brackets, each represented by its conditional mean.
    #[default]
    BracketMean,
    /// `count` equiprobable brackets, each represented by its median.
    BracketMedian,
    /// Fixed three points at the 5th, 50th and 95th percentiles.
    ExtendedPearsonTukey,
    /// `count` independent draws, each with probability `1/count`.
    DoubleDiscretization,
    /// Full enumeration of a finite discrete support.
    Exact,
}

impl Discretization {
    /// Discretize `dist` into at most `count` outcomes. Coincident points are
    /// merged.
    pub fn discretize<R: Rng>(
        &self,
        dist: &ParametricDistribution,
        count: usize,
        rng: &mut R,
    ) -> StochResult<Vec<Outcome>> {
        let needs_count = !matches!(self, Self::ExtendedPearsonTukey | Self::Exact);
        if needs_count && count == 0 {
            return Err(StochError::InvalidInput {
                context: format!("{:?} needs at least one point", self),
            });
        }
        let n = count as f64;

        let outcomes = match self {
            Self::BracketMean => (0..count)
                .map(|i| -> StatsResult<Outcome> {
                    let h = 1.0 / (n * BRACKET_MEAN_POINTS as f64);
                    let lo = i as f64 / n;
                    let mut sum = 0.0;
                    for k in 0..BRACKET_MEAN_POINTS {
                        sum += dist.quantile(lo + (k as f64 + 0.5) * h)?;
                    }
                    Ok(Outcome::new(sum / BRACKET_MEAN_POINTS as f64, 1.0 / n))
                })
                .collect::<StatsResult<Vec<_>>>()?,
            Self::BracketMedian => (0..count)
                .map(|i| -> StatsResult<Outcome> {
                    let value = dist.quantile((i as f64 + 0.5) / n)?;
                    Ok(Outcome::new(value, 1.0 / n))
                })
                .collect::<StatsResult<Vec<_>>>()?,
            Self::ExtendedPearsonTukey => EPT_POINTS
                .iter()
                .map(|&(q, w)| -> StatsResult<Outcome> {
                    Ok(Outcome::new(dist.quantile(q)?, w))
                })
                .collect::<StatsResult<Vec<_>>>()?,
            Self::DoubleDiscretization => (0..count)
                .map(|_| -> StatsResult<Outcome> {
                    Ok(Outcome::new(dist.draw(rng)?, 1.0 / n))
                })
                .collect::<StatsResult<Vec<_>>>()?,
            Self::Exact => exact_table(dist)?,
        };
        Ok(merge_coincident(outcomes))
    }
}

fn exact_table(dist: &ParametricDistribution) -> StochResult<Vec<Outcome>> {
    let (lo, hi) = match dist.support() {
        Some(bounds) => bounds,
        None if dist.is_discrete() => {
            return Err(StatsError::UnboundedSupport {
                context: "exact discretization".to_string(),
            }
            .into());
        }
        None => {
            return Err(StochError::InvalidInput {
                context: "exact discretization needs a discrete distribution".to_string(),
            });
        }
    };
    Ok((lo..=hi)
        .map(|k| Outcome::new(k as f64, dist.pmf(k)))
        .filter(|o| o.probability > 0.0)
        .collect())
}

/// Merge outcomes with bit-identical values, summing their probabilities and
/// keeping first-appearance order.
pub(crate) fn merge_coincident(outcomes: Vec<Outcome>) -> Vec<Outcome> {
    let mut merged: Vec<Outcome> = Vec::with_capacity(outcomes.len());
    for o in outcomes {
        match merged
            .iter_mut()
            .find(|m| m.value.to_bits() == o.value.to_bits())
        {
            Some(m) => m.probability += o.probability,
            None => merged.push(o),
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn total(outcomes: &[Outcome]) -> f64 {
        outcomes.iter().map(|o| o.probability).sum()
    }

    #[test]
    fn test_bracket_median_uniform() {
        let dist = ParametricDistribution::from(Uniform::new(0.0, 10.0).unwrap());
        let mut rng = StdRng::seed_from_u64(1);
        let out = Discretization::BracketMedian
            .discretize(&dist, 4, &mut rng)
            .unwrap();
        let expected = [1.25, 3.75, 6.25, 8.75];
        assert_eq!(out.len(), 4);
        for (o, e) in out.iter().zip(expected) {
            assert!((o.value - e).abs() < 1e-10);
            assert!((o.probability - 0.25).abs() < 1e-12);
        }
    }

    #[test]
    fn test_bracket_mean_normal() {
        let dist = ParametricDistribution::from(Normal::new(5.0, 2.0).unwrap());
        let mut rng = StdRng::seed_from_u64(1);
        let out = Discretization::BracketMean
            .discretize(&dist, 5, &mut rng)
            .unwrap();
        assert_eq!(out.len(), 5);
        assert!((total(&out) - 1.0).abs() < 1e-12);
        let mean: f64 = out.iter().map(|o| o.value * o.probability).sum();
        assert!((mean - 5.0).abs() < 1e-6);
        // symmetric brackets
        assert!((out[0].value - 5.0 + (out[4].value - 5.0)).abs() < 1e-6);
        assert!(out.windows(2).all(|w| w[0].value < w[1].value));
    }

    #[test]
    fn test_extended_pearson_tukey() {
        let dist = ParametricDistribution::from(Normal::standard());
        let mut rng = StdRng::seed_from_u64(1);
        let out = Discretization::ExtendedPearsonTukey
            .discretize(&dist, 99, &mut rng)
            .unwrap();
        assert_eq!(out.len(), 3);
        assert!((out[0].value + 1.6448536269514722).abs() < 1e-6);
        assert!(out[1].value.abs() < 1e-9);
        assert!((out[1].probability - 0.63).abs() < 1e-12);
        assert!((total(&out) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_double_discretization_seeded() {
        let dist = ParametricDistribution::from(Triangular::new(0.0, 1.0, 4.0).unwrap());
        let mut a = StdRng::seed_from_u64(42);
        let mut b = StdRng::seed_from_u64(42);
        let first = Discretization::DoubleDiscretization
            .discretize(&dist, 6, &mut a)
            .unwrap();
        let second = Discretization::DoubleDiscretization
            .discretize(&dist, 6, &mut b)
            .unwrap();
        assert_eq!(first, second);
        assert!(first.iter().all(|o| (0.0..=4.0).contains(&o.value)));
        assert!((total(&first) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_discrete_merge_and_exact() {
        let bern = ParametricDistribution::from(Bernoulli::new(0.3).unwrap());
        let mut rng = StdRng::seed_from_u64(3);
        let out = Discretization::BracketMedian
            .discretize(&bern, 10, &mut rng)
            .unwrap();
        assert_eq!(out.len(), 2);
        assert!((out[0].probability - 0.7).abs() < 1e-12);

        let die = ParametricDistribution::from(DiscreteUniform::new(1, 6).unwrap());
        let out = Discretization::Exact.discretize(&die, 0, &mut rng).unwrap();
        assert_eq!(out.len(), 6);
        assert!((total(&out) - 1.0).abs() < 1e-12);

        let geo = ParametricDistribution::from(Geometric::new(0.5).unwrap());
        assert!(Discretization::Exact.discretize(&geo, 0, &mut rng).is_err());
        let normal = ParametricDistribution::from(Normal::standard());
        assert!(Discretization::Exact.discretize(&normal, 0, &mut rng).is_err());
    }

    #[test]
    fn test_draw_in_support() {
        let mut rng = StdRng::seed_from_u64(7);
        let geo = ParametricDistribution::from(Geometric::new(0.4).unwrap());
        let exp = ParametricDistribution::from(Exponential::new(2.0).unwrap());
        let die = ParametricDistribution::from(DiscreteUniform::new(-2, 2).unwrap());
        for _ in 0..50 {
            assert!(geo.draw(&mut rng).unwrap() >= 1.0);
            assert!(exp.draw(&mut rng).unwrap() >= 0.0);
            let d = die.draw(&mut rng).unwrap();
            assert!((-2.0..=2.0).contains(&d) && d.fract() == 0.0);
        }
    }

    #[test]
    fn test_zero_count_rejected() {
        let dist = ParametricDistribution::from(LogNormal::new(0.0, 1.0).unwrap());
        let mut rng = StdRng::seed_from_u64(1);
        assert!(
            Discretization::BracketMean
                .discretize(&dist, 0, &mut rng)
                .is_err()
        );
    }
}
