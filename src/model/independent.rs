//! Independent discrete distributions declared as coefficient tables.

use crate::error::StochResult;
use crate::sampling::RandomVariable;
use crate::template::{CoefficientTarget, CombineRule};

/// One line of a discrete declaration: `target` takes `value` with
/// `probability`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DiscreteEntry {
    pub target: CoefficientTarget,
    pub value: f64,
    pub probability: f64,
}

/// A set of independent discrete random coefficients.
///
/// Entries addressing the same slot form one random variable, in order of
/// first appearance. `combine_rule` says whether the values replace or are
/// added onto the template.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct IndependentDistribution {
    pub combine_rule: CombineRule,
    pub entries: Vec<DiscreteEntry>,
}

impl IndependentDistribution {
    pub fn new(combine_rule: CombineRule) -> Self {
        Self {
            combine_rule,
            entries: Vec::new(),
        }
    }

    pub fn push(&mut self, target: CoefficientTarget, value: f64, probability: f64) -> &mut Self {
        self.entries.push(DiscreteEntry {
            target,
            value,
            probability,
        });
        self
    }

    /// Group the entries into discrete random variables at `stage_of(target)`.
    pub(crate) fn variables<F>(&self, mut stage_of: F) -> StochResult<Vec<RandomVariable>>
    where
        F: FnMut(CoefficientTarget) -> StochResult<usize>,
    {
        let mut groups: Vec<(CoefficientTarget, Vec<(f64, f64)>)> = Vec::new();
        for entry in &self.entries {
            match groups.iter_mut().find(|(t, _)| *t == entry.target) {
                Some((_, outcomes)) => outcomes.push((entry.value, entry.probability)),
                None => groups.push((entry.target, vec![(entry.value, entry.probability)])),
            }
        }
        groups
            .into_iter()
            .map(|(target, outcomes)| {
                Ok(RandomVariable::discrete(target, stage_of(target)?, outcomes))
            })
            .collect()
    }
}
