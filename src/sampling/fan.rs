//! Scenario fan: full root-to-leaf combinations of sampled outcomes.

use crate::error::{StochError, StochResult, check_probability_sum};

use super::random_variable::Outcome;

/// Sampled outcome tables of every random variable declared at one stage.
#[derive(Debug, Clone, PartialEq)]
pub struct StageSamples {
    pub stage: usize,
    /// One outcome table per variable, in declaration order.
    pub variables: Vec<Vec<Outcome>>,
}

/// One scenario of the fan.
#[derive(Debug, Clone, PartialEq)]
pub struct FanEntry {
    /// One value per variable, stage by stage in declaration order.
    pub values: Vec<f64>,
    pub probability: f64,
}

/// Variables of `samples` flattened in stage order.
fn flatten(samples: &[StageSamples]) -> Vec<&[Outcome]> {
    let mut order: Vec<&StageSamples> = samples.iter().collect();
    order.sort_by_key(|s| s.stage);
    order
        .into_iter()
        .flat_map(|s| s.variables.iter().map(Vec::as_slice))
        .collect()
}

fn check_tables(vars: &[&[Outcome]]) -> StochResult<()> {
    if let Some(k) = vars.iter().position(|v| v.is_empty()) {
        return Err(StochError::InvalidInput {
            context: format!("random variable {} has no outcomes", k),
        });
    }
    Ok(())
}

/// Combine independently sampled variables into a scenario fan.
///
/// All-against-all forms the Cartesian product stage by stage with the last
/// variable varying fastest. `sample_only` instead pairs the k-th draw of
/// every variable into scenario k with probability `1 / N`; all variables
/// must then carry the same number N of draws (see
/// [`draw_samples`](super::draw_samples)) and their own probabilities are
/// ignored.
pub fn build_fan(
    samples: &[StageSamples],
    sample_only: bool,
    tolerance: f64,
) -> StochResult<Vec<FanEntry>> {
    let vars = flatten(samples);
    check_tables(&vars)?;

    let fan = if sample_only {
        let n = vars.first().map_or(1, |v| v.len());
        if let Some(v) = vars.iter().find(|v| v.len() != n) {
            return Err(StochError::InvalidInput {
                context: format!(
                    "sample-only fan needs equal outcome counts, found {} and {}",
                    n,
                    v.len()
                ),
            });
        }
        let p = 1.0 / n as f64;
        (0..n)
            .map(|k| FanEntry {
                values: vars.iter().map(|v| v[k].value).collect(),
                probability: p,
            })
            .collect()
    } else {
        let mut fan = vec![FanEntry {
            values: Vec::with_capacity(vars.len()),
            probability: 1.0,
        }];
        for outcomes in &vars {
            let mut next = Vec::with_capacity(fan.len() * outcomes.len());
            for entry in &fan {
                for o in outcomes.iter() {
                    let mut values = entry.values.clone();
                    values.push(o.value);
                    next.push(FanEntry {
                        values,
                        probability: entry.probability * o.probability,
                    });
                }
            }
            fan = next;
        }
        fan
    };

    check_probability_sum(
        fan.iter().map(|e| e.probability).sum(),
        tolerance,
        "scenario fan",
    )?;
    Ok(fan)
}

/// Pair scenario-indexed values into a fan.
///
/// Scenario k takes the k-th value of every variable with the k-th
/// probability. All variables must agree on the scenario count and on the
/// scenario probabilities.
pub fn build_scenario_fan(samples: &[StageSamples], tolerance: f64) -> StochResult<Vec<FanEntry>> {
    let vars = flatten(samples);
    check_tables(&vars)?;
    let Some(first) = vars.first() else {
        return Ok(vec![FanEntry {
            values: Vec::new(),
            probability: 1.0,
        }]);
    };

    for v in &vars[1..] {
        if v.len() != first.len() {
            return Err(StochError::InvalidInput {
                context: format!(
                    "scenario-based variables disagree on the scenario count ({} and {})",
                    first.len(),
                    v.len()
                ),
            });
        }
        if let Some(k) = (0..first.len())
            .find(|&k| (v[k].probability - first[k].probability).abs() > tolerance)
        {
            return Err(StochError::InvalidInput {
                context: format!("scenario {} has conflicting probabilities", k),
            });
        }
    }

    let fan: Vec<FanEntry> = (0..first.len())
        .map(|k| FanEntry {
            values: vars.iter().map(|v| v[k].value).collect(),
            probability: first[k].probability,
        })
        .collect();
    check_probability_sum(
        fan.iter().map(|e| e.probability).sum(),
        tolerance,
        "scenario fan",
    )?;
    Ok(fan)
}
