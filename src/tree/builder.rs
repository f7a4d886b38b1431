//! Minimal scenario tree from a fan of override paths.

use std::collections::HashMap;

use crate::error::{StochError, StochResult, check_probability_sum};
use crate::template::{CoreTemplate, StageOverride};

use super::arena::ScenarioTree;

/// One scenario as it must be passed to [`ScenarioTree::generate_scenario`].
#[derive(Debug, Clone, PartialEq)]
pub struct ScenarioSpec {
    /// Overrides for stages `branch_stage..stages`.
    pub overrides: Vec<StageOverride>,
    pub branch_stage: usize,
    pub ancestor: Option<usize>,
    pub probability: f64,
}

/// Deduplicate fan paths into the minimal set of scenarios.
///
/// Each path holds one override per stage. Paths that agree on every stage
/// up to `t` share their nodes up to `t`; fully identical paths are merged
/// and their probabilities summed. Scenario 0 is always the first path.
pub fn build_tree(
    paths: &[(Vec<StageOverride>, f64)],
    tolerance: f64,
) -> StochResult<Vec<ScenarioSpec>> {
    let Some((first, _)) = paths.first() else {
        return Err(StochError::InvalidInput {
            context: "scenario fan is empty".to_string(),
        });
    };
    let stages = first.len();
    if stages == 0 {
        return Err(StochError::InvalidInput {
            context: "fan paths have no stages".to_string(),
        });
    }
    if let Some((p, _)) = paths.iter().find(|(p, _)| p.len() != stages) {
        return Err(StochError::InvalidInput {
            context: format!("fan paths of {} and {} stages", stages, p.len()),
        });
    }
    check_probability_sum(paths.iter().map(|(_, p)| p).sum(), tolerance, "scenario fan")?;

    let mut specs = Vec::new();
    let group: Vec<usize> = (0..paths.len()).collect();
    emit(paths, &group, 0, 0, None, &mut specs)?;
    Ok(specs)
}

/// Emit the scenarios of `group`, whose paths agree on stages `< stage`.
/// Returns the index of the first scenario emitted.
fn emit(
    paths: &[(Vec<StageOverride>, f64)],
    group: &[usize],
    stage: usize,
    branch_stage: usize,
    ancestor: Option<usize>,
    specs: &mut Vec<ScenarioSpec>,
) -> StochResult<usize> {
    let stages = paths[group[0]].0.len();
    if stage == stages {
        specs.push(ScenarioSpec {
            overrides: paths[group[0]].0[branch_stage..].to_vec(),
            branch_stage,
            ancestor,
            probability: group.iter().map(|&k| paths[k].1).sum(),
        });
        return Ok(specs.len() - 1);
    }

    let parts = partition(paths, group, stage);
    if stage == 0 && parts.len() > 1 {
        return Err(StochError::BranchStageOutOfRange { stage: 0, stages });
    }

    let first = emit(paths, &parts[0], stage + 1, branch_stage, ancestor, specs)?;
    for part in &parts[1..] {
        emit(paths, part, stage + 1, stage, Some(first), specs)?;
    }
    Ok(first)
}

/// Split `group` by the override at `stage`, in first-appearance order.
fn partition(
    paths: &[(Vec<StageOverride>, f64)],
    group: &[usize],
    stage: usize,
) -> Vec<Vec<usize>> {
    let mut parts: Vec<Vec<usize>> = Vec::new();
    let mut index: HashMap<&StageOverride, usize> = HashMap::new();
    for &k in group {
        let key = &paths[k].0[stage];
        match index.get(key) {
            Some(&p) => parts[p].push(k),
            None => {
                index.insert(key, parts.len());
                parts.push(vec![k]);
            }
        }
    }
    parts
}

impl ScenarioTree {
    /// Replay scenario specs into a fresh tree.
    pub fn from_specs(core: &CoreTemplate, specs: Vec<ScenarioSpec>) -> StochResult<Self> {
        let mut tree = Self::new(core.stages());
        for spec in specs {
            let overrides = spec.overrides.into_iter().map(Some).collect();
            tree.generate_scenario(
                core,
                overrides,
                spec.branch_stage,
                spec.ancestor,
                spec.probability,
            )?;
        }
        Ok(tree)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::DeterministicModel;

    fn path(values: &[f64]) -> Vec<StageOverride> {
        values
            .iter()
            .enumerate()
            .map(|(stage, &v)| {
                let mut o = StageOverride::new(stage);
                if stage > 0 {
                    o.set_rhs(stage, v);
                }
                o
            })
            .collect()
    }

    fn core(stages: usize) -> CoreTemplate {
        let mut m = DeterministicModel::new();
        for stage in 0..stages {
            let x = m.add_column(0.0, 10.0, 1.0, stage);
            let r = m.add_row(f64::NEG_INFINITY, 5.0, stage);
            m.add_coefficient(r, x, 1.0);
        }
        CoreTemplate::from_deterministic(&m, stages).unwrap()
    }

    #[test]
    fn test_divergence_points() {
        // stage values per path; stage 0 ignored
        let paths = vec![
            (path(&[0.0, 1.0, 1.0]), 0.25),
            (path(&[0.0, 1.0, 2.0]), 0.25),
            (path(&[0.0, 2.0, 1.0]), 0.25),
            (path(&[0.0, 2.0, 1.0]), 0.25),
        ];
        let specs = build_tree(&paths, 1e-4).unwrap();
        assert_eq!(specs.len(), 3);
        assert_eq!((specs[0].branch_stage, specs[0].ancestor), (0, None));
        assert_eq!(specs[0].overrides.len(), 3);
        assert_eq!((specs[1].branch_stage, specs[1].ancestor), (2, Some(0)));
        assert_eq!(specs[1].overrides.len(), 1);
        assert_eq!((specs[2].branch_stage, specs[2].ancestor), (1, Some(0)));
        assert!((specs[2].probability - 0.5).abs() < 1e-12);

        let tree = ScenarioTree::from_specs(&core(3), specs).unwrap();
        // root, two stage-1 nodes, three stage-2 nodes
        assert_eq!(tree.node_count(), 6);
        assert_eq!(tree.path(0).unwrap()[..2], tree.path(1).unwrap()[..2]);
        assert_ne!(tree.path(0).unwrap()[1], tree.path(2).unwrap()[1]);
    }

    #[test]
    fn test_identical_paths_merge() {
        let paths = vec![(path(&[0.0, 3.0]), 0.5), (path(&[0.0, 3.0]), 0.5)];
        let specs = build_tree(&paths, 1e-4).unwrap();
        assert_eq!(specs.len(), 1);
        assert!((specs[0].probability - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_root_branching_rejected() {
        let mut other = path(&[0.0, 1.0]);
        other[0].set_objective(0, 9.0);
        let paths = vec![(path(&[0.0, 1.0]), 0.5), (other, 0.5)];
        assert!(matches!(
            build_tree(&paths, 1e-4),
            Err(StochError::BranchStageOutOfRange { stage: 0, .. })
        ));
    }

    #[test]
    fn test_bad_fans() {
        assert!(build_tree(&[], 1e-4).is_err());
        let ragged = vec![(path(&[0.0, 1.0]), 0.5), (path(&[0.0, 1.0, 2.0]), 0.5)];
        assert!(build_tree(&ragged, 1e-4).is_err());
        let short = vec![(path(&[0.0, 1.0]), 0.5), (path(&[0.0, 2.0]), 0.4)];
        assert!(matches!(
            build_tree(&short, 1e-4),
            Err(StochError::ProbabilityMismatch { .. })
        ));
    }
}
