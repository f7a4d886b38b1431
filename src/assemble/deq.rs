//! Deterministic equivalent of a whole scenario tree.

use log::{debug, trace};

use crate::error::{StochError, StochResult};
use crate::template::{CombineStrategy, CoreTemplate, combine};
use crate::tree::{NodeId, ScenarioTree};

use super::problem::{AssembledProblem, ProblemBuilder};

/// Assemble the probability-weighted deterministic equivalent of `tree`.
///
/// Nodes are placed stage by stage, in creation order within a stage, so
/// every node follows its parent and the column/row stage arrays are
/// non-decreasing. Each node's objective is scaled by its accumulated
/// probability over the total tree probability. Offsets and normalised
/// probabilities are written back into the tree nodes.
pub fn assemble_deterministic_equivalent(
    core: &CoreTemplate,
    tree: &mut ScenarioTree,
    strategy: &dyn CombineStrategy,
    tolerance: f64,
) -> StochResult<AssembledProblem> {
    if tree.is_empty() {
        return Err(StochError::InvalidInput {
            context: "cannot assemble an empty scenario tree".to_string(),
        });
    }
    if tree.stages() != core.stages() {
        return Err(StochError::InvalidInput {
            context: format!(
                "tree has {} stages but the template has {}",
                tree.stages(),
                core.stages()
            ),
        });
    }
    tree.check_probability(tolerance)?;
    let total = tree.total_probability();

    let mut by_stage: Vec<Vec<NodeId>> = vec![Vec::new(); tree.stages()];
    for (id, node) in tree.nodes() {
        by_stage[node.stage()].push(id);
    }

    let mut builder = ProblemBuilder::new();
    for ids in &by_stage {
        for &id in ids {
            let node = tree.node(id)?;
            let stage = node.stage();
            let model_probability = node.probability() / total;

            let placed = match tree.override_of(id)? {
                None => None,
                Some(patch) => {
                    let data = combine(core, stage, Some(patch), strategy)?;
                    let ancestors = ancestor_offsets(tree, id)?;
                    Some(builder.place(core, data, model_probability, |s| ancestors[s]))
                }
            };

            let node = &mut tree.nodes[id.index()];
            node.model_probability = model_probability;
            match placed {
                Some((col_offset, row_offset)) => {
                    node.col_offset = col_offset;
                    node.row_offset = row_offset;
                }
                None => {
                    node.col_offset = builder.next_column();
                    node.row_offset = builder.next_row();
                }
            }
            trace!(
                "node {} (stage {}): columns at {}, rows at {}, probability {}",
                id.index(),
                stage,
                node.col_offset,
                node.row_offset,
                model_probability
            );
        }
    }

    let dropped = builder.dropped();
    let problem = builder.finish();
    tree.assembled = true;
    debug!(
        "assembled deterministic equivalent: {} scenarios, {} nodes, {} columns, {} rows, {} nonzeros ({} dropped)",
        tree.scenario_count(),
        tree.node_count(),
        problem.num_columns(),
        problem.num_rows(),
        problem.nnz(),
        dropped
    );
    Ok(problem)
}

/// Column offsets of the strict ancestors of `id`, indexed by stage. Virtual
/// ancestors map to `None`.
fn ancestor_offsets(tree: &ScenarioTree, id: NodeId) -> StochResult<Vec<Option<usize>>> {
    let mut offsets = vec![None; tree.node(id)?.stage()];
    let mut cursor = tree.parent(id)?;
    while let Some(a) = cursor {
        let node = tree.node(a)?;
        if !node.is_virtual() {
            offsets[node.stage()] = Some(node.col_offset());
        }
        cursor = node.parent();
    }
    Ok(offsets)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::{CombineRule, DeterministicModel, StageOverride};

    // stage 0: x (obj 1), row x <= 4
    // stage 1: y (obj 2), row x + 3y >= 2
    fn core() -> CoreTemplate {
        let mut m = DeterministicModel::new();
        let x = m.add_column(0.0, 10.0, 1.0, 0);
        let y = m.add_integer_column(0.0, 10.0, 2.0, 1);
        let r0 = m.add_row(f64::NEG_INFINITY, 4.0, 0);
        let r1 = m.add_row(2.0, f64::INFINITY, 1);
        m.add_coefficient(r0, x, 1.0);
        m.add_coefficient(r1, x, 1.0);
        m.add_coefficient(r1, y, 3.0);
        CoreTemplate::from_deterministic(&m, 2).unwrap()
    }

    fn two_scenarios(core: &CoreTemplate) -> ScenarioTree {
        let mut tree = ScenarioTree::new(2);
        let mut high = StageOverride::new(1);
        high.set_matrix(1, 1, 5.0);
        tree.generate_scenario(
            core,
            vec![Some(StageOverride::new(0)), Some(StageOverride::new(1))],
            0,
            None,
            0.25,
        )
        .unwrap();
        tree.generate_scenario(core, vec![Some(high)], 1, Some(0), 0.75)
            .unwrap();
        tree
    }

    #[test]
    fn test_layout_and_weights() {
        let core = core();
        let mut tree = two_scenarios(&core);
        let p = assemble_deterministic_equivalent(&core, &mut tree, &CombineRule::Replace, 1e-4).unwrap();

        assert_eq!(p.num_columns(), 3);
        assert_eq!(p.num_rows(), 3);
        assert_eq!(p.col_stage, vec![0, 1, 1]);
        assert_eq!(p.row_stage, vec![0, 1, 1]);
        assert!((p.objective[0] - 1.0).abs() < 1e-12);
        assert!((p.objective[1] - 0.5).abs() < 1e-12);
        assert!((p.objective[2] - 1.5).abs() < 1e-12);
        assert_eq!(p.integers, vec![1, 2]);

        // first-stage column shared by both recourse rows
        assert!((p.coefficient(1, 0) - 1.0).abs() < 1e-12);
        assert!((p.coefficient(2, 0) - 1.0).abs() < 1e-12);
        assert!((p.coefficient(1, 1) - 3.0).abs() < 1e-12);
        assert!((p.coefficient(2, 2) - 5.0).abs() < 1e-12);
        assert!(p.coefficient(2, 1).abs() < 1e-12);

        let leaf = tree.leaf(1).unwrap();
        assert_eq!(tree.node(leaf).unwrap().col_offset(), 2);
        assert!((tree.node(leaf).unwrap().model_probability() - 0.75).abs() < 1e-12);
        assert!(tree.is_assembled());
        assert_eq!(p.csr().rows(), 3);
    }

    #[test]
    fn test_round_trip_with_empty_overrides() {
        let core = core();
        let mut tree = ScenarioTree::new(2);
        tree.generate_scenario(
            &core,
            vec![Some(StageOverride::new(0)), Some(StageOverride::new(1))],
            0,
            None,
            1.0,
        )
        .unwrap();
        let p = assemble_deterministic_equivalent(&core, &mut tree, &CombineRule::Replace, 1e-4).unwrap();
        assert_eq!(p.col_lower, core.col_lower());
        assert_eq!(p.col_upper, core.col_upper());
        assert_eq!(p.objective, core.objective());
        assert_eq!(p.row_lower, core.row_lower());
        assert_eq!(p.row_upper, core.row_upper());
        for r in 0..core.num_rows() {
            for c in 0..core.num_columns() {
                assert_eq!(p.coefficient(r, c), core.row(r).get(c));
            }
        }
    }

    #[test]
    fn test_virtual_node_drops_references() {
        let core = core();
        let mut tree = ScenarioTree::new(2);
        tree.generate_scenario(&core, vec![None, Some(StageOverride::new(1))], 0, None, 1.0)
            .unwrap();
        let p = assemble_deterministic_equivalent(&core, &mut tree, &CombineRule::Replace, 1e-4).unwrap();
        assert_eq!(p.num_columns(), 1);
        assert_eq!(p.num_rows(), 1);
        assert_eq!(p.nnz(), 1);
        assert!((p.coefficient(0, 0) - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_probability_sum_checked() {
        let core = core();
        let mut tree = ScenarioTree::new(2);
        tree.generate_scenario(
            &core,
            vec![Some(StageOverride::new(0)), Some(StageOverride::new(1))],
            0,
            None,
            0.6,
        )
        .unwrap();
        assert!(matches!(
            assemble_deterministic_equivalent(&core, &mut tree, &CombineRule::Replace, 1e-4),
            Err(StochError::ProbabilityMismatch { .. })
        ));
        assert!(!tree.is_assembled());
    }

    #[test]
    fn test_empty_tree_rejected() {
        let core = core();
        let mut tree = ScenarioTree::new(2);
        assert!(assemble_deterministic_equivalent(&core, &mut tree, &CombineRule::Add, 1e-4).is_err());
    }
}
