//! Scenario lookup and solution extraction.

use crate::error::{StochError, StochResult};
use crate::template::CoreTemplate;

use super::arena::{NodeId, ScenarioTree};

impl ScenarioTree {
    /// Leaf node of `scenario`.
    pub fn leaf(&self, scenario: usize) -> StochResult<NodeId> {
        self.leaves
            .get(scenario)
            .copied()
            .ok_or(StochError::UnknownScenario { scenario })
    }

    /// Parent of `id`, `None` at the root.
    pub fn parent(&self, id: NodeId) -> StochResult<Option<NodeId>> {
        Ok(self.node(id)?.parent)
    }

    /// Nodes of `scenario` from the root to the leaf.
    pub fn path(&self, scenario: usize) -> StochResult<Vec<NodeId>> {
        let mut path = Vec::with_capacity(self.stages);
        let mut cursor = Some(self.leaf(scenario)?);
        while let Some(id) = cursor {
            path.push(id);
            cursor = self.nodes[id.0].parent;
        }
        path.reverse();
        Ok(path)
    }

    /// Node of `scenario` at `stage`.
    pub fn node_at_stage(&self, scenario: usize, stage: usize) -> StochResult<NodeId> {
        if stage >= self.stages {
            return Err(StochError::NavigationOutOfRange {
                context: format!("stage {} of a {}-stage tree", stage, self.stages),
            });
        }
        let mut id = self.leaf(scenario)?;
        while self.nodes[id.0].stage > stage {
            id = self.nodes[id.0]
                .parent
                .ok_or_else(|| StochError::NavigationOutOfRange {
                    context: format!("scenario {} has no node at stage {}", scenario, stage),
                })?;
        }
        Ok(id)
    }

    fn placed_node(&self, scenario: usize, stage: usize) -> StochResult<NodeId> {
        if !self.assembled {
            return Err(StochError::NotAttached);
        }
        let id = self.node_at_stage(scenario, stage)?;
        if self.nodes[id.0].is_virtual() {
            return Err(StochError::NavigationOutOfRange {
                context: format!(
                    "scenario {} is virtual at stage {} and has no columns",
                    scenario, stage
                ),
            });
        }
        Ok(id)
    }

    /// Global column of core column `col` (which must belong to `stage`)
    /// for `scenario`.
    pub fn column_index(
        &self,
        core: &CoreTemplate,
        scenario: usize,
        stage: usize,
        col: usize,
    ) -> StochResult<usize> {
        let id = self.placed_node(scenario, stage)?;
        let range = core.columns(stage);
        if !range.contains(&col) {
            return Err(StochError::NavigationOutOfRange {
                context: format!("column {} is not in stage {} ({:?})", col, stage, range),
            });
        }
        Ok(self.nodes[id.0].col_offset + (col - range.start))
    }

    /// Global row of core row `row` (which must belong to `stage`) for
    /// `scenario`.
    pub fn row_index(
        &self,
        core: &CoreTemplate,
        scenario: usize,
        stage: usize,
        row: usize,
    ) -> StochResult<usize> {
        let id = self.placed_node(scenario, stage)?;
        let range = core.rows(stage);
        if !range.contains(&row) {
            return Err(StochError::NavigationOutOfRange {
                context: format!("row {} is not in stage {} ({:?})", row, stage, range),
            });
        }
        Ok(self.nodes[id.0].row_offset + (row - range.start))
    }

    /// Value of core column `col` at `stage` of `scenario` in a flat solution
    /// of the assembled deterministic equivalent.
    pub fn column_value(
        &self,
        core: &CoreTemplate,
        solution: &[f64],
        scenario: usize,
        stage: usize,
        col: usize,
    ) -> StochResult<f64> {
        let index = self.column_index(core, scenario, stage, col)?;
        solution
            .get(index)
            .copied()
            .ok_or_else(|| StochError::NavigationOutOfRange {
                context: format!(
                    "column {} outside a solution of length {}",
                    index,
                    solution.len()
                ),
            })
    }

    /// Slice of `solution` owned by `scenario` at `stage`. Empty for a virtual
    /// node.
    pub fn stage_solution<'a>(
        &self,
        core: &CoreTemplate,
        solution: &'a [f64],
        scenario: usize,
        stage: usize,
    ) -> StochResult<&'a [f64]> {
        if !self.assembled {
            return Err(StochError::NotAttached);
        }
        let id = self.node_at_stage(scenario, stage)?;
        let node = &self.nodes[id.0];
        if node.is_virtual() {
            return Ok(&[]);
        }
        let start = node.col_offset;
        let end = start + core.columns(stage).len();
        solution
            .get(start..end)
            .ok_or_else(|| StochError::NavigationOutOfRange {
                context: format!(
                    "columns {}..{} outside a solution of length {}",
                    start,
                    end,
                    solution.len()
                ),
            })
    }

    /// Full decision vector of `scenario` in template order. Virtual stages
    /// contribute nothing.
    pub fn column_solution(
        &self,
        core: &CoreTemplate,
        solution: &[f64],
        scenario: usize,
    ) -> StochResult<Vec<f64>> {
        let mut values = Vec::with_capacity(core.num_columns());
        for stage in 0..self.stages {
            values.extend_from_slice(self.stage_solution(core, solution, scenario, stage)?);
        }
        Ok(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::{DeterministicModel, StageOverride};

    fn setup() -> (CoreTemplate, ScenarioTree) {
        let mut m = DeterministicModel::new();
        m.add_column(0.0, 1.0, 1.0, 0);
        m.add_column(0.0, 1.0, 1.0, 1);
        m.add_column(0.0, 1.0, 1.0, 1);
        m.add_row(0.0, 1.0, 1);
        let core = CoreTemplate::from_deterministic(&m, 2).unwrap();
        let mut tree = ScenarioTree::new(2);
        let slots = |from: usize| -> Vec<Option<StageOverride>> {
            (from..2).map(|s| Some(StageOverride::new(s))).collect()
        };
        tree.generate_scenario(&core, slots(0), 0, None, 0.5).unwrap();
        tree.generate_scenario(&core, slots(1), 1, Some(0), 0.5).unwrap();
        // offsets as the assembler would lay them out: root, then both leaves
        tree.nodes[0].col_offset = 0;
        tree.nodes[1].col_offset = 1;
        tree.nodes[1].row_offset = 0;
        tree.nodes[2].col_offset = 3;
        tree.nodes[2].row_offset = 1;
        tree.assembled = true;
        (core, tree)
    }

    #[test]
    fn test_path_and_parent() {
        let (_, tree) = setup();
        let leaf = tree.leaf(1).unwrap();
        assert_eq!(tree.path(1).unwrap(), vec![NodeId(0), leaf]);
        assert_eq!(tree.parent(leaf).unwrap(), Some(NodeId(0)));
        assert_eq!(tree.parent(NodeId(0)).unwrap(), None);
        assert_eq!(tree.node_at_stage(1, 0).unwrap(), NodeId(0));
        assert!(tree.leaf(2).is_err());
        assert!(tree.node_at_stage(0, 2).is_err());
    }

    #[test]
    fn test_solution_extraction() {
        let (core, tree) = setup();
        let solution = [7.0, 1.0, 2.0, 3.0, 4.0];
        assert_eq!(tree.column_solution(&core, &solution, 0).unwrap(), vec![7.0, 1.0, 2.0]);
        assert_eq!(tree.column_solution(&core, &solution, 1).unwrap(), vec![7.0, 3.0, 4.0]);
        assert!((tree.column_value(&core, &solution, 1, 1, 2).unwrap() - 4.0).abs() < 1e-12);
        assert_eq!(tree.row_index(&core, 1, 1, 0).unwrap(), 1);
        assert!(tree.column_index(&core, 1, 1, 0).is_err());
        assert!(tree.column_value(&core, &solution[..3], 1, 1, 2).is_err());
    }

    #[test]
    fn test_node_from_another_tree() {
        let (core, small) = setup();
        let mut big = ScenarioTree::new(2);
        big.generate_scenario(&core, vec![Some(StageOverride::new(0)), None], 0, None, 0.25)
            .unwrap();
        for _ in 0..3 {
            big.generate_scenario(&core, vec![None], 1, Some(0), 0.25)
                .unwrap();
        }
        let foreign = big.leaf(3).unwrap();
        assert!(matches!(
            small.parent(foreign),
            Err(StochError::NavigationOutOfRange { .. })
        ));
        assert!(small.node(foreign).is_err());
        assert!(small.override_of(foreign).is_err());
        assert_eq!(big.parent(foreign).unwrap(), Some(NodeId(0)));
    }

    #[test]
    fn test_requires_assembly() {
        let (core, mut tree) = setup();
        tree.assembled = false;
        assert_eq!(
            tree.column_index(&core, 0, 0, 0),
            Err(StochError::NotAttached)
        );
    }
}
