//! Arena-backed scenario tree.

use crate::error::{StochError, StochResult, check_probability_sum};
use crate::stats::StatsError;
use crate::template::{CoreTemplate, StageOverride};

/// Index of a node in its [`ScenarioTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// One (scenario-path prefix, stage) pair.
#[derive(Debug, Clone, PartialEq)]
pub struct TreeNode {
    pub(crate) stage: usize,
    pub(crate) data: Option<usize>,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) probability: f64,
    pub(crate) model_probability: f64,
    pub(crate) col_offset: usize,
    pub(crate) row_offset: usize,
    pub(crate) scenario: usize,
}

impl TreeNode {
    pub fn stage(&self) -> usize {
        self.stage
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Accumulated probability of every scenario passing through this node.
    pub fn probability(&self) -> f64 {
        self.probability
    }

    /// Probability normalised by the total tree probability. Set on assembly.
    pub fn model_probability(&self) -> f64 {
        self.model_probability
    }

    /// First global column of this node. Set on assembly.
    pub fn col_offset(&self) -> usize {
        self.col_offset
    }

    /// First global row of this node. Set on assembly.
    pub fn row_offset(&self) -> usize {
        self.row_offset
    }

    /// Scenario that created this node.
    pub fn scenario(&self) -> usize {
        self.scenario
    }

    /// A virtual node keeps the tree shape but contributes no columns or rows.
    pub fn is_virtual(&self) -> bool {
        self.data.is_none()
    }
}

/// Scenario tree owning its nodes and their overrides.
///
/// Scenario `k` is the path ending at `leaves[k]`. Nodes are created by
/// [`ScenarioTree::generate_scenario`] and only dropped with the tree.
#[derive(Debug, Clone)]
pub struct ScenarioTree {
    pub(crate) stages: usize,
    pub(crate) nodes: Vec<TreeNode>,
    pub(crate) overrides: Vec<StageOverride>,
    pub(crate) leaves: Vec<NodeId>,
    pub(crate) scenario_probability: Vec<f64>,
    pub(crate) assembled: bool,
}

impl ScenarioTree {
    pub fn new(stages: usize) -> Self {
        Self {
            stages,
            nodes: Vec::new(),
            overrides: Vec::new(),
            leaves: Vec::new(),
            scenario_probability: Vec::new(),
            assembled: false,
        }
    }

    pub fn stages(&self) -> usize {
        self.stages
    }

    pub fn scenario_count(&self) -> usize {
        self.leaves.len()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.leaves.is_empty()
    }

    /// Node `id`; an id from another tree that is out of range here is a
    /// navigation error.
    pub fn node(&self, id: NodeId) -> StochResult<&TreeNode> {
        self.nodes
            .get(id.0)
            .ok_or_else(|| StochError::NavigationOutOfRange {
                context: format!("node {} of a {}-node tree", id.0, self.nodes.len()),
            })
    }

    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &TreeNode)> {
        self.nodes.iter().enumerate().map(|(i, n)| (NodeId(i), n))
    }

    /// Override carried by `id`, `None` for a virtual node.
    pub fn override_of(&self, id: NodeId) -> StochResult<Option<&StageOverride>> {
        Ok(self.node(id)?.data.and_then(|d| self.overrides.get(d)))
    }

    pub fn scenario_probability(&self, scenario: usize) -> StochResult<f64> {
        self.scenario_probability
            .get(scenario)
            .copied()
            .ok_or(StochError::UnknownScenario { scenario })
    }

    pub fn total_probability(&self) -> f64 {
        self.scenario_probability.iter().sum()
    }

    pub fn check_probability(&self, tolerance: f64) -> StochResult<()> {
        check_probability_sum(self.total_probability(), tolerance, "scenario tree")
    }

    /// True once the assembler has written offsets for the current tree.
    pub fn is_assembled(&self) -> bool {
        self.assembled
    }

    /// Add a scenario and return its index.
    ///
    /// The first scenario branches at stage 0 without an ancestor and gives
    /// one override slot per stage. Every later scenario branches at a stage
    /// in `1..stages` from an existing `ancestor`, gives `stages - branch_stage`
    /// slots and shares the ancestor's nodes below `branch_stage`. A `None`
    /// slot creates a virtual node.
    pub fn generate_scenario(
        &mut self,
        core: &CoreTemplate,
        overrides: Vec<Option<StageOverride>>,
        branch_stage: usize,
        ancestor: Option<usize>,
        probability: f64,
    ) -> StochResult<usize> {
        if core.stages() != self.stages {
            return Err(StochError::InvalidInput {
                context: format!(
                    "tree has {} stages but the template has {}",
                    self.stages,
                    core.stages()
                ),
            });
        }
        if !(probability.is_finite() && (0.0..=1.0).contains(&probability)) {
            return Err(StatsError::InvalidProbability { value: probability }.into());
        }

        let shared = match (self.leaves.is_empty(), ancestor) {
            (true, None) if branch_stage == 0 => Vec::new(),
            (true, _) => {
                return Err(StochError::InvalidInput {
                    context: "the first scenario must branch at stage 0 without an ancestor"
                        .to_string(),
                });
            }
            (false, _) if branch_stage == 0 || branch_stage >= self.stages => {
                return Err(StochError::BranchStageOutOfRange {
                    stage: branch_stage,
                    stages: self.stages,
                });
            }
            (false, None) => {
                return Err(StochError::InvalidInput {
                    context: format!(
                        "a scenario branching at stage {} needs an ancestor",
                        branch_stage
                    ),
                });
            }
            (false, Some(a)) => {
                let mut path = self.path(a)?;
                path.truncate(branch_stage);
                path
            }
        };

        let expected = self.stages - branch_stage;
        if overrides.len() != expected {
            return Err(StochError::InvalidInput {
                context: format!(
                    "scenario branching at stage {} needs {} override slots, got {}",
                    branch_stage,
                    expected,
                    overrides.len()
                ),
            });
        }
        for (offset, patch) in overrides.iter().enumerate() {
            if let Some(patch) = patch {
                if patch.stage() != branch_stage + offset {
                    return Err(StochError::InvalidInput {
                        context: format!(
                            "override for stage {} given in slot for stage {}",
                            patch.stage(),
                            branch_stage + offset
                        ),
                    });
                }
                patch.validate(core)?;
            }
        }

        let scenario = self.leaves.len();
        for id in &shared {
            self.nodes[id.0].probability += probability;
        }
        let mut parent = shared.last().copied();
        for (offset, patch) in overrides.into_iter().enumerate() {
            let data = patch.map(|p| {
                self.overrides.push(p);
                self.overrides.len() - 1
            });
            let id = NodeId(self.nodes.len());
            self.nodes.push(TreeNode {
                stage: branch_stage + offset,
                data,
                parent,
                children: Vec::new(),
                probability,
                model_probability: 0.0,
                col_offset: 0,
                row_offset: 0,
                scenario,
            });
            if let Some(p) = parent {
                self.nodes[p.0].children.push(id);
            }
            parent = Some(id);
        }

        // overrides.len() == stages - branch_stage >= 1
        let leaf = parent.ok_or(StochError::InvalidInput {
            context: "scenario without nodes".to_string(),
        })?;
        self.leaves.push(leaf);
        self.scenario_probability.push(probability);
        self.assembled = false;
        Ok(scenario)
    }
}
