//! Scenario tree: arena storage, minimal-tree construction and navigation.

mod arena;
mod builder;
mod navigator;

pub use arena::{NodeId, ScenarioTree, TreeNode};
pub use builder::{ScenarioSpec, build_tree};
