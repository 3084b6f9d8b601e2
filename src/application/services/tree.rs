//! Tree state service
//!
//! Owns the working decision tree and applies edits as commands. Every
//! command builds a complete new tree (node values and aggregate already
//! recomputed) and swaps it in only on success, so a failed command leaves
//! the previous state in place and no caller ever sees a stale derived value.

use tracing::{debug, instrument};
use uuid::Uuid;

use crate::application::ApplicationResult;
use crate::domain::{
    create_initial_node, default_scenario_name, default_tree, validate_probabilities, BranchEdit,
    DecisionTree, DomainError, ProbabilityNode, ValidationResult, DEFAULT_BRANCH_COUNT,
};

/// Validation outcome of one scenario.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeValidation {
    pub node_id: String,
    pub node_name: String,
    pub result: ValidationResult,
}

/// Stateful container for the working tree.
#[derive(Debug, Clone)]
pub struct TreeService {
    tree: DecisionTree,
    default_branch_count: usize,
}

impl Default for TreeService {
    fn default() -> Self {
        Self::new(default_tree(), DEFAULT_BRANCH_COUNT)
    }
}

impl TreeService {
    /// Wrap `tree`. Derived fields are recomputed on the way in.
    pub fn new(tree: DecisionTree, default_branch_count: usize) -> Self {
        Self {
            tree: tree.recalculated(),
            default_branch_count,
        }
    }

    pub fn tree(&self) -> &DecisionTree {
        &self.tree
    }

    pub fn into_tree(self) -> DecisionTree {
        self.tree
    }

    fn commit(&mut self, tree: DecisionTree) -> &DecisionTree {
        debug!(
            "commit: nodes={} final_expected_value={}",
            tree.nodes().len(),
            tree.final_expected_value()
        );
        self.tree = tree;
        &self.tree
    }

    /// Replace the node with the same id.
    #[instrument(level = "debug", skip(self, node), fields(node_id = node.id()))]
    pub fn update_node(&mut self, node: &ProbabilityNode) -> ApplicationResult<&DecisionTree> {
        let next = self.tree.with_node_updated(node)?;
        Ok(self.commit(next))
    }

    /// Edit the branch at 0-based `index` of node `node_id`.
    #[instrument(level = "debug", skip(self))]
    pub fn update_branch(
        &mut self,
        node_id: &str,
        index: usize,
        edit: &BranchEdit,
    ) -> ApplicationResult<&DecisionTree> {
        let node = self.find_node(node_id)?.with_branch_edit(index, edit)?;
        let next = self.tree.with_node_updated(&node)?;
        Ok(self.commit(next))
    }

    #[instrument(level = "debug", skip(self))]
    pub fn rename_node(&mut self, node_id: &str, name: &str) -> ApplicationResult<&DecisionTree> {
        let node = self.find_node(node_id)?.with_name(name);
        let next = self.tree.with_node_updated(&node)?;
        Ok(self.commit(next))
    }

    /// Append a default scenario and return its id.
    ///
    /// `name` defaults to the next scenario letter, `branch_count` to the
    /// configured default.
    #[instrument(level = "debug", skip(self))]
    pub fn add_node(
        &mut self,
        name: Option<&str>,
        branch_count: Option<usize>,
    ) -> ApplicationResult<String> {
        let id = self.fresh_node_id();
        let name = name
            .map(str::to_string)
            .unwrap_or_else(|| default_scenario_name(self.tree.nodes().len()));
        let node = create_initial_node(
            &id,
            &name,
            branch_count.unwrap_or(self.default_branch_count),
        )?;
        let next = self.tree.with_node_added(node);
        self.commit(next);
        Ok(id)
    }

    #[instrument(level = "debug", skip(self))]
    pub fn delete_node(&mut self, node_id: &str) -> ApplicationResult<&DecisionTree> {
        let next = self.tree.with_node_removed(node_id)?;
        Ok(self.commit(next))
    }

    /// Recompute every node value and the aggregate.
    pub fn recalculate(&mut self) -> &DecisionTree {
        let next = self.tree.recalculated();
        self.commit(next)
    }

    /// Back to the canonical two-scenario tree.
    pub fn reset(&mut self) -> &DecisionTree {
        self.commit(default_tree())
    }

    /// Install a whole tree (import, open).
    pub fn replace(&mut self, tree: DecisionTree) -> &DecisionTree {
        self.commit(tree.recalculated())
    }

    pub fn validation_report(&self) -> Vec<NodeValidation> {
        self.tree
            .nodes()
            .iter()
            .map(|n| NodeValidation {
                node_id: n.id().to_string(),
                node_name: n.name().to_string(),
                result: validate_probabilities(n.branches()),
            })
            .collect()
    }

    /// `false` means the aggregate is computed from invalid scenarios.
    pub fn all_nodes_valid(&self) -> bool {
        self.tree
            .nodes()
            .iter()
            .all(|n| validate_probabilities(n.branches()).is_valid)
    }

    fn find_node(&self, node_id: &str) -> Result<&ProbabilityNode, DomainError> {
        self.tree
            .node(node_id)
            .ok_or_else(|| DomainError::NodeNotFound(node_id.to_string()))
    }

    fn fresh_node_id(&self) -> String {
        loop {
            let simple = Uuid::new_v4().simple().to_string();
            let id = format!("node-{}", &simple[..8]);
            if self.tree.node(&id).is_none() {
                return id;
            }
        }
    }
}
