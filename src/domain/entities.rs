//! Domain entities: core data structures
//!
//! Derived fields (`expected_value`, `final_expected_value`) are private and
//! only ever written by the constructors below, so every value of these types
//! is internally consistent. Edits produce new values (copy-on-write).
//! Derived fields are written to JSON but never read back: every load path
//! recomputes them from the branches.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::calculations::{aggregate, calculate_expected_value};
use crate::domain::error::DomainError;

/// One outcome of a scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Branch {
    /// Unique within the owning node
    pub id: String,
    /// Percent, nominally 0..=100
    pub probability: f64,
    /// Monetary value, any sign
    pub value: f64,
    pub label: String,
}

impl Branch {
    pub fn new(id: impl Into<String>, label: impl Into<String>, probability: f64, value: f64) -> Self {
        Self {
            id: id.into(),
            probability,
            value,
            label: label.into(),
        }
    }
}

/// Partial update of a branch. `None` fields keep their current value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BranchEdit {
    pub probability: Option<f64>,
    pub value: Option<f64>,
    pub label: Option<String>,
}

impl BranchEdit {
    pub fn is_empty(&self) -> bool {
        self.probability.is_none() && self.value.is_none() && self.label.is_none()
    }

    /// NaN and infinities cannot be stored as JSON numbers.
    pub fn check_finite(&self) -> Result<(), DomainError> {
        if self.probability.is_some_and(|p| !p.is_finite()) {
            return Err(DomainError::NonFiniteInput {
                field: "probability",
            });
        }
        if self.value.is_some_and(|v| !v.is_finite()) {
            return Err(DomainError::NonFiniteInput { field: "value" });
        }
        Ok(())
    }

    fn apply(&self, branch: &Branch) -> Branch {
        Branch {
            id: branch.id.clone(),
            probability: self.probability.unwrap_or(branch.probability),
            value: self.value.unwrap_or(branch.value),
            label: self.label.clone().unwrap_or_else(|| branch.label.clone()),
        }
    }
}

/// A scenario: a named decision point with weighted outcomes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProbabilityNode {
    id: String,
    name: String,
    branches: Vec<Branch>,
    #[serde(skip_deserializing)]
    expected_value: f64,
}

impl ProbabilityNode {
    pub fn new(id: impl Into<String>, name: impl Into<String>, branches: Vec<Branch>) -> Self {
        let expected_value = calculate_expected_value(&branches);
        Self {
            id: id.into(),
            name: name.into(),
            branches,
            expected_value,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn branches(&self) -> &[Branch] {
        &self.branches
    }

    pub fn expected_value(&self) -> f64 {
        self.expected_value
    }

    /// Same node with a new branch set; expected value recomputed.
    pub fn with_branches(&self, branches: Vec<Branch>) -> Self {
        Self::new(self.id.clone(), self.name.clone(), branches)
    }

    pub fn with_name(&self, name: impl Into<String>) -> Self {
        Self::new(self.id.clone(), name, self.branches.clone())
    }

    /// Apply `edit` to the branch at 0-based `position`.
    ///
    /// Fails if the edit carries a non-finite number or the new expected
    /// value overflows.
    pub fn with_branch_edit(&self, position: usize, edit: &BranchEdit) -> Result<Self, DomainError> {
        edit.check_finite()?;
        let current = self
            .branches
            .get(position)
            .ok_or_else(|| DomainError::BranchNotFound {
                node_id: self.id.clone(),
                position: position + 1,
            })?;
        let mut branches = self.branches.clone();
        branches[position] = edit.apply(current);
        let node = self.with_branches(branches);
        node.check_finite()?;
        Ok(node)
    }

    fn check_finite(&self) -> Result<(), DomainError> {
        if self.expected_value.is_finite() {
            Ok(())
        } else {
            Err(DomainError::NonFiniteResult(self.id.clone()))
        }
    }

    fn check_unique_branch_ids(&self) -> Result<(), DomainError> {
        let mut seen = HashSet::new();
        for branch in &self.branches {
            if !seen.insert(branch.id.as_str()) {
                return Err(DomainError::DuplicateBranchId {
                    node_id: self.id.clone(),
                    branch_id: branch.id.clone(),
                });
            }
        }
        Ok(())
    }

    /// Recompute the cached expected value (e.g. after deserialization).
    pub fn recalculated(&self) -> Self {
        self.with_branches(self.branches.clone())
    }
}

/// Strategy used to combine node expected values into the tree value.
///
/// Only the plain average across scenarios exists.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CalculationMethod {
    #[default]
    Average,
}

/// A collection of scenarios plus the aggregate expected value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecisionTree {
    nodes: Vec<ProbabilityNode>,
    #[serde(skip_deserializing)]
    final_expected_value: f64,
    #[serde(default)]
    calculation_method: CalculationMethod,
}

impl DecisionTree {
    pub fn new(nodes: Vec<ProbabilityNode>) -> Self {
        Self::with_method(nodes, CalculationMethod::default())
    }

    pub fn with_method(nodes: Vec<ProbabilityNode>, calculation_method: CalculationMethod) -> Self {
        let final_expected_value = aggregate(calculation_method, &nodes);
        Self {
            nodes,
            final_expected_value,
            calculation_method,
        }
    }

    pub fn nodes(&self) -> &[ProbabilityNode] {
        &self.nodes
    }

    pub fn final_expected_value(&self) -> f64 {
        self.final_expected_value
    }

    pub fn calculation_method(&self) -> CalculationMethod {
        self.calculation_method
    }

    pub fn node(&self, id: &str) -> Option<&ProbabilityNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Replace the node with the same id; its expected value is recomputed.
    ///
    /// Fails if a value of the resulting tree is not finite.
    pub fn with_node_updated(&self, node: &ProbabilityNode) -> Result<Self, DomainError> {
        if self.node(&node.id).is_none() {
            return Err(DomainError::NodeNotFound(node.id.clone()));
        }
        let updated = node.recalculated();
        updated.check_finite()?;
        let nodes = self
            .nodes
            .iter()
            .map(|n| if n.id == updated.id { updated.clone() } else { n.clone() })
            .collect();
        let tree = self.rebuilt(nodes);
        tree.check_finite()?;
        Ok(tree)
    }

    pub fn with_node_added(&self, node: ProbabilityNode) -> Self {
        let mut nodes = self.nodes.clone();
        nodes.push(node.recalculated());
        self.rebuilt(nodes)
    }

    pub fn with_node_removed(&self, id: &str) -> Result<Self, DomainError> {
        if self.node(id).is_none() {
            return Err(DomainError::NodeNotFound(id.to_string()));
        }
        let nodes = self.nodes.iter().filter(|n| n.id != id).cloned().collect();
        Ok(self.rebuilt(nodes))
    }

    /// Recompute every derived field from the branch data.
    pub fn recalculated(&self) -> Self {
        let nodes = self.nodes.iter().map(ProbabilityNode::recalculated).collect();
        self.rebuilt(nodes)
    }

    /// Ids must be unique and every derived value finite.
    ///
    /// Checked on trees that come from outside (import files).
    pub fn check_integrity(&self) -> Result<(), DomainError> {
        let mut seen = HashSet::new();
        for node in &self.nodes {
            if !seen.insert(node.id.as_str()) {
                return Err(DomainError::DuplicateNodeId(node.id.clone()));
            }
            node.check_unique_branch_ids()?;
            node.check_finite()?;
        }
        self.check_finite()
    }

    fn check_finite(&self) -> Result<(), DomainError> {
        if self.final_expected_value.is_finite() {
            Ok(())
        } else {
            Err(DomainError::NonFiniteResult("the tree".into()))
        }
    }

    fn rebuilt(&self, nodes: Vec<ProbabilityNode>) -> Self {
        Self::with_method(nodes, self.calculation_method)
    }
}

/// Outcome of probability validation. Computed on demand, never stored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: Vec<String>,
}

/// Entry of the saved-tree collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedTree {
    pub name: String,
    pub tree: DecisionTree,
    pub saved_at: DateTime<Utc>,
}
