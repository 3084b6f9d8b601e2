//! Default scenario construction
//!
//! New nodes get an even probability split whose last share absorbs the
//! rounding remainder, and zero values.

use crate::domain::entities::{Branch, DecisionTree, ProbabilityNode};
use crate::domain::error::DomainError;

pub const DEFAULT_BRANCH_COUNT: usize = 3;

const NAMED_LABELS: [&str; 3] = ["Optimista", "Probable", "Pesimista"];

/// Even split of 100% over `count` branches.
///
/// The first `count - 1` shares are `100 / count`; the last one is
/// `100 - share * (count - 1)`.
pub fn default_probabilities(count: usize) -> Vec<f64> {
    if count == 0 {
        return Vec::new();
    }
    let share = 100.0 / count as f64;
    let mut probabilities = vec![share; count - 1];
    probabilities.push(100.0 - share * (count - 1) as f64);
    probabilities
}

/// Label for the branch at 0-based `position`.
pub fn default_branch_label(position: usize) -> String {
    NAMED_LABELS
        .get(position)
        .map(|l| l.to_string())
        .unwrap_or_else(|| format!("Rama {}", position + 1))
}

/// Display name for the scenario that would be appended after `existing` nodes.
pub fn default_scenario_name(existing: usize) -> String {
    match u8::try_from(existing) {
        Ok(n) if n < 26 => format!("Escenario {}", char::from(b'A' + n)),
        _ => format!("Escenario {}", existing + 1),
    }
}

/// Build a node with `branch_count` default branches.
///
/// Branch ids are `<id>-<1-based position>`.
pub fn create_initial_node(
    id: &str,
    name: &str,
    branch_count: usize,
) -> Result<ProbabilityNode, DomainError> {
    if branch_count == 0 {
        return Err(DomainError::InvalidBranchCount(branch_count));
    }
    Ok(default_node(id, name, branch_count))
}

/// The canonical two-scenario starting tree.
pub fn default_tree() -> DecisionTree {
    DecisionTree::new(vec![
        default_node("node1", "Escenario A", DEFAULT_BRANCH_COUNT),
        default_node("node2", "Escenario B", DEFAULT_BRANCH_COUNT),
    ])
}

fn default_node(id: &str, name: &str, branch_count: usize) -> ProbabilityNode {
    let branches = default_probabilities(branch_count)
        .into_iter()
        .enumerate()
        .map(|(i, p)| Branch::new(format!("{id}-{}", i + 1), default_branch_label(i), p, 0.0))
        .collect();
    ProbabilityNode::new(id, name, branches)
}
