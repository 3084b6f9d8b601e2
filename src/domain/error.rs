//! Domain-level errors (no external dependencies)

use thiserror::Error;

/// Domain errors represent rule violations on the tree model.
///
/// Probability problems are not errors: they are reported as
/// [`ValidationResult`](crate::domain::ValidationResult) data.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("scenario not found: {0}")]
    NodeNotFound(String),

    #[error("scenario {node_id} has no branch {position}")]
    BranchNotFound { node_id: String, position: usize },

    #[error("a scenario needs at least one branch, got {0}")]
    InvalidBranchCount(usize),

    #[error("branch {field} must be a finite number")]
    NonFiniteInput { field: &'static str },

    #[error("expected value of {0} is out of range")]
    NonFiniteResult(String),

    #[error("duplicate scenario id: {0}")]
    DuplicateNodeId(String),

    #[error("scenario {node_id} has duplicate branch id {branch_id}")]
    DuplicateBranchId { node_id: String, branch_id: String },
}
