//! Domain layer: entities and business logic
//!
//! This layer is independent of external concerns (no I/O, no CLI, no config loading).

pub mod calculations;
pub mod defaults;
pub mod entities;
pub mod error;

pub use calculations::{
    aggregate, calculate_expected_value, calculate_tree_value, validate_probabilities,
    PROBABILITY_TOLERANCE,
};
pub use defaults::{
    create_initial_node, default_branch_label, default_probabilities, default_scenario_name,
    default_tree, DEFAULT_BRANCH_COUNT,
};
pub use entities::*;
pub use error::DomainError;
