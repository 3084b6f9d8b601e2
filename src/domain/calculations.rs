//! Expected-value arithmetic and probability validation
//!
//! All functions are pure and total. Validation is advisory: it never stops
//! a value from being computed.

use crate::domain::entities::{Branch, CalculationMethod, ProbabilityNode, ValidationResult};

/// Allowed distance between a node's probability sum and 100.
pub const PROBABILITY_TOLERANCE: f64 = 0.01;

/// Sum of `probability/100 * value` over all branches. Empty yields 0.
pub fn calculate_expected_value(branches: &[Branch]) -> f64 {
    branches
        .iter()
        .fold(0.0, |sum, b| sum + (b.probability / 100.0) * b.value)
}

/// Check the sum rule, then the range rule for every branch.
///
/// All violations are collected. An empty slice sums to 0 and is therefore
/// invalid: a scenario without outcomes has no meaningful expected value.
pub fn validate_probabilities(branches: &[Branch]) -> ValidationResult {
    let mut errors = Vec::new();
    let total: f64 = branches.iter().fold(0.0, |sum, b| sum + b.probability);

    if (total - 100.0).abs() > PROBABILITY_TOLERANCE {
        errors.push(format!(
            "Las probabilidades deben sumar exactamente 100%. Total actual: {:.2}%",
            total
        ));
    }

    for (i, branch) in branches.iter().enumerate() {
        if branch.probability < 0.0 || branch.probability > 100.0 {
            errors.push(format!(
                "La probabilidad de la rama {} debe estar entre 0% y 100%",
                i + 1
            ));
        }
    }

    ValidationResult {
        is_valid: errors.is_empty(),
        errors,
    }
}

/// Arithmetic mean of the nodes' expected values. Empty yields 0.
pub fn calculate_tree_value(nodes: &[ProbabilityNode]) -> f64 {
    if nodes.is_empty() {
        return 0.0;
    }
    let total = nodes.iter().fold(0.0, |sum, n| sum + n.expected_value());
    total / nodes.len() as f64
}

/// Combine node values according to `method`.
pub fn aggregate(method: CalculationMethod, nodes: &[ProbabilityNode]) -> f64 {
    match method {
        CalculationMethod::Average => calculate_tree_value(nodes),
    }
}
