//! Text diagram of a decision tree

use termtree::Tree;

use crate::domain::{DecisionTree, ProbabilityNode};
use crate::util::format::format_currency;

/// Build the diagram: root carries the aggregate, each scenario its
/// expected value, each branch its label, probability and value.
pub fn render_tree(tree: &DecisionTree, symbol: &str) -> Tree<String> {
    if tree.nodes().is_empty() {
        return Tree::new("No scenarios: add one with `evtree node add`".to_string());
    }
    let root = format!(
        "Decision tree ({}): {}",
        method_name(tree),
        format_currency(tree.final_expected_value(), symbol)
    );
    Tree::new(root).with_leaves(
        tree.nodes()
            .iter()
            .enumerate()
            .map(|(i, node)| render_node(i + 1, node, symbol)),
    )
}

fn render_node(number: usize, node: &ProbabilityNode, symbol: &str) -> Tree<String> {
    let label = format!(
        "[{}] {} <{}>  EV {}",
        number,
        node.name(),
        node.id(),
        format_currency(node.expected_value(), symbol)
    );
    Tree::new(label).with_leaves(node.branches().iter().map(|b| {
        format!(
            "{}  P {:.1}%  {}",
            b.label,
            b.probability,
            format_currency(b.value, symbol)
        )
    }))
}

fn method_name(tree: &DecisionTree) -> &'static str {
    match tree.calculation_method() {
        crate::domain::CalculationMethod::Average => "average",
    }
}
