//! Tests for TreeService: edits keep derived values consistent

use evtree::application::services::TreeService;
use evtree::application::ApplicationError;
use evtree::domain::{
    calculate_expected_value, calculate_tree_value, Branch, BranchEdit, DecisionTree,
    DomainError, ProbabilityNode,
};

fn set_value(value: f64) -> BranchEdit {
    BranchEdit {
        value: Some(value),
        ..Default::default()
    }
}

fn set_probability(probability: f64) -> BranchEdit {
    BranchEdit {
        probability: Some(probability),
        ..Default::default()
    }
}

/// Derived fields must match a fresh computation from the branches.
fn assert_consistent(tree: &DecisionTree) {
    for node in tree.nodes() {
        assert_eq!(
            node.expected_value(),
            calculate_expected_value(node.branches()),
            "stale expected value on {}",
            node.id()
        );
    }
    assert_eq!(tree.final_expected_value(), calculate_tree_value(tree.nodes()));
}

#[test]
fn given_branch_edits_when_applied_then_node_and_tree_values_recomputed() {
    // Arrange
    let mut service = TreeService::default();

    // Act - node1: 60% of 1000, 40% of -200; node2 only value 300 on certain branch
    service.update_branch("node1", 0, &set_probability(60.0)).unwrap();
    service.update_branch("node1", 1, &set_probability(40.0)).unwrap();
    service.update_branch("node1", 2, &set_probability(0.0)).unwrap();
    service.update_branch("node1", 0, &set_value(1000.0)).unwrap();
    service.update_branch("node1", 1, &set_value(-200.0)).unwrap();

    service.update_branch("node2", 0, &set_probability(100.0)).unwrap();
    service.update_branch("node2", 1, &set_probability(0.0)).unwrap();
    service.update_branch("node2", 2, &set_probability(0.0)).unwrap();
    let tree = service.update_branch("node2", 0, &set_value(300.0)).unwrap();

    // Assert
    assert_eq!(tree.node("node1").unwrap().expected_value(), 520.0);
    assert_eq!(tree.node("node2").unwrap().expected_value(), 300.0);
    assert_eq!(tree.final_expected_value(), 410.0);
    assert!(service.all_nodes_valid());
    assert_consistent(service.tree());
}

#[test]
fn given_every_command_when_applied_then_tree_stays_consistent() {
    let mut service = TreeService::default();

    service.update_branch("node1", 0, &set_value(90.0)).unwrap();
    assert_consistent(service.tree());

    let id = service.add_node(Some("Extra"), Some(4)).unwrap();
    assert_consistent(service.tree());

    service.update_branch(&id, 3, &set_value(-400.0)).unwrap();
    assert_consistent(service.tree());

    service.rename_node(&id, "Renamed").unwrap();
    assert_consistent(service.tree());

    service.delete_node("node2").unwrap();
    assert_consistent(service.tree());

    service.recalculate();
    assert_consistent(service.tree());

    service.reset();
    assert_consistent(service.tree());
}

#[test]
fn given_added_node_when_listing_then_appended_with_zero_value() {
    let mut service = TreeService::default();

    let id = service.add_node(None, Some(2)).unwrap();

    let nodes = service.tree().nodes();
    assert_eq!(nodes.len(), 3);
    assert_eq!(nodes[2].id(), id);
    assert_eq!(nodes[2].name(), "Escenario C");
    assert_eq!(nodes[2].branches().len(), 2);
    assert_eq!(nodes[2].branches()[0].label, "Optimista");
    assert_eq!(nodes[2].expected_value(), 0.0);
}

#[test]
fn given_zero_branch_count_when_adding_then_error_and_state_unchanged() {
    let mut service = TreeService::default();
    let before = service.tree().clone();

    let result = service.add_node(None, Some(0));

    assert!(matches!(
        result,
        Err(ApplicationError::Domain(DomainError::InvalidBranchCount(0)))
    ));
    assert_eq!(service.tree(), &before);
}

#[test]
fn given_node_deleted_when_listing_then_others_untouched() {
    let mut service = TreeService::default();
    service.update_branch("node2", 0, &set_value(300.0)).unwrap();
    let node2_before = service.tree().node("node2").unwrap().clone();

    service.delete_node("node1").unwrap();

    assert_eq!(service.tree().nodes(), &[node2_before.clone()]);
    assert_eq!(
        service.tree().final_expected_value(),
        node2_before.expected_value()
    );
}

#[test]
fn given_all_nodes_deleted_when_aggregating_then_zero() {
    let mut service = TreeService::default();
    service.update_branch("node1", 0, &set_value(300.0)).unwrap();

    service.delete_node("node1").unwrap();
    let tree = service.delete_node("node2").unwrap();

    assert!(tree.nodes().is_empty());
    assert_eq!(tree.final_expected_value(), 0.0);
}

#[test]
fn given_unknown_node_when_updating_then_not_found() {
    let mut service = TreeService::default();

    let err = service
        .update_branch("ghost", 0, &set_value(1.0))
        .unwrap_err();

    assert!(matches!(
        err,
        ApplicationError::Domain(DomainError::NodeNotFound(ref id)) if id == "ghost"
    ));
}

#[test]
fn given_whole_node_replacement_when_updating_then_cached_value_ignored() {
    let mut service = TreeService::default();
    let replacement = ProbabilityNode::new(
        "node1",
        "Nuevo",
        vec![
            Branch::new("x", "up", 60.0, 1000.0),
            Branch::new("y", "down", 40.0, -200.0),
        ],
    );

    let tree = service.update_node(&replacement).unwrap();

    let node = tree.node("node1").unwrap();
    assert_eq!(node.name(), "Nuevo");
    assert_eq!(node.expected_value(), 520.0);
    assert_eq!(tree.final_expected_value(), 260.0);
}

#[test]
fn given_invalid_probabilities_when_reporting_then_flagged_but_value_computed() {
    let mut service = TreeService::default();
    service.update_branch("node1", 0, &set_probability(50.0)).unwrap();
    service.update_branch("node1", 1, &set_probability(40.0)).unwrap();
    service.update_branch("node1", 2, &set_probability(0.0)).unwrap();
    service.update_branch("node1", 0, &set_value(100.0)).unwrap();

    let report = service.validation_report();

    assert!(!service.all_nodes_valid());
    assert!(!report[0].result.is_valid);
    assert!(report[0].result.errors[0].contains("90.00%"));
    assert!(report[1].result.is_valid);
    assert_eq!(service.tree().node("node1").unwrap().expected_value(), 50.0);
    assert_eq!(service.tree().final_expected_value(), 25.0);
}

#[test]
fn given_edited_tree_when_reset_then_canonical_default() {
    let mut service = TreeService::default();
    service.add_node(None, None).unwrap();
    service.update_branch("node1", 0, &set_value(5000.0)).unwrap();

    let tree = service.reset();

    assert_eq!(tree, &evtree::domain::default_tree());
    assert_eq!(tree.final_expected_value(), 0.0);
}

#[test]
fn given_label_edit_when_applied_then_only_label_changes() {
    let mut service = TreeService::default();
    let edit = BranchEdit {
        label: Some("Best case".into()),
        ..Default::default()
    };

    service.update_branch("node1", 0, &edit).unwrap();

    let branch = &service.tree().node("node1").unwrap().branches()[0];
    assert_eq!(branch.label, "Best case");
    assert_eq!(branch.id, "node1-1");
    assert_eq!(branch.probability, 100.0 / 3.0);
}

#[test]
fn given_overflowing_branch_edit_when_applied_then_refused_and_state_unchanged() {
    // Arrange
    let mut service = TreeService::default();
    let before = service.tree().clone();
    let edit = BranchEdit {
        probability: Some(200.0),
        value: Some(1.7e308),
        ..Default::default()
    };

    // Act
    let err = service.update_branch("node1", 0, &edit).unwrap_err();

    // Assert
    assert!(matches!(
        err,
        ApplicationError::Domain(DomainError::NonFiniteResult(ref id)) if id == "node1"
    ));
    assert_eq!(service.tree(), &before);
}

#[test]
fn given_nan_value_when_editing_branch_then_refused() {
    let mut service = TreeService::default();

    let err = service
        .update_branch("node2", 1, &set_value(f64::NAN))
        .unwrap_err();

    assert!(matches!(
        err,
        ApplicationError::Domain(DomainError::NonFiniteInput { field: "value" })
    ));
    assert!(service.tree().final_expected_value().is_finite());
}
