//! End-to-end tests of command dispatch against in-memory ports

use std::io;
use std::sync::Arc;

use tempfile::TempDir;

use evtree::cli::args::{BranchCommands, Commands, NodeCommands};
use evtree::cli::commands::run;
use evtree::config::Settings;
use evtree::exitcode;
use evtree::infrastructure::di::ServiceContainer;
use evtree::infrastructure::traits::{KeyValueStore, MemoryKeyValueStore, Prompt, RealFileSystem};

/// Prompt that always declines
struct DecliningPrompt;

impl Prompt for DecliningPrompt {
    fn ask(&self, _question: &str) -> io::Result<Option<String>> {
        Ok(None)
    }

    fn notify(&self, _message: &str) {}
}

fn container() -> (ServiceContainer, Arc<MemoryKeyValueStore>) {
    let store = Arc::new(MemoryKeyValueStore::new());
    let container = ServiceContainer::with_deps(
        Settings::default(),
        Arc::new(RealFileSystem),
        store.clone(),
        Arc::new(DecliningPrompt),
    );
    (container, store)
}

fn set_branch(node: &str, position: u64, probability: Option<f64>, value: Option<f64>) -> Commands {
    Commands::Branch {
        command: BranchCommands::Set {
            node: node.into(),
            position,
            probability,
            value,
            label: None,
        },
    }
}

#[test]
fn given_fresh_store_when_showing_then_nothing_persisted() {
    let (container, store) = container();

    run(&container, Some(&Commands::Show)).unwrap();

    assert_eq!(store.get("current-tree").unwrap(), None);
}

#[test]
fn given_branch_commands_when_run_then_working_tree_persisted_with_values() {
    // Arrange
    let (container, _store) = container();

    // Act
    for cmd in [
        set_branch("node1", 1, Some(60.0), Some(1000.0)),
        set_branch("node1", 2, Some(40.0), Some(-200.0)),
        set_branch("node1", 3, Some(0.0), None),
        set_branch("node2", 1, Some(100.0), Some(300.0)),
        set_branch("node2", 2, Some(0.0), None),
        set_branch("node2", 3, Some(0.0), None),
    ] {
        run(&container, Some(&cmd)).unwrap();
    }

    // Assert
    let tree = container.session.load().unwrap();
    assert_eq!(tree.node("node1").unwrap().expected_value(), 520.0);
    assert_eq!(tree.final_expected_value(), 410.0);
}

#[test]
fn given_empty_branch_edit_when_run_then_usage_error() {
    let (container, _store) = container();

    let err = run(&container, Some(&set_branch("node1", 1, None, None))).unwrap_err();

    assert_eq!(err.exit_code(), exitcode::USAGE);
}

#[test]
fn given_unknown_scenario_when_editing_then_data_error() {
    let (container, store) = container();

    let err = run(&container, Some(&set_branch("ghost", 1, Some(5.0), None))).unwrap_err();

    assert_eq!(err.exit_code(), exitcode::DATAERR);
    assert_eq!(store.get("current-tree").unwrap(), None);
}

#[test]
fn given_single_scenario_when_removing_it_then_refused() {
    let (container, _store) = container();
    let remove = |id: &str| Commands::Node {
        command: NodeCommands::Rm { id: id.into() },
    };

    run(&container, Some(&remove("node1"))).unwrap();
    let err = run(&container, Some(&remove("node2"))).unwrap_err();

    assert_eq!(err.exit_code(), exitcode::USAGE);
    assert_eq!(container.session.load().unwrap().nodes().len(), 1);
}

#[test]
fn given_declined_prompt_when_saving_then_nothing_saved() {
    let (container, _store) = container();

    run(&container, Some(&Commands::Save { name: None })).unwrap();

    assert!(container.library.list_names().unwrap().is_empty());
}

#[test]
fn given_saved_tree_when_reset_and_opened_then_restored() {
    let (container, _store) = container();
    run(
        &container,
        Some(&Commands::Node {
            command: NodeCommands::Add {
                name: Some("Tercero".into()),
                branches: Some(2),
            },
        }),
    )
    .unwrap();
    run(&container, Some(&Commands::Save { name: Some("three".into()) })).unwrap();
    run(&container, Some(&Commands::Reset)).unwrap();
    assert_eq!(container.session.load().unwrap().nodes().len(), 2);

    run(&container, Some(&Commands::Open { name: "three".into() })).unwrap();

    let tree = container.session.load().unwrap();
    assert_eq!(tree.nodes().len(), 3);
    assert_eq!(tree.nodes()[2].name(), "Tercero");
}

#[test]
fn given_malformed_import_when_run_then_data_error_and_session_untouched() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("bad.json");
    std::fs::write(&path, "{not json").unwrap();
    let (container, _store) = container();
    run(&container, Some(&set_branch("node1", 1, None, Some(7.0)))).unwrap();
    let before = container.session.load().unwrap();

    let err = run(&container, Some(&Commands::Import { file: path })).unwrap_err();

    assert_eq!(err.exit_code(), exitcode::DATAERR);
    assert_eq!(container.session.load().unwrap(), before);
}

#[test]
fn given_export_then_import_when_run_then_same_working_tree() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("arbol-decision.json");
    let (container, _store) = container();
    run(&container, Some(&set_branch("node2", 2, None, Some(-50.5)))).unwrap();
    let exported = container.session.load().unwrap();

    run(&container, Some(&Commands::Export { file: Some(path.clone()) })).unwrap();
    run(&container, Some(&Commands::Reset)).unwrap();
    run(&container, Some(&Commands::Import { file: path })).unwrap();

    assert_eq!(container.session.load().unwrap(), exported);
}

#[test]
fn given_unreadable_working_tree_when_reset_then_recovered() {
    // Arrange
    let (container, store) = container();
    store.set("current-tree", "{corrupt").unwrap();
    let err = run(&container, Some(&Commands::Show)).unwrap_err();
    assert_eq!(err.exit_code(), exitcode::DATAERR);

    // Act
    run(&container, Some(&Commands::Reset)).unwrap();

    // Assert
    let tree = container.session.load().unwrap();
    assert_eq!(tree.nodes().len(), 2);
    assert_eq!(tree.nodes()[0].id(), "node1");
}

#[test]
fn given_unreadable_working_tree_when_importing_then_replaced() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("arbol-decision.json");
    let (container, store) = container();
    run(&container, Some(&set_branch("node1", 1, None, Some(42.0)))).unwrap();
    run(&container, Some(&Commands::Export { file: Some(path.clone()) })).unwrap();
    let exported = container.session.load().unwrap();
    store.set("current-tree", "{corrupt").unwrap();

    run(&container, Some(&Commands::Import { file: path })).unwrap();

    assert_eq!(container.session.load().unwrap(), exported);
}

#[test]
fn given_overflowing_branch_edit_when_run_then_refused_and_tree_still_loads() {
    // Arrange
    let (container, _store) = container();
    run(&container, Some(&set_branch("node1", 1, None, Some(5.0)))).unwrap();
    let before = container.session.load().unwrap();

    // Act
    let err = run(&container, Some(&set_branch("node1", 1, Some(200.0), Some(1.7e308)))).unwrap_err();

    // Assert
    assert_eq!(err.exit_code(), exitcode::DATAERR);
    assert_eq!(container.session.load().unwrap(), before);
    run(&container, Some(&Commands::Show)).unwrap();
}
