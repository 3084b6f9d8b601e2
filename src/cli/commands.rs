//! Command dispatch
//!
//! Each invocation loads the working tree, applies one command and writes
//! the tree back only if the command succeeded.

use std::io;
use std::path::{Path, PathBuf};

use clap::CommandFactory;
use tracing::{debug, instrument};

use crate::application::services::{SaveOutcome, TreeService};
use crate::cli::args::{BranchCommands, Cli, Commands, ConfigCommands, NodeCommands};
use crate::cli::output;
use crate::cli::view::render_tree;
use crate::cli::{CliError, CliResult};
use crate::config::{global_config_path, local_config_path, Settings};
use crate::domain::BranchEdit;
use crate::infrastructure::di::ServiceContainer;
use crate::infrastructure::InfraError;
use crate::util::format::format_currency;

pub fn execute_command(cli: &Cli) -> CliResult<()> {
    let dir = match &cli.dir {
        Some(dir) => dir.clone(),
        None => std::env::current_dir()
            .map_err(|e| InfraError::io("resolve current directory", e))?,
    };

    match &cli.command {
        Some(Commands::Completion { shell }) => {
            let mut cmd = Cli::command();
            clap_complete::generate(*shell, &mut cmd, "evtree", &mut io::stdout());
            return Ok(());
        }
        Some(Commands::Config { command }) => return config_command(command, &dir),
        _ => {}
    }

    let settings = Settings::load(Some(&dir))?;
    debug!("data_dir={}", settings.data_dir.display());
    let container = ServiceContainer::new(settings);
    run(&container, cli.command.as_ref())
}

/// Run a tree command against the services in `container`.
pub fn run(container: &ServiceContainer, command: Option<&Commands>) -> CliResult<()> {
    // Whole-tree replacements never read the stored working tree.
    let mut state = match command {
        Some(Commands::Reset | Commands::Open { .. } | Commands::Import { .. }) => {
            container.default_tree_service()
        }
        _ => container.tree_service()?,
    };

    match command {
        None | Some(Commands::Show) => show(container, &state),
        Some(Commands::Calc) => {
            state.recalculate();
            container.commit(&state)?;
            show(container, &state)
        }
        Some(Commands::Reset) => {
            state.reset();
            container.commit(&state)?;
            output::success("tree reset to the default scenarios");
            Ok(())
        }
        Some(Commands::Node { command }) => node_command(container, &mut state, command),
        Some(Commands::Branch { command }) => branch_command(container, &mut state, command),
        Some(Commands::Save { name }) => save(container, &state, name.as_deref()),
        Some(Commands::Saved) => saved(container),
        Some(Commands::Open { name }) => open(container, &mut state, name),
        Some(Commands::Export { file }) => export(container, &state, file.as_deref()),
        Some(Commands::Import { file }) => import(container, &mut state, file),
        Some(Commands::Config { .. }) | Some(Commands::Completion { .. }) => Err(CliError::Usage(
            "command does not operate on the working tree".into(),
        )),
    }
}

fn show(container: &ServiceContainer, state: &TreeService) -> CliResult<()> {
    let symbol = &container.settings.currency_symbol;
    output::info(&render_tree(state.tree(), symbol));

    for report in state.validation_report() {
        if report.result.is_valid {
            continue;
        }
        output::header(&format!("{} <{}>", report.node_name, report.node_id));
        for error in &report.result.errors {
            output::failure(error);
        }
    }

    output::action(
        "Final expected value",
        &format_currency(state.tree().final_expected_value(), symbol),
    );
    if !state.all_nodes_valid() {
        output::warning("correct the validation errors before trusting this result");
    }
    Ok(())
}

#[instrument(level = "debug", skip(container, state))]
fn node_command(
    container: &ServiceContainer,
    state: &mut TreeService,
    command: &NodeCommands,
) -> CliResult<()> {
    match command {
        NodeCommands::Add { name, branches } => {
            let id = state.add_node(name.as_deref(), *branches)?;
            container.commit(state)?;
            output::action("Added scenario", &id);
        }
        NodeCommands::Rm { id } => {
            if state.tree().nodes().len() <= 1 {
                return Err(CliError::Usage("cannot remove the last scenario".into()));
            }
            state.delete_node(id)?;
            container.commit(state)?;
            output::action("Removed scenario", id);
        }
        NodeCommands::Rename { id, name } => {
            state.rename_node(id, name)?;
            container.commit(state)?;
            output::action("Renamed scenario", &format!("{id} -> {name}"));
        }
    }
    Ok(())
}

#[instrument(level = "debug", skip(container, state))]
fn branch_command(
    container: &ServiceContainer,
    state: &mut TreeService,
    command: &BranchCommands,
) -> CliResult<()> {
    let BranchCommands::Set {
        node,
        position,
        probability,
        value,
        label,
    } = command;

    let edit = BranchEdit {
        probability: *probability,
        value: *value,
        label: label.clone(),
    };
    if edit.is_empty() {
        return Err(CliError::Usage(
            "nothing to change: pass --probability, --value or --label".into(),
        ));
    }
    let index = position
        .checked_sub(1)
        .and_then(|i| usize::try_from(i).ok())
        .ok_or_else(|| CliError::InvalidArgs(format!("invalid branch position {position}")))?;

    state.update_branch(node, index, &edit)?;
    container.commit(state)?;

    let symbol = &container.settings.currency_symbol;
    if let Some(updated) = state.tree().node(node) {
        output::action(
            updated.name(),
            &format!("EV {}", format_currency(updated.expected_value(), symbol)),
        );
    }
    if let Some(report) = state
        .validation_report()
        .into_iter()
        .find(|r| r.node_id == *node)
    {
        for error in &report.result.errors {
            output::failure(error);
        }
    }
    Ok(())
}

fn save(container: &ServiceContainer, state: &TreeService, name: Option<&str>) -> CliResult<()> {
    let outcome = match name {
        Some(name) => container.library.save(name, state.tree())?,
        None => container
            .library
            .save_with_prompt(container.prompt.as_ref(), state.tree())?,
    };
    match outcome {
        SaveOutcome::Saved(entry) => {
            output::success(&format!(
                "saved \"{}\" at {}",
                entry.name,
                entry.saved_at.to_rfc3339()
            ));
        }
        SaveOutcome::Cancelled => output::info("save cancelled"),
    }
    Ok(())
}

fn saved(container: &ServiceContainer) -> CliResult<()> {
    let names = container.library.list_names()?;
    if names.is_empty() {
        output::info("no saved trees");
        return Ok(());
    }
    output::header(&format!("Saved trees ({})", names.len()));
    for name in names {
        output::detail(&name);
    }
    Ok(())
}

fn open(container: &ServiceContainer, state: &mut TreeService, name: &str) -> CliResult<()> {
    let entry = container
        .library
        .find(name)?
        .ok_or_else(|| CliError::InvalidArgs(format!("no saved tree named '{name}'")))?;
    state.replace(entry.tree);
    container.commit(state)?;
    output::success(&format!("opened \"{}\"", entry.name));
    Ok(())
}

fn export(container: &ServiceContainer, state: &TreeService, file: Option<&Path>) -> CliResult<()> {
    let path = file
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(&container.settings.export_file_name));
    container.interchange.export_to_file(state.tree(), &path)?;
    output::action("Exported", &path.display());
    Ok(())
}

fn import(container: &ServiceContainer, state: &mut TreeService, file: &Path) -> CliResult<()> {
    container.interchange.import_into(state, file)?;
    container.commit(state)?;
    output::success(&format!(
        "imported {} scenarios from {}",
        state.tree().nodes().len(),
        file.display()
    ));
    Ok(())
}

fn config_command(command: &ConfigCommands, dir: &Path) -> CliResult<()> {
    match command {
        ConfigCommands::Show => {
            let settings = Settings::load(Some(dir))?;
            output::info(&settings.to_toml()?);
        }
        ConfigCommands::Path => {
            let global = global_config_path()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "<unavailable>".into());
            output::action("global", &global);
            output::action("local", &local_config_path(dir).display());
        }
        ConfigCommands::Init { global } => {
            let path = if *global {
                global_config_path().ok_or_else(|| {
                    CliError::Usage("no config directory available on this system".into())
                })?
            } else {
                local_config_path(dir)
            };
            if path.exists() {
                return Err(CliError::Usage(format!(
                    "config already exists: {}",
                    path.display()
                )));
            }
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| InfraError::io(format!("create {}", parent.display()), e))?;
            }
            std::fs::write(&path, Settings::template())
                .map_err(|e| InfraError::io(format!("write {}", path.display()), e))?;
            output::success(&format!("created {}", path.display()));
        }
    }
    Ok(())
}
