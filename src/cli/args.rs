//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand, ValueHint};

/// Decision tree evaluator: weighted scenarios, expected values and saved trees
#[derive(Parser, Debug)]
#[command(name = "evtree")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Log verbosity (-d info, -dd debug, -ddd trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub debug: u8,

    /// Directory with a local .evtree.toml (default: cwd)
    #[arg(short = 'C', long, global = true, value_hint = ValueHint::DirPath)]
    pub dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show scenarios, expected values and validation
    Show,

    /// Recompute all expected values
    Calc,

    /// Start over with the two default scenarios
    Reset,

    /// Add, remove and rename scenarios
    Node {
        #[command(subcommand)]
        command: NodeCommands,
    },

    /// Edit scenario outcomes
    Branch {
        #[command(subcommand)]
        command: BranchCommands,
    },

    /// Save the working tree under a name (prompts if omitted)
    Save {
        /// Name of the saved tree
        name: Option<String>,
    },

    /// List saved tree names
    Saved,

    /// Load a saved tree as the working tree
    Open {
        /// Name of the saved tree
        name: String,
    },

    /// Write the working tree as JSON
    Export {
        /// Target file (default: configured export file name)
        #[arg(value_hint = ValueHint::FilePath)]
        file: Option<PathBuf>,
    },

    /// Replace the working tree with a JSON file
    Import {
        /// Source file
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
    },

    /// Manage settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completions
    Completion {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand, Debug)]
pub enum NodeCommands {
    /// Append a scenario with default branches
    Add {
        /// Scenario name (default: next letter)
        #[arg(short, long)]
        name: Option<String>,
        /// Number of branches (default: configured)
        #[arg(short, long)]
        branches: Option<usize>,
    },

    /// Remove a scenario
    Rm {
        /// Scenario id
        id: String,
    },

    /// Rename a scenario
    Rename {
        /// Scenario id
        id: String,
        /// New name
        name: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum BranchCommands {
    /// Change probability, value or label of one branch
    Set {
        /// Scenario id
        node: String,
        /// Branch position (1-based)
        #[arg(value_parser = clap::value_parser!(u64).range(1..))]
        position: u64,
        /// Probability in percent
        #[arg(short, long, allow_hyphen_values = true, value_parser = parse_finite)]
        probability: Option<f64>,
        /// Monetary value
        #[arg(short, long, allow_hyphen_values = true, value_parser = parse_finite)]
        value: Option<f64>,
        /// Branch label
        #[arg(short, long)]
        label: Option<String>,
    },
}

/// Number argument that rejects `inf` and `NaN`.
fn parse_finite(s: &str) -> Result<f64, String> {
    let value: f64 = s.parse().map_err(|e| format!("{e}"))?;
    if value.is_finite() {
        Ok(value)
    } else {
        Err(format!("{s} is not a finite number"))
    }
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show merged config
    Show,

    /// Show config paths
    Path,

    /// Create config template
    Init {
        /// Create global config
        #[arg(short, long)]
        global: bool,
    },
}
