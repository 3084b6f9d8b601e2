//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/evtree/evtree.toml`
//! 3. Local config: `<dir>/.evtree.toml`
//! 4. Environment variables: `EVTREE_*` prefix

use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::application::ApplicationError;
use crate::domain::DEFAULT_BRANCH_COUNT;
use crate::util::path::expand_env_vars;

/// Unified configuration for evtree.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Directory holding the key-value store files
    pub data_dir: PathBuf,
    /// Storage key of the saved-tree collection
    pub storage_key: String,
    /// Storage key of the working tree between invocations
    pub session_key: String,
    /// Default file name for `export`
    pub export_file_name: String,
    /// Prefix for monetary amounts
    pub currency_symbol: String,
    /// Branch count of newly added scenarios
    pub default_branch_count: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            storage_key: "decision-trees".into(),
            session_key: "current-tree".into(),
            export_file_name: "arbol-decision.json".into(),
            currency_symbol: "S/".into(),
            default_branch_count: DEFAULT_BRANCH_COUNT,
        }
    }
}

/// Raw settings for intermediate parsing (`None` = not specified, inherit).
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSettings {
    pub data_dir: Option<PathBuf>,
    pub storage_key: Option<String>,
    pub session_key: Option<String>,
    pub export_file_name: Option<String>,
    pub currency_symbol: Option<String>,
    pub default_branch_count: Option<usize>,
}

/// Default data directory (XDG data dir, falling back to ~/.evtree).
fn default_data_dir() -> PathBuf {
    ProjectDirs::from("", "", "evtree")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .or_else(|| directories::BaseDirs::new().map(|dirs| dirs.home_dir().join(".evtree")))
        .unwrap_or_else(|| PathBuf::from("~/.evtree"))
}

/// Get the XDG config directory for evtree.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "evtree").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("evtree.toml"))
}

/// Get the path to the local config file in a directory.
pub fn local_config_path(dir: &Path) -> PathBuf {
    dir.join(".evtree.toml")
}

/// Load a TOML file into RawSettings for manual merging.
fn load_raw_settings(path: &Path) -> Result<RawSettings, ApplicationError> {
    let content = std::fs::read_to_string(path).map_err(|e| ApplicationError::Config {
        message: format!("read {}: {}", path.display(), e),
    })?;
    toml::from_str(&content).map_err(|e| ApplicationError::Config {
        message: format!("parse {}: {}", path.display(), e),
    })
}

impl Settings {
    /// Expand shell variables and tilde in path-like fields.
    fn expand_paths(&mut self) {
        let expanded = expand_env_vars(self.data_dir.to_string_lossy().as_ref());
        self.data_dir = PathBuf::from(expanded);
    }

    /// Overlay wins where it specifies a value.
    fn merge_with(&self, overlay: &RawSettings) -> Self {
        Self {
            data_dir: overlay
                .data_dir
                .clone()
                .unwrap_or_else(|| self.data_dir.clone()),
            storage_key: overlay
                .storage_key
                .clone()
                .unwrap_or_else(|| self.storage_key.clone()),
            session_key: overlay
                .session_key
                .clone()
                .unwrap_or_else(|| self.session_key.clone()),
            export_file_name: overlay
                .export_file_name
                .clone()
                .unwrap_or_else(|| self.export_file_name.clone()),
            currency_symbol: overlay
                .currency_symbol
                .clone()
                .unwrap_or_else(|| self.currency_symbol.clone()),
            default_branch_count: overlay
                .default_branch_count
                .unwrap_or(self.default_branch_count),
        }
    }

    /// Load settings with layered precedence.
    ///
    /// # Arguments
    /// * `local_dir` - Optional directory containing a `.evtree.toml`
    pub fn load(local_dir: Option<&Path>) -> Result<Self, ApplicationError> {
        let mut current = Self::default();

        if let Some(global_path) = global_config_path() {
            if global_path.exists() {
                let raw = load_raw_settings(&global_path)?;
                current = current.merge_with(&raw);
            }
        }

        if let Some(dir) = local_dir {
            let local_path = local_config_path(dir);
            if local_path.exists() {
                let raw = load_raw_settings(&local_path)?;
                current = current.merge_with(&raw);
            }
        }

        current = Self::apply_env_overrides(current)?;
        current.expand_paths();
        current.validate()?;

        Ok(current)
    }

    /// Apply EVTREE_* environment variables as explicit overrides.
    fn apply_env_overrides(mut settings: Self) -> Result<Self, ApplicationError> {
        let config = Config::builder()
            .add_source(Environment::with_prefix("EVTREE").separator("__"))
            .build()
            .map_err(config_err)?;

        if let Ok(val) = config.get_string("data_dir") {
            settings.data_dir = PathBuf::from(val);
        }
        if let Ok(val) = config.get_string("storage_key") {
            settings.storage_key = val;
        }
        if let Ok(val) = config.get_string("session_key") {
            settings.session_key = val;
        }
        if let Ok(val) = config.get_string("export_file_name") {
            settings.export_file_name = val;
        }
        if let Ok(val) = config.get_string("currency_symbol") {
            settings.currency_symbol = val;
        }
        if let Ok(val) = config.get_string("default_branch_count") {
            settings.default_branch_count = val.parse().map_err(|e| ApplicationError::Config {
                message: format!("EVTREE_DEFAULT_BRANCH_COUNT={val}: {e}"),
            })?;
        }

        Ok(settings)
    }

    fn validate(&self) -> Result<(), ApplicationError> {
        if self.default_branch_count == 0 {
            return Err(ApplicationError::Config {
                message: "default_branch_count must be at least 1".into(),
            });
        }
        if self.storage_key == self.session_key {
            return Err(ApplicationError::Config {
                message: format!(
                    "storage_key and session_key must differ (both '{}')",
                    self.storage_key
                ),
            });
        }
        Ok(())
    }

    /// Show the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ApplicationError> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: format!("serialize config: {e}"),
        })
    }

    /// Generate a template config file.
    pub fn template() -> String {
        r#"# evtree configuration
#
# Locations (by precedence, lowest to highest):
#   Global: ~/.config/evtree/evtree.toml
#   Local:  <dir>/.evtree.toml
#   Env:    EVTREE_* environment variables

# Where the working tree and saved trees are stored
# data_dir = "~/.local/share/evtree"

# Storage keys (one JSON file per key inside data_dir)
# storage_key = "decision-trees"
# session_key = "current-tree"

# Default file name for `evtree export`
# export_file_name = "arbol-decision.json"

# Prefix for monetary amounts
# currency_symbol = "S/"

# Branches of a newly added scenario
# default_branch_count = 3
"#
        .to_string()
    }
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_defaults_then_storage_and_export_names_set() {
        let settings = Settings::default();
        assert_eq!(settings.storage_key, "decision-trees");
        assert_eq!(settings.export_file_name, "arbol-decision.json");
        assert_eq!(settings.currency_symbol, "S/");
        assert_eq!(settings.default_branch_count, 3);
    }

    #[test]
    fn given_partial_overlay_when_merging_then_unspecified_fields_kept() {
        let base = Settings::default();
        let overlay = RawSettings {
            currency_symbol: Some("$".into()),
            default_branch_count: Some(2),
            ..Default::default()
        };

        let merged = base.merge_with(&overlay);

        assert_eq!(merged.currency_symbol, "$");
        assert_eq!(merged.default_branch_count, 2);
        assert_eq!(merged.storage_key, base.storage_key);
        assert_eq!(merged.data_dir, base.data_dir);
    }

    #[test]
    fn given_zero_branch_count_when_validating_then_config_error() {
        let settings = Settings {
            default_branch_count: 0,
            ..Default::default()
        };
        assert!(matches!(
            settings.validate(),
            Err(ApplicationError::Config { .. })
        ));
    }

    #[test]
    fn given_same_keys_when_validating_then_config_error() {
        let settings = Settings {
            session_key: "decision-trees".into(),
            ..Default::default()
        };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn given_template_when_parsed_then_is_valid_toml() {
        let raw: RawSettings = toml::from_str(&Settings::template()).unwrap();
        assert!(raw.data_dir.is_none());
    }
}
