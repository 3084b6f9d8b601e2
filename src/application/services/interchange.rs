//! JSON export/import of decision trees
//!
//! The document is the bare tree record: no envelope, version or checksum.

use std::path::Path;
use std::sync::Arc;

use tracing::{debug, instrument};

use crate::application::services::TreeService;
use crate::application::{ApplicationError, ApplicationResult, IoResultExt};
use crate::domain::DecisionTree;
use crate::infrastructure::traits::FileSystem;

/// Converts trees to and from JSON text and files.
pub struct InterchangeService {
    fs: Arc<dyn FileSystem>,
}

impl InterchangeService {
    pub fn new(fs: Arc<dyn FileSystem>) -> Self {
        Self { fs }
    }

    /// Pretty-printed JSON document for `tree`.
    pub fn export_json(&self, tree: &DecisionTree) -> ApplicationResult<String> {
        serde_json::to_string_pretty(tree).map_err(|e| ApplicationError::OperationFailed {
            context: "serialize decision tree".into(),
            source: Box::new(e),
        })
    }

    /// Parse a JSON document. Derived values are recomputed from the branches.
    ///
    /// Duplicate node or branch ids and overflowing values are rejected.
    pub fn import_json(&self, text: &str) -> ApplicationResult<DecisionTree> {
        let tree: DecisionTree =
            serde_json::from_str(text).map_err(|e| ApplicationError::parse("import", e))?;
        let tree = tree.recalculated();
        tree.check_integrity()?;
        Ok(tree)
    }

    #[instrument(level = "debug", skip(self, tree))]
    pub fn export_to_file(&self, tree: &DecisionTree, path: &Path) -> ApplicationResult<()> {
        let json = self.export_json(tree)?;
        self.fs
            .ensure_parent(path)
            .with_path_context("create export directory", path)?;
        self.fs
            .write(path, &json)
            .with_path_context("write export file", path)?;
        debug!("exported {} scenarios", tree.nodes().len());
        Ok(())
    }

    #[instrument(level = "debug", skip(self))]
    pub fn import_from_file(&self, path: &Path) -> ApplicationResult<DecisionTree> {
        let text = self
            .fs
            .read_to_string(path)
            .with_path_context("read import file", path)?;
        self.import_json(&text).map_err(|e| match e {
            ApplicationError::Parse { source, .. } => {
                ApplicationError::parse(path.display().to_string(), source)
            }
            other => other,
        })
    }

    /// Read `path` and install it as the working tree.
    ///
    /// All or nothing: on any read or parse failure `state` is untouched.
    pub fn import_into<'a>(
        &self,
        state: &'a mut TreeService,
        path: &Path,
    ) -> ApplicationResult<&'a DecisionTree> {
        let tree = self.import_from_file(path)?;
        Ok(state.replace(tree))
    }
}
