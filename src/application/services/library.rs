//! Saved-tree collection
//!
//! All saved trees live as one JSON array under a single storage key. Saving
//! is read-modify-write without locking: concurrent writers lose updates
//! (last write wins).

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info, instrument};

use crate::application::{ApplicationError, ApplicationResult, IoResultExt};
use crate::domain::{DecisionTree, SavedTree};
use crate::infrastructure::traits::{KeyValueStore, Prompt};

const SAVE_QUESTION: &str = "Name for this decision tree:";

/// Result of a save request. Cancelling is not an error.
#[derive(Debug, Clone, PartialEq)]
pub enum SaveOutcome {
    Saved(SavedTree),
    Cancelled,
}

/// Service managing the named collection of saved trees.
pub struct LibraryService {
    store: Arc<dyn KeyValueStore>,
    storage_key: String,
}

impl LibraryService {
    pub fn new(store: Arc<dyn KeyValueStore>, storage_key: impl Into<String>) -> Self {
        Self {
            store,
            storage_key: storage_key.into(),
        }
    }

    /// All saved entries in storage order. A missing key is an empty collection.
    pub fn entries(&self) -> ApplicationResult<Vec<SavedTree>> {
        let raw = self
            .store
            .get(&self.storage_key)
            .with_key_context("read", &self.storage_key)?;
        match raw {
            None => Ok(Vec::new()),
            Some(text) => serde_json::from_str::<Vec<SavedTree>>(&text)
                .map(|entries| {
                    entries
                        .into_iter()
                        .map(|e| SavedTree {
                            tree: e.tree.recalculated(),
                            ..e
                        })
                        .collect()
                })
                .map_err(|e| {
                    ApplicationError::parse(format!("saved collection '{}'", self.storage_key), e)
                }),
        }
    }

    /// Names of saved trees, in storage order (duplicates kept).
    pub fn list_names(&self) -> ApplicationResult<Vec<String>> {
        Ok(self.entries()?.into_iter().map(|e| e.name).collect())
    }

    /// Most recently saved entry called `name`.
    pub fn find(&self, name: &str) -> ApplicationResult<Option<SavedTree>> {
        Ok(self.entries()?.into_iter().rev().find(|e| e.name == name))
    }

    /// Append `tree` under `name`, timestamped now.
    ///
    /// A blank name cancels the save.
    pub fn save(&self, name: &str, tree: &DecisionTree) -> ApplicationResult<SaveOutcome> {
        self.save_at(name, tree, Utc::now())
    }

    #[instrument(level = "debug", skip(self, tree))]
    pub fn save_at(
        &self,
        name: &str,
        tree: &DecisionTree,
        saved_at: DateTime<Utc>,
    ) -> ApplicationResult<SaveOutcome> {
        let name = name.trim();
        if name.is_empty() {
            debug!("save cancelled: blank name");
            return Ok(SaveOutcome::Cancelled);
        }

        let mut entries = self.entries()?;
        let entry = SavedTree {
            name: name.to_string(),
            tree: tree.clone(),
            saved_at,
        };
        entries.push(entry.clone());

        let json = serde_json::to_string(&entries).map_err(|e| ApplicationError::OperationFailed {
            context: "serialize saved collection".into(),
            source: Box::new(e),
        })?;
        self.store
            .set(&self.storage_key, &json)
            .with_key_context("write", &self.storage_key)?;

        info!("saved tree '{}' ({} entries)", name, entries.len());
        Ok(SaveOutcome::Saved(entry))
    }

    /// Ask the user for a name, then save. No answer means cancelled.
    pub fn save_with_prompt(
        &self,
        prompt: &dyn Prompt,
        tree: &DecisionTree,
    ) -> ApplicationResult<SaveOutcome> {
        let answer = prompt
            .ask(SAVE_QUESTION)
            .map_err(|e| ApplicationError::OperationFailed {
                context: "read tree name".into(),
                source: Box::new(e),
            })?;
        let Some(name) = answer else {
            debug!("save cancelled by user");
            return Ok(SaveOutcome::Cancelled);
        };

        let outcome = self.save(&name, tree)?;
        if let SaveOutcome::Saved(entry) = &outcome {
            prompt.notify(&format!("decision tree \"{}\" saved", entry.name));
        }
        Ok(outcome)
    }
}
