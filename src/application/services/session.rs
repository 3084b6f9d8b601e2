//! Working-tree persistence between invocations
//!
//! The command line has no long-lived screen, so the tree being edited is
//! kept under its own storage key and reloaded by every command.

use std::sync::Arc;

use tracing::debug;

use crate::application::{ApplicationError, ApplicationResult, IoResultExt};
use crate::domain::{default_tree, DecisionTree};
use crate::infrastructure::traits::KeyValueStore;

pub struct SessionService {
    store: Arc<dyn KeyValueStore>,
    session_key: String,
}

impl SessionService {
    pub fn new(store: Arc<dyn KeyValueStore>, session_key: impl Into<String>) -> Self {
        Self {
            store,
            session_key: session_key.into(),
        }
    }

    /// Stored working tree, or the default tree when none exists yet.
    pub fn load(&self) -> ApplicationResult<DecisionTree> {
        let raw = self
            .store
            .get(&self.session_key)
            .with_key_context("read", &self.session_key)?;
        match raw {
            None => {
                debug!("no stored session, starting from default tree");
                Ok(default_tree())
            }
            Some(text) => serde_json::from_str::<DecisionTree>(&text)
                .map(|t| t.recalculated())
                .map_err(|e| {
                    ApplicationError::parse(format!("working tree '{}'", self.session_key), e)
                }),
        }
    }

    pub fn store(&self, tree: &DecisionTree) -> ApplicationResult<()> {
        let json = serde_json::to_string(tree).map_err(|e| ApplicationError::OperationFailed {
            context: "serialize working tree".into(),
            source: Box::new(e),
        })?;
        self.store
            .set(&self.session_key, &json)
            .with_key_context("write", &self.session_key)
    }
}
