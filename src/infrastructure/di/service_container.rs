//! Service container for dependency injection
//!
//! Wires up all services with their dependencies.

use std::sync::Arc;

use crate::application::services::{
    InterchangeService, LibraryService, SessionService, TreeService,
};
use crate::application::ApplicationResult;
use crate::config::Settings;
use crate::domain::default_tree;
use crate::infrastructure::traits::{
    FileKeyValueStore, FileSystem, KeyValueStore, Prompt, RealFileSystem, TerminalPrompt,
};

/// Container holding all application services.
pub struct ServiceContainer {
    /// Application settings
    pub settings: Arc<Settings>,

    /// Filesystem abstraction
    pub fs: Arc<dyn FileSystem>,

    /// Key-value storage (working tree and saved collection)
    pub store: Arc<dyn KeyValueStore>,

    /// User interaction
    pub prompt: Arc<dyn Prompt>,

    pub interchange: InterchangeService,
    pub library: LibraryService,
    pub session: SessionService,
}

impl ServiceContainer {
    /// Create a new service container with real implementations.
    pub fn new(settings: Settings) -> Self {
        let store = Arc::new(FileKeyValueStore::new(settings.data_dir.clone()));
        Self::with_deps(
            settings,
            Arc::new(RealFileSystem),
            store,
            Arc::new(TerminalPrompt),
        )
    }

    /// Create a service container with custom dependencies (for testing).
    pub fn with_deps(
        settings: Settings,
        fs: Arc<dyn FileSystem>,
        store: Arc<dyn KeyValueStore>,
        prompt: Arc<dyn Prompt>,
    ) -> Self {
        let settings = Arc::new(settings);
        let interchange = InterchangeService::new(fs.clone());
        let library = LibraryService::new(store.clone(), settings.storage_key.clone());
        let session = SessionService::new(store.clone(), settings.session_key.clone());

        Self {
            settings,
            fs,
            store,
            prompt,
            interchange,
            library,
            session,
        }
    }

    /// Tree state seeded from the stored working tree.
    pub fn tree_service(&self) -> ApplicationResult<TreeService> {
        let tree = self.session.load()?;
        Ok(TreeService::new(tree, self.settings.default_branch_count))
    }

    /// Tree state seeded from the default tree, ignoring storage.
    pub fn default_tree_service(&self) -> TreeService {
        TreeService::new(default_tree(), self.settings.default_branch_count)
    }

    /// Persist the tree held by `state` as the working tree.
    pub fn commit(&self, state: &TreeService) -> ApplicationResult<()> {
        self.session.store(state.tree())
    }
}
