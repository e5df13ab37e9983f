//! Application state management

use std::sync::Arc;

use tokio::sync::{Mutex, MutexGuard};
use verifile_core::{
    Config, FileProvider, HashProvider, LocalFileProvider, Sha256Hasher, TreeCoordinator,
};

/// Error type for state initialization
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("Failed to open storage at {path}: {source}")]
    Storage {
        path: String,
        #[source]
        source: verifile_core::Error,
    },

    #[error("Failed to build the initial Merkle tree: {0}")]
    InitialBuild(#[source] verifile_core::Error),
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    files: Arc<dyn FileProvider>,
    coordinator: TreeCoordinator,
    upload_lock: Mutex<()>,
}

impl AppState {
    /// Open local storage from the config and build the tree for any files
    /// already present
    pub async fn open(config: &Config) -> Result<Self, StateError> {
        let files = LocalFileProvider::new(&config.storage.path)
            .await
            .map_err(|source| StateError::Storage {
                path: config.storage.path.display().to_string(),
                source,
            })?;

        let state = Self::new(Arc::new(files), Arc::new(Sha256Hasher));
        state.initial_build().await?;
        Ok(state)
    }

    /// Create state over an existing file provider; no tree is built yet
    pub fn new(files: Arc<dyn FileProvider>, hasher: Arc<dyn HashProvider>) -> Self {
        let coordinator = TreeCoordinator::new(files.clone(), hasher);
        Self {
            inner: Arc::new(AppStateInner {
                files,
                coordinator,
                upload_lock: Mutex::new(()),
            }),
        }
    }

    async fn initial_build(&self) -> Result<(), StateError> {
        let existing = self
            .files()
            .list()
            .await
            .map_err(StateError::InitialBuild)?;

        if existing.is_empty() {
            tracing::info!("Storage is empty, waiting for the first upload");
            return Ok(());
        }

        let root_hash = self
            .coordinator()
            .build_tree()
            .await
            .map_err(StateError::InitialBuild)?;
        tracing::info!(files = existing.len(), root_hash = %root_hash, "Loaded existing batch");
        Ok(())
    }

    /// Get the file provider
    pub fn files(&self) -> &Arc<dyn FileProvider> {
        &self.inner.files
    }

    /// Get the tree coordinator
    pub fn coordinator(&self) -> &TreeCoordinator {
        &self.inner.coordinator
    }

    /// Serialize batch mutations: held from the first write to the rebuild
    pub async fn lock_uploads(&self) -> MutexGuard<'_, ()> {
        self.inner.upload_lock.lock().await
    }
}
