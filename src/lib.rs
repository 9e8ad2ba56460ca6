//! Saved-post synchronization: the HTTP service with its dual-tier store and
//! the client-side state manager that talks to it.

pub mod client;
pub mod config;
pub mod constants;
pub mod controller;
pub mod db;
pub mod error;
pub mod models;
pub mod routes;
pub mod store;

pub use config::{ClientConfig, Config};
pub use controller::{NewSavedPost, SavedPostsController};
pub use db::{open_database, Db};
pub use error::{AppError, Result};

use std::sync::Arc;

use store::{FailoverStore, MemoryStore, RedbStore, SavedPostStore};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub controller: SavedPostsController,
    pub config: Config,
}

impl AppState {
    /// Create a new AppState with the given controller and configuration
    pub fn new(controller: SavedPostsController, config: Config) -> Self {
        Self { controller, config }
    }

    /// Open the primary store named by the configuration.
    ///
    /// When the primary is disabled or cannot be opened the server still
    /// starts, serving from the in-memory tier only.
    pub fn from_config(config: Config) -> Self {
        let fallback: Arc<dyn SavedPostStore> = Arc::new(MemoryStore::new());

        let store = if !config.remote_backend_enabled {
            tracing::info!("Primary store disabled, using in-memory storage");
            FailoverStore::fallback_only(fallback)
        } else {
            match open_database(&config.database_path) {
                Ok(db) => FailoverStore::new(
                    Arc::new(RedbStore::new(db)),
                    fallback,
                    config.failover_retry_after(),
                ),
                Err(e) => {
                    tracing::warn!(
                        "Primary store unavailable ({}), falling back to in-memory storage",
                        e
                    );
                    FailoverStore::fallback_only(fallback)
                }
            }
        };

        Self::new(SavedPostsController::new(store), config)
    }
}
