//! Application state and initialization
//!
//! This module wires storage, the repository and the services together.
//! All services share one repository and are made available through
//! AppState.

use crate::clock::{Clock, SystemClock};
use crate::config::{APP_DIR_NAME, DATA_DIR_ENV};
use crate::database::{open_repository, Repository};
use crate::error::{AppError, Result};
use crate::services::{CustomersService, InvoicesService, JobsService};
use crate::storage::{FileStore, KeyValueStore};
use std::path::PathBuf;
use std::sync::Arc;

/// Central application state holding all services
#[derive(Clone)]
pub struct AppState {
    pub repo: Repository,
    pub jobs: JobsService,
    pub customers: CustomersService,
    pub invoices: InvoicesService,
}

impl AppState {
    /// Load state from `store` and build the services over it
    pub async fn new(store: Arc<dyn KeyValueStore>, clock: Arc<dyn Clock>) -> Self {
        let repo = open_repository(store, clock).await;

        Self {
            jobs: JobsService::new(repo.clone()),
            customers: CustomersService::new(repo.clone()),
            invoices: InvoicesService::new(repo.clone()),
            repo,
        }
    }

    /// Wait for pending saves, e.g. before exiting
    pub async fn shutdown(&self) {
        tracing::info!("Flushing pending saves");
        self.repo.flush().await;
    }
}

/// Resolve the data directory: `JOBBOOK_DATA_DIR`, else the platform
/// data directory.
pub fn default_data_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var(DATA_DIR_ENV) {
        if !dir.trim().is_empty() {
            return Ok(PathBuf::from(dir));
        }
    }

    dirs::data_dir()
        .map(|dir| dir.join(APP_DIR_NAME))
        .ok_or_else(|| AppError::Generic("Failed to get app data dir".to_string()))
}

/// Application setup - called once on startup
pub async fn setup(app_data_dir: PathBuf) -> Result<AppState> {
    tracing::info!("Initializing application");
    tracing::info!("App data directory: {:?}", app_data_dir);

    let store = FileStore::new(app_data_dir);
    store.initialize().await?;

    let state = AppState::new(Arc::new(store), Arc::new(SystemClock)).await;

    tracing::info!("Application initialized successfully");

    Ok(state)
}
