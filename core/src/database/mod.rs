//! Database module
//!
//! This module provides the in-process data layer including:
//! - Model definitions
//! - Load-time schema migrations
//! - The persistence gateway and its save queue
//! - Repository layer owning the collections

pub mod models;
pub mod persistence;
pub mod repository;
pub mod schema;

pub use models::*;
pub use persistence::{Collections, PersistenceGateway};
pub use repository::Repository;

use crate::clock::Clock;
use crate::storage::KeyValueStore;
use std::sync::Arc;

/// Start a gateway over `store` and load the repository from it.
///
/// Must be called from within a tokio runtime.
pub async fn open_repository(store: Arc<dyn KeyValueStore>, clock: Arc<dyn Clock>) -> Repository {
    tracing::info!("Opening repository");

    let gateway = PersistenceGateway::new(store);
    let repo = Repository::open(gateway, clock).await;

    tracing::info!("Repository ready");

    repo
}
