//! Durable key-value storage
//!
//! The core persists each collection as one JSON string under a fixed
//! key. [`FileStore`] keeps every key in its own file inside a data
//! directory:
//!
//! Example: key "customers" is stored at "<root>/customers.json"
//!
//! [`MemoryStore`] keeps values in a map and is used for tests and for
//! running without a data directory.

use crate::error::{AppError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

/// String values addressed by key.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read a value, `None` when the key was never written
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Write a value, replacing any previous one
    async fn set(&self, key: &str, value: &str) -> Result<()>;
}

/// Directory-backed store, one JSON file per key
#[derive(Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Create a new store at the given root directory
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Initialize the store (create directory if needed)
    pub async fn initialize(&self) -> Result<()> {
        fs::create_dir_all(&self.root).await?;
        tracing::info!("Key-value store initialized at: {:?}", self.root);
        Ok(())
    }

    /// Get store root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Get file path for a key
    fn get_path(&self, key: &str) -> Result<PathBuf> {
        if key.is_empty()
            || key
                .chars()
                .any(|c| c == '/' || c == '\\' || c == '\0' || c == '.')
        {
            return Err(AppError::Storage(format!("Invalid storage key: {:?}", key)));
        }
        Ok(self.root.join(format!("{}.json", key)))
    }
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.get_path(key)?;

        match fs::read_to_string(&path).await {
            Ok(content) => {
                tracing::debug!("Read key: {} ({} bytes)", key, content.len());
                Ok(Some(content))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let path = self.get_path(key)?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        // Write to temp file first (atomic write)
        let temp_path = path.with_extension("json.tmp");
        let mut file = fs::File::create(&temp_path).await?;
        file.write_all(value.as_bytes()).await?;
        file.sync_all().await?;

        // Rename to final location
        fs::rename(temp_path, &path).await?;

        tracing::debug!("Wrote key: {} ({} bytes)", key, value.len());

        Ok(())
    }
}

/// In-memory store
#[derive(Clone, Default)]
pub struct MemoryStore {
    values: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values.lock().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.values
            .lock()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}
