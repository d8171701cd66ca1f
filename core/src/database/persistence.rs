//! Persistence gateway
//!
//! Loads the three collections from the key-value store at start-up and
//! writes all three back after every mutation.
//!
//! Saves go through a single background worker so only one save is in
//! flight at a time. Snapshots queued while a save is running are
//! coalesced: the worker always writes the newest one. Writes are not
//! atomic across keys; if the process dies mid-save some keys hold the
//! new state and the rest the old one.

use super::models::{Customer, Invoice, Job};
use super::schema::{decode_jobs, decode_records};
use crate::config::{CUSTOMERS_KEY, INVOICES_KEY, JOBS_KEY};
use crate::error::Result;
use crate::storage::KeyValueStore;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};

/// The three in-memory collections
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Collections {
    pub jobs: Vec<Job>,
    pub customers: Vec<Customer>,
    pub invoices: Vec<Invoice>,
}

/// Serialized form of all three collections, ready to write
#[derive(Debug, Clone)]
pub struct Snapshot {
    jobs: String,
    customers: String,
    invoices: String,
}

impl Snapshot {
    pub fn capture(collections: &Collections) -> Result<Self> {
        Ok(Self {
            jobs: serde_json::to_string(&collections.jobs)?,
            customers: serde_json::to_string(&collections.customers)?,
            invoices: serde_json::to_string(&collections.invoices)?,
        })
    }
}

enum SaveCommand {
    Save(Snapshot),
    Flush(oneshot::Sender<()>),
}

/// Loads and saves collections against a [`KeyValueStore`]
#[derive(Clone)]
pub struct PersistenceGateway {
    store: Arc<dyn KeyValueStore>,
    queue: mpsc::UnboundedSender<SaveCommand>,
}

impl PersistenceGateway {
    /// Create a gateway and start its save worker.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        let (queue, rx) = mpsc::unbounded_channel();
        tokio::spawn(run_save_worker(store.clone(), rx));
        Self { store, queue }
    }

    /// Load all collections.
    ///
    /// Never fails: a key that is missing, unreadable or malformed yields
    /// an empty collection and the other keys still load.
    pub async fn load(&self, now: DateTime<Utc>) -> Collections {
        tracing::info!("Loading collections from storage");

        let (jobs, customers, invoices) = tokio::join!(
            self.store.get(JOBS_KEY),
            self.store.get(CUSTOMERS_KEY),
            self.store.get(INVOICES_KEY),
        );

        let collections = Collections {
            jobs: load_key(JOBS_KEY, jobs, |raw| decode_jobs(JOBS_KEY, raw, now)),
            customers: load_key(CUSTOMERS_KEY, customers, |raw| {
                decode_records(CUSTOMERS_KEY, raw)
            }),
            invoices: load_key(INVOICES_KEY, invoices, |raw| {
                decode_records(INVOICES_KEY, raw)
            }),
        };

        tracing::info!(
            "Loaded {} jobs, {} customers, {} invoices",
            collections.jobs.len(),
            collections.customers.len(),
            collections.invoices.len()
        );

        collections
    }

    /// Queue a save of all three collections.
    ///
    /// Returns before the write lands; failures are logged by the worker.
    pub fn save(&self, collections: &Collections) {
        let snapshot = match Snapshot::capture(collections) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                tracing::error!("Failed to serialize collections for saving: {}", e);
                return;
            }
        };

        if self.queue.send(SaveCommand::Save(snapshot)).is_err() {
            tracing::error!("Save worker has stopped; changes will not be persisted");
        }
    }

    /// Wait until every save queued before this call has been attempted
    pub async fn flush(&self) {
        let (done, wait) = oneshot::channel();
        if self.queue.send(SaveCommand::Flush(done)).is_err() {
            return;
        }
        let _ = wait.await;
    }
}

fn load_key<T>(
    key: &str,
    read: Result<Option<String>>,
    decode: impl FnOnce(&str) -> Result<Vec<T>>,
) -> Vec<T> {
    match read {
        Ok(Some(raw)) => decode(&raw).unwrap_or_else(|e| {
            tracing::error!("Failed to parse '{}', starting empty: {}", key, e);
            Vec::new()
        }),
        Ok(None) => {
            tracing::debug!("No stored data under '{}'", key);
            Vec::new()
        }
        Err(e) => {
            tracing::error!("Failed to read '{}', starting empty: {}", key, e);
            Vec::new()
        }
    }
}

async fn run_save_worker(store: Arc<dyn KeyValueStore>, mut rx: mpsc::UnboundedReceiver<SaveCommand>) {
    while let Some(command) = rx.recv().await {
        match command {
            SaveCommand::Flush(done) => {
                let _ = done.send(());
            }
            SaveCommand::Save(mut snapshot) => {
                // Coalesce queued saves, stopping at a flush barrier
                let mut barrier = None;
                let mut skipped = 0usize;
                while let Ok(next) = rx.try_recv() {
                    match next {
                        SaveCommand::Save(newer) => {
                            snapshot = newer;
                            skipped += 1;
                        }
                        SaveCommand::Flush(done) => {
                            barrier = Some(done);
                            break;
                        }
                    }
                }
                if skipped > 0 {
                    tracing::debug!("Coalesced {} queued saves", skipped);
                }

                write_snapshot(store.as_ref(), &snapshot).await;

                if let Some(done) = barrier {
                    let _ = done.send(());
                }
            }
        }
    }

    tracing::debug!("Save worker stopped");
}

async fn write_snapshot(store: &dyn KeyValueStore, snapshot: &Snapshot) {
    let (jobs, customers, invoices) = tokio::join!(
        store.set(JOBS_KEY, &snapshot.jobs),
        store.set(CUSTOMERS_KEY, &snapshot.customers),
        store.set(INVOICES_KEY, &snapshot.invoices),
    );

    let mut failed = false;
    for (key, result) in [(JOBS_KEY, jobs), (CUSTOMERS_KEY, customers), (INVOICES_KEY, invoices)] {
        if let Err(e) = result {
            failed = true;
            tracing::error!("Failed to save '{}': {}", key, e);
        }
    }

    if !failed {
        tracing::debug!("Saved all collections");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::{JobStatus, PaymentStatus};
    use crate::error::AppError;
    use crate::storage::MemoryStore;
    use async_trait::async_trait;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
    }

    fn sample_customer(id: &str) -> Customer {
        Customer {
            id: id.to_string(),
            name: "Ada Lovelace".to_string(),
            phone: "555-0100".to_string(),
            address: "1 Analytical Way".to_string(),
            email: String::new(),
            notes: String::new(),
            total_jobs: 2,
            total_spent: 150.0,
            created_at: now(),
            updated_at: None,
        }
    }

    #[tokio::test]
    async fn test_missing_keys_load_empty() {
        let gateway = PersistenceGateway::new(Arc::new(MemoryStore::new()));

        let collections = gateway.load(now()).await;

        assert_eq!(collections, Collections::default());
    }

    #[tokio::test]
    async fn test_malformed_key_does_not_block_others() {
        let store = MemoryStore::new();
        store.set(JOBS_KEY, "{not json").await.unwrap();
        store
            .set(
                CUSTOMERS_KEY,
                &serde_json::to_string(&vec![sample_customer("c1")]).unwrap(),
            )
            .await
            .unwrap();

        let gateway = PersistenceGateway::new(Arc::new(store));
        let collections = gateway.load(now()).await;

        assert!(collections.jobs.is_empty());
        assert_eq!(collections.customers.len(), 1);
        assert!(collections.invoices.is_empty());
    }

    #[tokio::test]
    async fn test_jobs_are_migrated_on_load() {
        let store = MemoryStore::new();
        store
            .set(
                JOBS_KEY,
                r#"[{"date":"2025-05-10","name":"Patio","jobPrice":"90","createdAt":"2025-05-01T10:00:00.000Z"}]"#,
            )
            .await
            .unwrap();

        let gateway = PersistenceGateway::new(Arc::new(store));
        let collections = gateway.load(now()).await;

        let job = &collections.jobs[0];
        assert!(!job.id.is_empty());
        assert_eq!(job.status, JobStatus::Scheduled);
        assert_eq!(job.payment_status, PaymentStatus::Pending);
        assert!(job.invoice_id.is_none());
    }

    #[tokio::test]
    async fn test_save_then_load_round_trip() {
        let store = Arc::new(MemoryStore::new());
        let gateway = PersistenceGateway::new(store.clone());

        let collections = Collections {
            jobs: Vec::new(),
            customers: vec![sample_customer("c1"), sample_customer("c2")],
            invoices: Vec::new(),
        };

        gateway.save(&collections);
        gateway.flush().await;

        let reloaded = PersistenceGateway::new(store).load(now()).await;
        assert_eq!(reloaded, collections);
    }

    #[tokio::test]
    async fn test_last_save_wins() {
        let store = Arc::new(MemoryStore::new());
        let gateway = PersistenceGateway::new(store.clone());

        for count in 1..=5 {
            let customers = (0..count).map(|i| sample_customer(&i.to_string())).collect();
            gateway.save(&Collections {
                customers,
                ..Collections::default()
            });
        }
        gateway.flush().await;

        let reloaded = gateway.load(now()).await;
        assert_eq!(reloaded.customers.len(), 5);
    }

    struct FailingStore;

    #[async_trait]
    impl KeyValueStore for FailingStore {
        async fn get(&self, _key: &str) -> Result<Option<String>> {
            Err(AppError::Storage("storage unavailable".to_string()))
        }

        async fn set(&self, _key: &str, _value: &str) -> Result<()> {
            Err(AppError::Storage("storage unavailable".to_string()))
        }
    }

    #[tokio::test]
    async fn test_unavailable_storage_degrades_gracefully() {
        let gateway = PersistenceGateway::new(Arc::new(FailingStore));

        let collections = gateway.load(now()).await;
        assert_eq!(collections, Collections::default());

        // Failed saves are logged, flush still resolves
        gateway.save(&collections);
        gateway.flush().await;
    }
}
