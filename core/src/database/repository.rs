//! Repository layer for the in-memory collections
//!
//! The repository owns jobs, customers and invoices. Every mutation runs
//! under one lock and, when it succeeds, queues a save of all three
//! collections. Cross-collection references are plain ids (and phone
//! numbers) resolved by lookup; nothing enforces that they point at a
//! live record.

use super::models::*;
use super::persistence::{Collections, PersistenceGateway};
use crate::clock::Clock;
use crate::error::{AppError, Result};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::Mutex;

impl Collections {
    pub fn find_job(&self, id: &str) -> Option<&Job> {
        self.jobs.iter().find(|j| j.id == id)
    }

    pub fn find_job_mut(&mut self, id: &str) -> Option<&mut Job> {
        self.jobs.iter_mut().find(|j| j.id == id)
    }

    /// Replace the stored job with the same id, stamping `updated_at`
    pub fn replace_job(&mut self, mut job: Job, now: DateTime<Utc>) -> Result<Job> {
        let slot = self
            .find_job_mut(&job.id)
            .ok_or_else(|| AppError::JobNotFound(job.id.clone()))?;

        job.updated_at = Some(now);
        *slot = job.clone();

        Ok(job)
    }

    /// Remove a job, returning whether anything was removed
    pub fn remove_job(&mut self, id: &str) -> bool {
        let before = self.jobs.len();
        self.jobs.retain(|j| j.id != id);
        self.jobs.len() < before
    }

    /// Remove every job booked under a phone number
    pub fn remove_jobs_by_phone(&mut self, phone: &str) -> usize {
        let before = self.jobs.len();
        self.jobs.retain(|j| j.customer_phone != phone);
        before - self.jobs.len()
    }

    pub fn find_customer(&self, id: &str) -> Option<&Customer> {
        self.customers.iter().find(|c| c.id == id)
    }

    /// First customer whose phone equals `phone` exactly
    pub fn customer_by_phone(&self, phone: &str) -> Option<&Customer> {
        self.customers.iter().find(|c| c.phone == phone)
    }

    /// Replace the stored customer with the same id, stamping `updated_at`
    pub fn replace_customer(&mut self, mut customer: Customer, now: DateTime<Utc>) -> Result<Customer> {
        let slot = self
            .customers
            .iter_mut()
            .find(|c| c.id == customer.id)
            .ok_or_else(|| AppError::CustomerNotFound(customer.id.clone()))?;

        customer.updated_at = Some(now);
        *slot = customer.clone();

        Ok(customer)
    }

    /// Remove a customer, returning the removed record
    pub fn remove_customer(&mut self, id: &str) -> Option<Customer> {
        let index = self.customers.iter().position(|c| c.id == id)?;
        Some(self.customers.remove(index))
    }

    pub fn find_invoice(&self, id: &str) -> Option<&Invoice> {
        self.invoices.iter().find(|i| i.id == id)
    }

    pub fn find_invoice_mut(&mut self, id: &str) -> Option<&mut Invoice> {
        self.invoices.iter_mut().find(|i| i.id == id)
    }
}

/// Shared handle to the collections
#[derive(Clone)]
pub struct Repository {
    state: Arc<Mutex<Collections>>,
    gateway: PersistenceGateway,
    clock: Arc<dyn Clock>,
}

impl Repository {
    /// Load persisted state through the gateway and wrap it
    pub async fn open(gateway: PersistenceGateway, clock: Arc<dyn Clock>) -> Self {
        let collections = gateway.load(clock.now()).await;
        Self {
            state: Arc::new(Mutex::new(collections)),
            gateway,
            clock,
        }
    }

    /// Current time according to the repository clock
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Run a read-only query against the collections
    pub async fn read<R>(&self, query: impl FnOnce(&Collections) -> R) -> R {
        let state = self.state.lock().await;
        query(&*state)
    }

    /// Run a mutation; a successful one queues a save.
    ///
    /// A mutation that returns an error must leave the collections
    /// untouched, since nothing is rolled back.
    pub async fn mutate<R>(
        &self,
        change: impl FnOnce(&mut Collections, DateTime<Utc>) -> Result<R>,
    ) -> Result<R> {
        let mut state = self.state.lock().await;
        let result = change(&mut *state, self.clock.now())?;

        // Snapshot under the lock so saves are queued in mutation order
        self.gateway.save(&state);

        Ok(result)
    }

    /// Clone of the full state
    pub async fn snapshot(&self) -> Collections {
        self.state.lock().await.clone()
    }

    /// Wait for queued saves to land
    pub async fn flush(&self) {
        self.gateway.flush().await;
    }
}
