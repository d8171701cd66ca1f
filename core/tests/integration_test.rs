//! Integration tests for jobbook
//!
//! These tests verify end-to-end functionality including:
//! - Job, customer and invoice lifecycles through the services
//! - Persistence to a file-backed store and reloading
//! - Migration of records written by older app versions

use chrono::{DateTime, Duration, TimeZone, Utc};
use jobbook::app::AppState;
use jobbook::clock::FixedClock;
use jobbook::config::{CUSTOMERS_KEY, INVOICES_KEY, JOBS_KEY};
use jobbook::database::{CreateJobRequest, JobStatus, PaymentStatus};
use jobbook::storage::{FileStore, KeyValueStore};
use std::sync::Arc;
use tempfile::TempDir;

fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 5, 10, 9, 30, 0).unwrap()
}

/// Helper to create a file-backed store in a temp directory
async fn create_test_store() -> (FileStore, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let store = FileStore::new(temp_dir.path().join("data"));
    store.initialize().await.unwrap();

    (store, temp_dir)
}

async fn open_state(store: &FileStore) -> AppState {
    AppState::new(Arc::new(store.clone()), Arc::new(FixedClock::new(fixed_now()))).await
}

fn job_request(name: &str, customer: &str, phone: &str, address: &str, price: &str) -> CreateJobRequest {
    CreateJobRequest {
        date: "2025-05-12".to_string(),
        time: "09:00".to_string(),
        name: name.to_string(),
        customer_name: customer.to_string(),
        customer_phone: phone.to_string(),
        customer_address: address.to_string(),
        price: price.to_string(),
        ..CreateJobRequest::default()
    }
}

#[tokio::test]
async fn test_customer_matching_across_jobs() {
    let (store, _temp) = create_test_store().await;
    let state = open_state(&store).await;

    // New name creates exactly one customer
    state
        .jobs
        .create_job(job_request("Lawn", "Ada Lovelace", "555-1212", "1 Main St", "40"))
        .await
        .unwrap();
    let customers = state.customers.list_customers().await.unwrap();
    assert_eq!(customers.len(), 1);
    assert_eq!(customers[0].total_jobs, 1);

    // Same phone, different name: matched by phone
    state
        .jobs
        .create_job(job_request("Hedge", "A. Lovelace", "555-1212", "", "25.5"))
        .await
        .unwrap();

    // Different phone, same name (other case) and address: matched by name + address
    state
        .jobs
        .create_job(job_request("Gutters", "ada lovelace", "555-0000", "1 Main St", "n/a"))
        .await
        .unwrap();

    let customers = state.customers.list_customers().await.unwrap();
    assert_eq!(customers.len(), 1);
    assert_eq!(customers[0].total_jobs, 3);
    assert_eq!(customers[0].total_spent, 65.5);
}

#[tokio::test]
async fn test_invoice_lifecycle() {
    let (store, _temp) = create_test_store().await;
    let state = open_state(&store).await;

    let job = state
        .jobs
        .create_job(job_request("Roof repair", "Grace", "555-3434", "9 Side Rd", "300"))
        .await
        .unwrap();

    let invoice = state.invoices.create_from_job(&job.id).await.unwrap();
    assert_eq!(invoice.created_at, fixed_now());
    assert_eq!(invoice.due_date, fixed_now() + Duration::days(30));

    state
        .invoices
        .set_status(&invoice.id, PaymentStatus::Paid)
        .await
        .unwrap();

    let job = state.jobs.get_job(&job.id).await.unwrap();
    assert_eq!(job.invoice_id.as_deref(), Some(invoice.id.as_str()));
    assert_eq!(job.payment_status, PaymentStatus::Paid);

    let grace = state.customers.search_customers("555-3434").await.unwrap().remove(0);
    let billed = state.customers.customer_invoices(&grace.id).await.unwrap();
    assert_eq!(billed.len(), 1);
    assert_eq!(billed[0].id, invoice.id);

    let stats = state.invoices.portfolio_stats().await.unwrap();
    assert_eq!(stats.paid, 1);
    assert_eq!(stats.stored_overdue, 0);
    assert_eq!(stats.total_revenue, 300.0);
}

#[tokio::test]
async fn test_customer_delete_cascades_to_jobs_not_invoices() {
    let (store, _temp) = create_test_store().await;
    let state = open_state(&store).await;

    let first = state
        .jobs
        .create_job(job_request("Lawn", "Ada", "555-1212", "1 Main St", "40"))
        .await
        .unwrap();
    state
        .jobs
        .create_job(job_request("Hedge", "Ada", "555-1212", "1 Main St", "20"))
        .await
        .unwrap();
    state
        .jobs
        .create_job(job_request("Fence", "Grace", "555-3434", "9 Side Rd", "90"))
        .await
        .unwrap();
    let invoice = state.invoices.create_from_job(&first.id).await.unwrap();

    let ada = state.customers.search_customers("ada").await.unwrap().remove(0);
    let removed = state.customers.delete_customer(&ada.id).await.unwrap();

    assert_eq!(removed, 2);
    let jobs = state.jobs.list_jobs().await.unwrap();
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0].name, "Fence");

    // Invoice survives with a dangling job reference
    let kept = state.invoices.get_invoice(&invoice.id).await.unwrap();
    assert_eq!(kept.job_id, first.id);
    assert!(state.jobs.get_job(&kept.job_id).await.is_err());
}

#[tokio::test]
async fn test_state_survives_restart() {
    let (store, _temp) = create_test_store().await;

    let before = {
        let state = open_state(&store).await;

        let job = state
            .jobs
            .create_job(job_request("Lawn", "Ada", "555-1212", "1 Main St", "40"))
            .await
            .unwrap();
        state
            .jobs
            .add_photo(&job.id, "file:///photos/before.jpg", None)
            .await
            .unwrap();
        state
            .jobs
            .change_status(&job.id, JobStatus::InProgress)
            .await
            .unwrap();
        let invoice = state.invoices.create_from_job(&job.id).await.unwrap();
        state
            .invoices
            .set_status(&invoice.id, PaymentStatus::Paid)
            .await
            .unwrap();

        state.shutdown().await;
        state.repo.snapshot().await
    };

    assert!(store.root().join(format!("{}.json", JOBS_KEY)).exists());
    assert!(store.root().join(format!("{}.json", CUSTOMERS_KEY)).exists());
    assert!(store.root().join(format!("{}.json", INVOICES_KEY)).exists());

    let reopened = open_state(&store).await;
    let after = reopened.repo.snapshot().await;

    assert_eq!(after, before);
    assert_eq!(after.jobs[0].photos.len(), 1);
    assert_eq!(after.jobs[0].status, JobStatus::InProgress);
    assert_eq!(after.invoices[0].status, PaymentStatus::Paid);
}

#[tokio::test]
async fn test_legacy_records_are_migrated_on_load() {
    let (store, _temp) = create_test_store().await;

    store
        .set(
            JOBS_KEY,
            r#"[
                {
                    "date": "2025-05-12",
                    "time": "10:30",
                    "name": "Window cleaning",
                    "customerName": "Ada",
                    "customerPhone": "555-1212",
                    "customerAddress": "1 Main St",
                    "jobPrice": "55",
                    "jobNotes": "",
                    "createdAt": "2025-05-01T08:00:00.000Z"
                }
            ]"#,
        )
        .await
        .unwrap();
    store.set(INVOICES_KEY, "this is not json").await.unwrap();

    let state = open_state(&store).await;

    let jobs = state.jobs.list_jobs().await.unwrap();
    assert_eq!(jobs.len(), 1);
    let job = &jobs[0];
    assert!(!job.id.is_empty());
    assert_eq!(job.status, JobStatus::Scheduled);
    assert_eq!(job.payment_status, PaymentStatus::Pending);
    assert_eq!(job.invoice_id, None);
    assert_eq!(job.price_value(), 55.0);

    // The malformed key starts empty, the others still load
    assert!(state.invoices.list_invoices().await.unwrap().is_empty());
    assert!(state.customers.list_customers().await.unwrap().is_empty());

    // The migrated job is usable straight away
    let invoice = state.invoices.create_from_job(&job.id).await.unwrap();
    assert_eq!(invoice.amount, 55.0);
}
