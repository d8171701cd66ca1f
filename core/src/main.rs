// Jobbook - job, customer and invoice state engine
// Entry point: opens the data directory and reports what it holds

use anyhow::Context;
use jobbook::app;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "jobbook=debug,info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting jobbook");

    let data_dir = match std::env::args().nth(1) {
        Some(dir) => PathBuf::from(dir),
        None => app::default_data_dir()?,
    };

    let state = app::setup(data_dir)
        .await
        .context("failed to open the data directory")?;

    let snapshot = state.repo.snapshot().await;
    let invoice_stats = state.invoices.portfolio_stats().await?;
    let dates = state.jobs.scheduled_dates().await?;

    tracing::info!(
        "{} jobs on {} dates, {} customers, {} invoices",
        snapshot.jobs.len(),
        dates.len(),
        snapshot.customers.len(),
        snapshot.invoices.len()
    );

    let summary = serde_json::json!({
        "jobs": snapshot.jobs.len(),
        "customers": snapshot.customers.len(),
        "scheduledDates": dates,
        "invoices": invoice_stats,
    });
    println!("{}", serde_json::to_string_pretty(&summary)?);

    state.shutdown().await;

    Ok(())
}
