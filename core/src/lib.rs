//! Jobbook library
//!
//! The relational state engine behind the job-scheduling app: jobs,
//! customers and invoices kept consistent in memory and persisted to a
//! key-value store.

pub mod app;
pub mod clock;
pub mod config;
pub mod database;
pub mod error;
pub mod services;
pub mod storage;
