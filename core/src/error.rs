//! Error types for the jobbook core
//!
//! All errors use thiserror for structured error handling.
//! These errors can be serialized to UI collaborators.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Job not found: {0}")]
    JobNotFound(String),

    #[error("Customer not found: {0}")]
    CustomerNotFound(String),

    #[error("Invoice not found: {0}")]
    InvoiceNotFound(String),

    #[error("Invalid status transition: {from} -> {to}")]
    InvalidTransition { from: String, to: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("{0}")]
    Generic(String),
}

impl AppError {
    /// True for the "referenced id does not exist" family of errors.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            AppError::JobNotFound(_) | AppError::CustomerNotFound(_) | AppError::InvoiceNotFound(_)
        )
    }
}

impl serde::Serialize for AppError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
