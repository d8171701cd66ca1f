//! Invoices service
//!
//! Raises invoices from jobs and keeps each invoice's status mirrored
//! onto its job's `payment_status`. "Overdue" is normally derived at
//! read time (see [`display_status`]) rather than stored.

use super::aggregation::{display_status, invoice_stats, InvoiceStats};
use crate::config::{INVOICE_DUE_DAYS, UNKNOWN_CUSTOMER};
use crate::database::{generate_id, parse_price, Invoice, PaymentStatus, Repository};
use crate::error::{AppError, Result};
use chrono::Duration;

/// Which invoices to list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InvoiceFilter {
    #[default]
    All,
    /// Invoices whose stored status equals this one
    Status(PaymentStatus),
}

impl InvoiceFilter {
    fn matches(&self, invoice: &Invoice) -> bool {
        match self {
            InvoiceFilter::All => true,
            InvoiceFilter::Status(status) => invoice.status == *status,
        }
    }
}

/// Plain-text invoice suitable for sharing
pub fn render_share_text(invoice: &Invoice, customer_name: &str) -> String {
    format!(
        "INVOICE #{id}\n\
         \n\
         Customer: {customer}\n\
         Job: {job}\n\
         Amount: ${amount:.2}\n\
         Status: {status}\n\
         Due Date: {due}\n\
         Created: {created}\n\
         \n\
         Thank you for your business!",
        id = invoice.id,
        customer = customer_name,
        job = invoice.job_name,
        amount = invoice.amount,
        status = invoice.status.as_str().to_uppercase(),
        due = invoice.due_date.format("%Y-%m-%d"),
        created = invoice.created_at.format("%Y-%m-%d"),
    )
}

/// Service for managing invoices
#[derive(Clone)]
pub struct InvoicesService {
    repo: Repository,
}

impl InvoicesService {
    pub fn new(repo: Repository) -> Self {
        Self { repo }
    }

    /// Raise an invoice for a job.
    ///
    /// The job's price must parse to a positive amount. The invoice is
    /// due [`INVOICE_DUE_DAYS`] after creation, and the job is updated to
    /// point at it with a pending payment status. Nothing prevents a
    /// second invoice for the same job.
    pub async fn create_from_job(&self, job_id: &str) -> Result<Invoice> {
        tracing::info!("Creating invoice for job: {}", job_id);

        let invoice = self
            .repo
            .mutate(|c, now| {
                let mut job = c
                    .find_job(job_id)
                    .cloned()
                    .ok_or_else(|| AppError::JobNotFound(job_id.to_string()))?;

                let amount = match parse_price(&job.price) {
                    Some(amount) if amount > 0.0 => amount,
                    _ => {
                        return Err(AppError::Validation(format!(
                            "Job price must be a number greater than zero, got {:?}",
                            job.price
                        )))
                    }
                };

                let customer_id = if job.customer_phone.is_empty() {
                    None
                } else {
                    c.customer_by_phone(&job.customer_phone).map(|cust| cust.id.clone())
                };

                let invoice = Invoice {
                    id: generate_id(),
                    job_id: job.id.clone(),
                    customer_id,
                    customer_name: job.customer_name.clone(),
                    job_name: job.name.clone(),
                    amount,
                    status: PaymentStatus::Pending,
                    created_at: now,
                    due_date: now + Duration::days(INVOICE_DUE_DAYS),
                };
                c.invoices.push(invoice.clone());

                job.invoice_id = Some(invoice.id.clone());
                job.payment_status = PaymentStatus::Pending;
                c.replace_job(job, now)?;

                Ok(invoice)
            })
            .await?;

        tracing::info!(
            "Invoice created successfully: {} ({:.2})",
            invoice.id,
            invoice.amount
        );

        Ok(invoice)
    }

    /// Set an invoice's status and mirror it onto its job.
    ///
    /// When the job no longer exists only the invoice changes.
    pub async fn set_status(&self, invoice_id: &str, status: PaymentStatus) -> Result<Invoice> {
        tracing::info!("Setting invoice {} status to {}", invoice_id, status);

        self.repo
            .mutate(|c, now| {
                let invoice = c
                    .find_invoice_mut(invoice_id)
                    .ok_or_else(|| AppError::InvoiceNotFound(invoice_id.to_string()))?;
                invoice.status = status;
                let invoice = invoice.clone();

                match c.find_job(&invoice.job_id).cloned() {
                    Some(mut job) => {
                        job.payment_status = status;
                        c.replace_job(job, now)?;
                    }
                    None => {
                        tracing::debug!(
                            "Job {} for invoice {} is gone, skipping payment mirror",
                            invoice.job_id,
                            invoice.id
                        );
                    }
                }

                Ok(invoice)
            })
            .await
    }

    /// Get an invoice by ID
    pub async fn get_invoice(&self, id: &str) -> Result<Invoice> {
        self.repo
            .read(|c| c.find_invoice(id).cloned())
            .await
            .ok_or_else(|| AppError::InvoiceNotFound(id.to_string()))
    }

    /// List all invoices
    pub async fn list_invoices(&self) -> Result<Vec<Invoice>> {
        Ok(self.repo.read(|c| c.invoices.clone()).await)
    }

    /// List invoices matching a filter on their stored status
    pub async fn invoices_with_status(&self, filter: InvoiceFilter) -> Result<Vec<Invoice>> {
        Ok(self
            .repo
            .read(|c| {
                c.invoices
                    .iter()
                    .filter(|i| filter.matches(i))
                    .cloned()
                    .collect()
            })
            .await)
    }

    /// First invoice raised against a job
    pub async fn invoice_for_job(&self, job_id: &str) -> Result<Option<Invoice>> {
        Ok(self
            .repo
            .read(|c| c.invoices.iter().find(|i| i.job_id == job_id).cloned())
            .await)
    }

    /// Status the invoice should be shown with right now
    pub fn display_status(&self, invoice: &Invoice) -> PaymentStatus {
        display_status(invoice, self.repo.now())
    }

    /// Totals across all invoices
    pub async fn portfolio_stats(&self) -> Result<InvoiceStats> {
        let now = self.repo.now();
        Ok(self.repo.read(|c| invoice_stats(&c.invoices, now)).await)
    }

    /// Shareable text for an invoice
    pub async fn share_text(&self, invoice_id: &str) -> Result<String> {
        self.repo
            .read(|c| -> Result<String> {
                let invoice = c
                    .find_invoice(invoice_id)
                    .ok_or_else(|| AppError::InvoiceNotFound(invoice_id.to_string()))?;
                let customer_name = invoice
                    .customer_id
                    .as_deref()
                    .and_then(|id| c.find_customer(id))
                    .map(|cust| cust.name.as_str())
                    .unwrap_or(UNKNOWN_CUSTOMER);
                Ok(render_share_text(invoice, customer_name))
            })
            .await
    }
}
