//! Read-time aggregation
//!
//! Totals derived from the current collections on every call. These can
//! disagree with a customer's cached `total_jobs`/`total_spent`, which
//! only move when a job is created.

use crate::database::{Customer, Invoice, Job, JobStatus, PaymentStatus};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Per-customer totals over the jobs booked under the customer's phone
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerStats {
    pub total_jobs: usize,
    pub completed_jobs: usize,
    pub total_spent: f64,
    pub pending_payments: usize,
}

/// Portfolio-wide invoice totals
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceStats {
    pub total: usize,
    /// Invoices stored as pending, overdue or not
    pub pending: usize,
    pub paid: usize,
    /// Pending invoices past their due date
    pub overdue: usize,
    /// Invoices explicitly stored as overdue
    pub stored_overdue: usize,
    /// Sum of amounts over paid invoices
    pub total_revenue: f64,
}

/// Status an invoice is shown with: pending past its due date reads as
/// overdue. The stored status is never changed.
pub fn display_status(invoice: &Invoice, now: DateTime<Utc>) -> PaymentStatus {
    if invoice.status == PaymentStatus::Pending && invoice.due_date < now {
        PaymentStatus::Overdue
    } else {
        invoice.status
    }
}

pub fn customer_stats(customer: &Customer, jobs: &[Job]) -> CustomerStats {
    jobs.iter()
        .filter(|job| job.customer_phone == customer.phone)
        .fold(CustomerStats::default(), |mut stats, job| {
            stats.total_jobs += 1;
            stats.total_spent += job.price_value();
            if job.status == JobStatus::Completed {
                stats.completed_jobs += 1;
            }
            if job.payment_status == PaymentStatus::Pending {
                stats.pending_payments += 1;
            }
            stats
        })
}

pub fn invoice_stats(invoices: &[Invoice], now: DateTime<Utc>) -> InvoiceStats {
    invoices
        .iter()
        .fold(InvoiceStats::default(), |mut stats, invoice| {
            stats.total += 1;
            match invoice.status {
                PaymentStatus::Pending => {
                    stats.pending += 1;
                    if invoice.due_date < now {
                        stats.overdue += 1;
                    }
                }
                PaymentStatus::Paid => {
                    stats.paid += 1;
                    stats.total_revenue += invoice.amount;
                }
                PaymentStatus::Overdue => stats.stored_overdue += 1,
            }
            stats
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
    }

    fn invoice(status: PaymentStatus, amount: f64, due_in_days: i64) -> Invoice {
        Invoice {
            id: format!("inv-{}", amount),
            job_id: "job".to_string(),
            customer_id: None,
            customer_name: String::new(),
            job_name: String::new(),
            amount,
            status,
            created_at: now() - Duration::days(30),
            due_date: now() + Duration::days(due_in_days),
        }
    }

    fn job(phone: &str, price: &str, status: JobStatus, payment: PaymentStatus) -> Job {
        Job {
            id: format!("{}-{}", phone, price),
            date: "2025-06-02".to_string(),
            time: String::new(),
            name: "Job".to_string(),
            description: String::new(),
            customer_name: String::new(),
            customer_phone: phone.to_string(),
            customer_address: String::new(),
            price: price.to_string(),
            notes: String::new(),
            status,
            payment_status: payment,
            invoice_id: None,
            photos: Vec::new(),
            created_at: now(),
            updated_at: None,
        }
    }

    #[test]
    fn test_display_status_derives_overdue() {
        assert_eq!(
            display_status(&invoice(PaymentStatus::Pending, 10.0, -1), now()),
            PaymentStatus::Overdue
        );
        assert_eq!(
            display_status(&invoice(PaymentStatus::Pending, 10.0, 1), now()),
            PaymentStatus::Pending
        );
        assert_eq!(
            display_status(&invoice(PaymentStatus::Paid, 10.0, -1), now()),
            PaymentStatus::Paid
        );
        assert_eq!(
            display_status(&invoice(PaymentStatus::Overdue, 10.0, 5), now()),
            PaymentStatus::Overdue
        );
    }

    #[test]
    fn test_invoice_stats() {
        let invoices = vec![
            invoice(PaymentStatus::Paid, 100.0, -10),
            invoice(PaymentStatus::Paid, 50.5, 10),
            invoice(PaymentStatus::Pending, 70.0, -1),
            invoice(PaymentStatus::Pending, 30.0, 3),
            invoice(PaymentStatus::Overdue, 20.0, 3),
        ];

        let stats = invoice_stats(&invoices, now());

        assert_eq!(stats.total, 5);
        assert_eq!(stats.paid, 2);
        assert_eq!(stats.pending, 2);
        assert_eq!(stats.overdue, 1);
        assert_eq!(stats.stored_overdue, 1);
        assert_eq!(stats.total_revenue, 150.5);
    }

    #[test]
    fn test_stored_overdue_not_yet_due_is_not_counted_overdue() {
        let stats = invoice_stats(&[invoice(PaymentStatus::Overdue, 20.0, 30)], now());

        assert_eq!(
            stats,
            InvoiceStats {
                total: 1,
                pending: 0,
                paid: 0,
                overdue: 0,
                stored_overdue: 1,
                total_revenue: 0.0,
            }
        );
    }

    #[test]
    fn test_customer_stats() {
        let customer = Customer {
            id: "c1".to_string(),
            name: "Ada".to_string(),
            phone: "555".to_string(),
            address: String::new(),
            email: String::new(),
            notes: String::new(),
            total_jobs: 9,
            total_spent: 999.0,
            created_at: now(),
            updated_at: None,
        };
        let jobs = vec![
            job("555", "40", JobStatus::Completed, PaymentStatus::Paid),
            job("555", "abc", JobStatus::Scheduled, PaymentStatus::Pending),
            job("555", "12.5", JobStatus::Completed, PaymentStatus::Pending),
            job("777", "500", JobStatus::Completed, PaymentStatus::Pending),
        ];

        let stats = customer_stats(&customer, &jobs);

        assert_eq!(
            stats,
            CustomerStats {
                total_jobs: 3,
                completed_jobs: 2,
                total_spent: 52.5,
                pending_payments: 2,
            }
        );
    }
}
