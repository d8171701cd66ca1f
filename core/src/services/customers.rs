//! Customers service
//!
//! Explicit customer management. Deleting a customer cascades to every
//! job booked under the customer's phone number; invoices are left in
//! place even when they now point at missing jobs.

use super::aggregation::{customer_stats, CustomerStats};
use crate::config::MIN_SEARCH_QUERY_LENGTH;
use crate::database::{generate_id, CreateCustomerRequest, Customer, Invoice, Job, Repository};
use crate::error::{AppError, Result};

/// Service for managing customers
#[derive(Clone)]
pub struct CustomersService {
    repo: Repository,
}

fn validate(name: &str, phone: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(AppError::Validation("Customer name is required".to_string()));
    }
    if phone.trim().is_empty() {
        return Err(AppError::Validation("Phone number is required".to_string()));
    }
    Ok(())
}

impl CustomersService {
    pub fn new(repo: Repository) -> Self {
        Self { repo }
    }

    /// Create a customer from the customer form
    pub async fn create_customer(&self, req: CreateCustomerRequest) -> Result<Customer> {
        validate(&req.name, &req.phone)?;

        tracing::info!("Creating customer: {}", req.name.trim());

        let customer = self
            .repo
            .mutate(|c, now| {
                let customer = Customer {
                    id: generate_id(),
                    name: req.name.trim().to_string(),
                    phone: req.phone.trim().to_string(),
                    address: req.address.trim().to_string(),
                    email: req.email.trim().to_string(),
                    notes: req.notes.trim().to_string(),
                    total_jobs: 0,
                    total_spent: 0.0,
                    created_at: now,
                    updated_at: None,
                };
                c.customers.push(customer.clone());
                Ok(customer)
            })
            .await?;

        tracing::info!("Customer created successfully: {}", customer.id);

        Ok(customer)
    }

    /// Get a customer by ID
    pub async fn get_customer(&self, id: &str) -> Result<Customer> {
        self.repo
            .read(|c| c.find_customer(id).cloned())
            .await
            .ok_or_else(|| AppError::CustomerNotFound(id.to_string()))
    }

    /// List all customers
    pub async fn list_customers(&self) -> Result<Vec<Customer>> {
        Ok(self.repo.read(|c| c.customers.clone()).await)
    }

    /// Replace a stored customer, trimming its text fields
    pub async fn update_customer(&self, mut customer: Customer) -> Result<Customer> {
        validate(&customer.name, &customer.phone)?;

        for field in [
            &mut customer.name,
            &mut customer.phone,
            &mut customer.address,
            &mut customer.email,
            &mut customer.notes,
        ] {
            *field = field.trim().to_string();
        }

        tracing::debug!("Updating customer: {}", customer.id);

        self.repo
            .mutate(|c, now| c.replace_customer(customer, now))
            .await
    }

    /// Delete a customer and every job booked under its phone number.
    ///
    /// Returns the number of jobs removed; an unknown id removes nothing.
    pub async fn delete_customer(&self, id: &str) -> Result<usize> {
        tracing::info!("Deleting customer: {}", id);

        let removed_jobs = self
            .repo
            .mutate(|c, _| {
                Ok(match c.remove_customer(id) {
                    Some(customer) => c.remove_jobs_by_phone(&customer.phone),
                    None => 0,
                })
            })
            .await?;

        tracing::info!("Customer {} deleted with {} jobs", id, removed_jobs);

        Ok(removed_jobs)
    }

    /// Customers whose name contains `query` (any case) or whose phone
    /// contains it
    pub async fn search_customers(&self, query: &str) -> Result<Vec<Customer>> {
        let all_customers = self.list_customers().await?;

        let query = query.trim();
        if query.chars().count() < MIN_SEARCH_QUERY_LENGTH {
            return Ok(all_customers);
        }

        let query_lower = query.to_lowercase();

        let filtered: Vec<Customer> = all_customers
            .into_iter()
            .filter(|customer| {
                customer.name.to_lowercase().contains(&query_lower) || customer.phone.contains(query)
            })
            .collect();

        Ok(filtered)
    }

    /// Jobs booked under the customer's phone number
    pub async fn customer_jobs(&self, id: &str) -> Result<Vec<Job>> {
        self.repo
            .read(|c| -> Result<Vec<Job>> {
                let customer = c
                    .find_customer(id)
                    .ok_or_else(|| AppError::CustomerNotFound(id.to_string()))?;
                Ok(c.jobs
                    .iter()
                    .filter(|j| j.customer_phone == customer.phone)
                    .cloned()
                    .collect())
            })
            .await
    }

    /// Invoices whose `customer_id` points at this customer
    pub async fn customer_invoices(&self, id: &str) -> Result<Vec<Invoice>> {
        Ok(self
            .repo
            .read(|c| {
                c.invoices
                    .iter()
                    .filter(|i| i.customer_id.as_deref() == Some(id))
                    .cloned()
                    .collect()
            })
            .await)
    }

    /// Totals recomputed from the customer's current jobs
    pub async fn customer_stats(&self, id: &str) -> Result<CustomerStats> {
        self.repo
            .read(|c| -> Result<CustomerStats> {
                let customer = c
                    .find_customer(id)
                    .ok_or_else(|| AppError::CustomerNotFound(id.to_string()))?;
                Ok(customer_stats(customer, &c.jobs))
            })
            .await
    }
}
