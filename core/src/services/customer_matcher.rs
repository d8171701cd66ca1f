//! Customer matching
//!
//! Decides whether the customer fields typed on a new job refer to an
//! existing customer or call for a new one. Precedence matters: a phone
//! match always beats a name + address match, because the counters of
//! whichever customer matches are bumped.

use crate::database::{generate_id, Customer};
use chrono::{DateTime, Utc};

/// Customer fields taken from a job being created
#[derive(Debug, Clone, Copy)]
pub struct JobCustomerFields<'a> {
    pub name: &'a str,
    pub phone: &'a str,
    pub address: &'a str,
    /// Parsed job price, 0 when unparsable
    pub price: f64,
}

/// Customer a job was linked to
#[derive(Debug, Clone, PartialEq)]
pub struct MatchOutcome {
    pub customer: Customer,
    pub is_new: bool,
}

/// Index of the existing customer these fields refer to, if any
pub fn find_match(fields: &JobCustomerFields<'_>, customers: &[Customer]) -> Option<usize> {
    if !fields.phone.is_empty() {
        if let Some(index) = customers.iter().position(|c| c.phone == fields.phone) {
            return Some(index);
        }
    }

    let name = fields.name.to_lowercase();
    customers
        .iter()
        .position(|c| c.name.to_lowercase() == name && c.address == fields.address)
}

/// Link a new job to a customer, updating or creating the record.
///
/// A matched customer gets `total_jobs + 1` and `total_spent + price`.
/// Without a match a customer is created only when a name was given;
/// otherwise the job stays unlinked and `None` is returned.
pub fn match_or_create(
    fields: &JobCustomerFields<'_>,
    customers: &mut Vec<Customer>,
    now: DateTime<Utc>,
) -> Option<MatchOutcome> {
    if let Some(index) = find_match(fields, customers) {
        let customer = &mut customers[index];
        customer.total_jobs += 1;
        customer.total_spent += fields.price;

        tracing::debug!(
            "Matched job to customer {} ({} jobs)",
            customer.id,
            customer.total_jobs
        );

        return Some(MatchOutcome {
            customer: customer.clone(),
            is_new: false,
        });
    }

    if fields.name.is_empty() {
        return None;
    }

    let customer = Customer {
        id: generate_id(),
        name: fields.name.to_string(),
        phone: fields.phone.to_string(),
        address: fields.address.to_string(),
        email: String::new(),
        notes: String::new(),
        total_jobs: 1,
        total_spent: fields.price,
        created_at: now,
        updated_at: None,
    };
    customers.push(customer.clone());

    tracing::debug!("Created customer {} from job", customer.id);

    Some(MatchOutcome {
        customer,
        is_new: true,
    })
}
