//! Data models
//!
//! Rust structs representing the persisted entities.
//! Field names serialize in camelCase so records stay readable by the
//! mobile front end that shares the same storage keys.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Generate a new record id.
///
/// UUID v7 ids embed a millisecond timestamp, so sorting them as strings
/// follows creation order.
pub fn generate_id() -> String {
    Uuid::now_v7().to_string()
}

/// Parse a free-text price the way the mobile form always has: the
/// longest leading numeric prefix wins ("45.50 cash" is 45.5), anything
/// without one is `None`.
pub fn parse_price(text: &str) -> Option<f64> {
    let s = text.trim_start();
    let bytes = s.as_bytes();
    let is_digit = |i: usize| i < bytes.len() && bytes[i].is_ascii_digit();

    let mut end = 0;
    if end < bytes.len() && (bytes[end] == b'+' || bytes[end] == b'-') {
        end += 1;
    }

    let int_start = end;
    while is_digit(end) {
        end += 1;
    }
    let mut mantissa_digits = end - int_start;

    if end < bytes.len() && bytes[end] == b'.' {
        let mut j = end + 1;
        while is_digit(j) {
            j += 1;
        }
        let frac_digits = j - (end + 1);
        if mantissa_digits + frac_digits > 0 {
            mantissa_digits += frac_digits;
            end = j;
        }
    }

    if mantissa_digits == 0 {
        return None;
    }

    if end < bytes.len() && (bytes[end] == b'e' || bytes[end] == b'E') {
        let mut j = end + 1;
        if j < bytes.len() && (bytes[j] == b'+' || bytes[j] == b'-') {
            j += 1;
        }
        let exp_start = j;
        while is_digit(j) {
            j += 1;
        }
        if j > exp_start {
            end = j;
        }
    }

    s[..end].parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Numeric value of a price, 0 when unparsable
pub fn price_value(text: &str) -> f64 {
    parse_price(text).unwrap_or(0.0)
}

/// Accept a price stored either as text or as a bare JSON number
fn price_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(serde_json::Number),
        Null(()),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(s) => s,
        Raw::Number(n) => n.to_string(),
        Raw::Null(()) => String::new(),
    })
}

/// Work progress of a job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum JobStatus {
    #[default]
    Scheduled,
    InProgress,
    Completed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Scheduled => "scheduled",
            JobStatus::InProgress => "in-progress",
            JobStatus::Completed => "completed",
        }
    }

    /// Forward-only progression: scheduled -> in-progress -> completed
    pub fn can_advance_to(&self, next: JobStatus) -> bool {
        next > *self
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "scheduled" => Ok(JobStatus::Scheduled),
            "in-progress" => Ok(JobStatus::InProgress),
            "completed" => Ok(JobStatus::Completed),
            other => Err(format!("Unknown job status: {}", other)),
        }
    }
}

/// Payment state shared by invoices and the jobs they mirror onto
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Paid,
    Overdue,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Paid => "paid",
            PaymentStatus::Overdue => "overdue",
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Ok(PaymentStatus::Pending),
            "paid" => Ok(PaymentStatus::Paid),
            "overdue" => Ok(PaymentStatus::Overdue),
            other => Err(format!("Unknown payment status: {}", other)),
        }
    }
}

/// Photo attached to a job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Photo {
    pub id: String,
    pub uri: String,
    #[serde(default)]
    pub file_name: String,
    pub timestamp: DateTime<Utc>,
}

/// A scheduled unit of work
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: String,
    /// Calendar date, `YYYY-MM-DD`
    pub date: String,
    /// Time slot label such as "09:30", empty when unset
    #[serde(default)]
    pub time: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub customer_name: String,
    #[serde(default)]
    pub customer_phone: String,
    #[serde(default)]
    pub customer_address: String,
    /// Price as typed; see [`Job::price_value`]
    #[serde(rename = "jobPrice", alias = "price", default, deserialize_with = "price_text")]
    pub price: String,
    #[serde(rename = "jobNotes", alias = "notes", default)]
    pub notes: String,
    #[serde(default)]
    pub status: JobStatus,
    #[serde(default)]
    pub payment_status: PaymentStatus,
    #[serde(default)]
    pub invoice_id: Option<String>,
    #[serde(default)]
    pub photos: Vec<Photo>,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Job {
    pub fn price_value(&self) -> f64 {
        price_value(&self.price)
    }
}

/// A person or account jobs are performed for
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub notes: String,
    /// Running job count, bumped once per matched job creation
    #[serde(default)]
    pub total_jobs: u32,
    /// Running sum of matched job prices
    #[serde(default)]
    pub total_spent: f64,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// A billing record raised against one job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    pub id: String,
    pub job_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<String>,
    #[serde(default)]
    pub customer_name: String,
    #[serde(default)]
    pub job_name: String,
    pub amount: f64,
    pub status: PaymentStatus,
    pub created_at: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
}

/// Create job request
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateJobRequest {
    pub date: String,
    #[serde(default)]
    pub time: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub customer_name: String,
    #[serde(default)]
    pub customer_phone: String,
    #[serde(default)]
    pub customer_address: String,
    #[serde(default)]
    pub price: String,
    #[serde(default)]
    pub notes: String,
    /// Initial status; `scheduled` when not given
    #[serde(default)]
    pub status: Option<JobStatus>,
}

/// Create customer request
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCustomerRequest {
    pub name: String,
    pub phone: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub notes: String,
}
