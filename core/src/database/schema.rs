//! Record schema and load-time migrations
//!
//! Older builds of the app wrote jobs without `status`, `id`,
//! `paymentStatus` or `invoiceId`. Every job read from storage is
//! brought up to the current shape here before it is deserialized.

use super::models::{generate_id, Job};
use crate::error::{AppError, Result};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

/// Text fields that older records may carry as `null`
const JOB_TEXT_FIELDS: &[&str] = &[
    "time",
    "description",
    "customerName",
    "customerPhone",
    "customerAddress",
    "jobNotes",
];

/// Loose truthiness used by the stored records: missing, null, false,
/// zero and the empty string all count as "not set".
fn is_unset(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::Bool(b)) => !b,
        Some(Value::String(s)) => s.is_empty(),
        Some(Value::Number(n)) => n.as_f64() == Some(0.0),
        Some(_) => false,
    }
}

fn backfill(record: &mut Map<String, Value>, field: &str, default: impl FnOnce() -> Value) {
    if is_unset(record.get(field)) {
        record.insert(field.to_string(), default());
    }
}

/// Bring one stored job record up to the current schema.
///
/// Non-object values are returned untouched and fail later.
pub fn migrate_job(mut value: Value, now: DateTime<Utc>) -> Value {
    if let Some(record) = value.as_object_mut() {
        backfill(record, "status", || Value::from("scheduled"));
        backfill(record, "id", || Value::from(generate_id()));
        backfill(record, "paymentStatus", || Value::from("pending"));
        backfill(record, "invoiceId", || Value::Null);
        backfill(record, "createdAt", || Value::from(now.to_rfc3339()));
        backfill(record, "photos", || Value::Array(Vec::new()));

        // Numeric ids from very early builds
        if let Some(Value::Number(n)) = record.get("id") {
            let id = n.to_string();
            record.insert("id".to_string(), Value::from(id));
        }

        for field in JOB_TEXT_FIELDS {
            if matches!(record.get(*field), Some(Value::Null)) {
                record.insert(field.to_string(), Value::from(""));
            }
        }
    }

    value
}

/// Parse a stored value that must be a JSON array
fn parse_array(key: &str, raw: &str) -> Result<Vec<Value>> {
    match serde_json::from_str::<Value>(raw)? {
        Value::Array(items) => Ok(items),
        other => Err(AppError::Storage(format!(
            "Expected a JSON array under '{}', found {}",
            key,
            json_kind(&other)
        ))),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Deserialize each element, skipping (and logging) records that do not
/// fit the current schema so one bad record cannot hide the rest.
fn decode_each<T: DeserializeOwned>(key: &str, items: Vec<Value>) -> Vec<T> {
    let total = items.len();
    let records: Vec<T> = items
        .into_iter()
        .enumerate()
        .filter_map(|(index, item)| match serde_json::from_value::<T>(item) {
            Ok(record) => Some(record),
            Err(e) => {
                tracing::warn!("Skipping unreadable record {} under '{}': {}", index, key, e);
                None
            }
        })
        .collect();

    if records.len() < total {
        tracing::warn!(
            "Loaded {} of {} records under '{}'",
            records.len(),
            total,
            key
        );
    }

    records
}

/// Decode and migrate the stored job collection
pub fn decode_jobs(key: &str, raw: &str, now: DateTime<Utc>) -> Result<Vec<Job>> {
    let items = parse_array(key, raw)?
        .into_iter()
        .map(|item| migrate_job(item, now))
        .collect();

    Ok(decode_each(key, items))
}

/// Decode a collection that is stored in its current shape
pub fn decode_records<T: DeserializeOwned>(key: &str, raw: &str) -> Result<Vec<T>> {
    Ok(decode_each(key, parse_array(key, raw)?))
}
