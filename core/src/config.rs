//! Application configuration constants
//!
//! Central location for storage keys, billing periods, scheduling
//! windows and other fixed boundaries used throughout the core.

// ===== Storage Keys =====

/// Key holding the JSON array of jobs
pub const JOBS_KEY: &str = "scheduledJobs";
/// Key holding the JSON array of customers
pub const CUSTOMERS_KEY: &str = "customers";
/// Key holding the JSON array of invoices
pub const INVOICES_KEY: &str = "invoices";

/// Environment variable overriding the data directory used by the binary
pub const DATA_DIR_ENV: &str = "JOBBOOK_DATA_DIR";

/// Directory name created under the platform data directory
pub const APP_DIR_NAME: &str = "jobbook";

// ===== Billing =====

/// Days between invoice creation and its due date
pub const INVOICE_DUE_DAYS: i64 = 30;

/// Placeholder shown when an invoice's customer cannot be resolved
pub const UNKNOWN_CUSTOMER: &str = "Unknown Customer";

// ===== Scheduling =====

/// First bookable hour of the day (inclusive)
pub const FIRST_SLOT_HOUR: u32 = 8;
/// Last bookable hour of the day (exclusive)
pub const LAST_SLOT_HOUR: u32 = 18;
/// Minutes between consecutive time slots
pub const SLOT_INTERVAL_MINUTES: u32 = 30;

/// Bookable time slot labels ("08:00", "08:30", ... "17:30")
pub fn time_slots() -> Vec<String> {
    (FIRST_SLOT_HOUR..LAST_SLOT_HOUR)
        .flat_map(|hour| {
            (0..60)
                .step_by(SLOT_INTERVAL_MINUTES as usize)
                .map(move |minute| format!("{:02}:{:02}", hour, minute))
        })
        .collect()
}

// ===== Customer Limits =====

/// Minimum query length before customer search filters anything
pub const MIN_SEARCH_QUERY_LENGTH: usize = 1;
