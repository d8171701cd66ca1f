//! Services module
//!
//! Business logic services that coordinate between collaborators and the
//! repository.

pub mod aggregation;
pub mod customer_matcher;
pub mod customers;
pub mod invoices;
pub mod jobs;

pub use aggregation::{CustomerStats, InvoiceStats};
pub use customers::CustomersService;
pub use invoices::{InvoiceFilter, InvoicesService};
pub use jobs::JobsService;
