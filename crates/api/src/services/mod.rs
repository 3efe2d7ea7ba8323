//! Application services.

pub mod reports;

pub use reports::{ReportError, ReportService};
