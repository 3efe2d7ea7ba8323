//! Report pipeline stages.
//!
//! Every stage except collection is a pure function over domain models.

pub mod charts;
pub mod collector;
pub mod comparison;
pub mod export;
pub mod filter;
pub mod grouping;
pub mod metrics;

pub use charts::project_charts;
pub use collector::{CollectError, DataCollector, InMemoryCollector};
pub use comparison::{compare_summaries, previous_range};
pub use export::{export_report, ExportError, ExportedFile};
pub use filter::apply_filters;
pub use grouping::group_records;
pub use metrics::calculate_metrics;
