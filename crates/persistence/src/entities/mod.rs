//! Database entity definitions (row mappings).

pub mod report_source;

pub use report_source::{
    ActivityLogEntity, AnalyticsSnapshotEntity, FinancialEntryEntity, UserSourceEntity,
};
