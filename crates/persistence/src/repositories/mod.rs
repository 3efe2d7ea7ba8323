//! Repository implementations.

pub mod report;
pub mod report_source;
pub mod template;

pub use report::ReportRepository;
pub use report_source::ReportSourceRepository;
pub use template::TemplateRepository;
