pub mod fetch;
pub mod format;
pub mod naming;
pub mod orchestrator;
pub mod pivot;
pub mod rows;
pub mod summary;

pub use fetch::PageFetcher;
pub use format::{FormattedPage, format_report};
pub use naming::ColumnNaming;
pub use orchestrator::{BackupPlan, BackupSummary, ReportFailure, RunOptions, run_backup, run_report};
pub use pivot::format_pivot;
pub use summary::format_summary;
