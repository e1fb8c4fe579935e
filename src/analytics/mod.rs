pub mod auth;
pub mod client;
pub mod types;

pub use client::AnalyticsReportingClient;
pub use types::{DateRange, GetReportsRequest, GetReportsResponse, Page, ReportSpecification};

/// Executes one `batchGet` call against a reporting backend.
#[async_trait::async_trait]
pub trait ReportingBackend: Send + Sync {
    async fn batch_get(&self, request: &GetReportsRequest) -> anyhow::Result<GetReportsResponse>;
    fn name(&self) -> &str;
}
