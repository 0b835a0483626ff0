use crate::analysis::domain::AnalysisReport;
use crate::shared::Result;
use async_trait::async_trait;

/// ReportStore port for persisting analysis results.
///
/// The core only needs this interface; the storage technology behind it is
/// an external collaborator. Saving a report for an image that already has
/// one supersedes the previous report, it never mutates it.
#[async_trait]
pub trait ReportStore: Send + Sync {
    async fn save(&self, report: AnalysisReport) -> Result<()>;

    /// The most recent report for the given content hash, if any.
    async fn latest_for_image(&self, content_hash: &str) -> Result<Option<AnalysisReport>>;
}
