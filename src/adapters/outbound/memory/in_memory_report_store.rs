use crate::analysis::domain::AnalysisReport;
use crate::ports::outbound::ReportStore;
use crate::shared::Result;
use async_trait::async_trait;
use dashmap::DashMap;

/// InMemoryReportStore adapter keeping reports for the process lifetime
///
/// Keyed by the image's content hash; saving a report for bytes that were
/// analyzed before replaces the stored report (supersede, not mutate).
/// Persistent storage stays behind the ReportStore port.
#[derive(Default)]
pub struct InMemoryReportStore {
    reports: DashMap<String, AnalysisReport>,
}

impl InMemoryReportStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.reports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reports.is_empty()
    }
}

#[async_trait]
impl ReportStore for InMemoryReportStore {
    async fn save(&self, report: AnalysisReport) -> Result<()> {
        self.reports
            .insert(report.image.content_hash.clone(), report);
        Ok(())
    }

    async fn latest_for_image(&self, content_hash: &str) -> Result<Option<AnalysisReport>> {
        Ok(self.reports.get(content_hash).map(|r| r.clone()))
    }
}
