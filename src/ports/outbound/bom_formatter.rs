use crate::analysis::domain::AnalysisReport;
use crate::shared::Result;

/// BomFormatter port for serializing a report's inventory to an
/// interchange document (e.g. SPDX). Field naming and completeness are the
/// core's responsibility; validating the document is not.
pub trait BomFormatter {
    fn format(&self, report: &AnalysisReport) -> Result<String>;
}
