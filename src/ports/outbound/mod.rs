/// Outbound ports (driven ports) - infrastructure interfaces
///
/// These ports define the interfaces the application core uses to reach
/// external systems: the vulnerability data source, report persistence,
/// and document export.
pub mod advisory_source;
pub mod bom_formatter;
pub mod report_store;

pub use advisory_source::{Advisory, AdvisorySource, LookupError};
pub use bom_formatter::BomFormatter;
pub use report_store::ReportStore;
