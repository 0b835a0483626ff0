/// In-memory adapters - Process-lifetime storage
pub mod in_memory_report_store;

pub use in_memory_report_store::InMemoryReportStore;
