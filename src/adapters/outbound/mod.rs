/// Outbound adapters - Implementations of the outbound ports
pub mod formatters;
pub mod memory;
pub mod network;

pub use formatters::SpdxFormatter;
pub use memory::InMemoryReportStore;
pub use network::NvdClient;
