/// Formatter adapters - Export document generation
pub mod spdx_formatter;

pub use spdx_formatter::SpdxFormatter;
