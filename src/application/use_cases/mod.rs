/// Use cases - Application business logic
pub mod analyze_firmware;
pub mod correlate_vulnerabilities;

pub use analyze_firmware::{AnalyzeFirmwareUseCase, IngressLimits, PipelineSettings};
pub use correlate_vulnerabilities::{CorrelateVulnerabilitiesUseCase, CorrelationSettings};
