pub mod bom;
pub mod component;
pub mod image;
pub mod report;
pub mod vulnerability;

pub use bom::{BomCategory, BomEntry};
pub use component::{ComponentKind, Confidence, ExtractedComponent};
pub use image::FirmwareImage;
pub use report::{
    format_size, AnalysisReport, ImageSummary, UnresolvedLookup, UnresolvedReason,
};
pub use vulnerability::{CvssScore, Severity, VulnerabilityRecord};
