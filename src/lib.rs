//! firmlens - Firmware image analysis tool
//!
//! Takes a firmware binary, extracts the components embedded in it by
//! signature scanning, recovers a bill of materials from the extracted
//! regions, and correlates the inventory against a vulnerability database.
//!
//! # Architecture
//!
//! The library is organized into the following layers:
//!
//! - **Domain Layer** (`analysis`): Signature catalog, extraction and
//!   inventory services, overlap and ranking policies
//! - **Application Layer** (`application`): Use cases, DTOs, and the
//!   correlation cache
//! - **Ports** (`ports`): Interface definitions for infrastructure
//! - **Adapters** (`adapters`): Concrete implementations of ports
//! - **Shared** (`shared`): Common utilities and error types
//!
//! # Example
//!
//! ```no_run
//! use firmlens::prelude::*;
//! use std::sync::Arc;
//! use std::time::Duration;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn run() -> Result<()> {
//! let source = Arc::new(NvdClient::new()?);
//! let cache = Arc::new(CorrelationCache::new(
//!     Duration::from_secs(3600),
//!     Duration::from_secs(300),
//! ));
//! let correlator =
//!     CorrelateVulnerabilitiesUseCase::new(source, cache, CorrelationSettings::default());
//! let store = Arc::new(InMemoryReportStore::new());
//! let use_case =
//!     AnalyzeFirmwareUseCase::new(correlator, store, PipelineSettings::default());
//!
//! let bytes = std::fs::read("router.bin")?;
//! let request = AnalysisRequest::new("router.bin", bytes);
//! let report = use_case.execute(request, &CancellationToken::new()).await?;
//! println!("{} component(s) found", report.components.len());
//! # Ok(())
//! # }
//! ```

pub mod adapters;
pub mod analysis;
pub mod application;
pub mod cli;
pub mod config;
pub mod ports;
pub mod shared;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::adapters::outbound::{InMemoryReportStore, NvdClient, SpdxFormatter};
    pub use crate::analysis::domain::{
        AnalysisReport, BomEntry, ComponentKind, ExtractedComponent, FirmwareImage, Severity,
        VulnerabilityRecord,
    };
    pub use crate::analysis::services::{Extractor, InventoryBuilder};
    pub use crate::application::dto::{AnalysisRequest, AnalysisResponse};
    pub use crate::application::use_cases::{
        AnalyzeFirmwareUseCase, CorrelateVulnerabilitiesUseCase, CorrelationSettings,
        IngressLimits, PipelineSettings,
    };
    pub use crate::application::CorrelationCache;
    pub use crate::ports::outbound::{Advisory, AdvisorySource, BomFormatter, ReportStore};
    pub use crate::shared::{AnalysisError, ExitCode, Result};
}
