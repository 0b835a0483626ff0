use crate::analysis::domain::{AnalysisReport, FirmwareImage, ImageSummary};
use crate::analysis::services::{Extractor, InventoryBuilder};
use crate::application::dto::AnalysisRequest;
use crate::application::use_cases::correlate_vulnerabilities::CorrelateVulnerabilitiesUseCase;
use crate::ports::outbound::{AdvisorySource, ReportStore};
use crate::shared::{AnalysisError, IngestError, Stage};
use anyhow::anyhow;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Upload validation applied before any pipeline stage runs.
#[derive(Debug, Clone)]
pub struct IngressLimits {
    pub max_payload_bytes: u64,
    /// Lowercase extensions without the leading dot.
    pub allowed_extensions: Vec<String>,
}

impl Default for IngressLimits {
    fn default() -> Self {
        Self {
            max_payload_bytes: 256 * 1024 * 1024,
            allowed_extensions: ["bin", "img", "fw", "hex", "elf"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

impl IngressLimits {
    fn allowed_display(&self) -> String {
        self.allowed_extensions
            .iter()
            .map(|e| format!(".{}", e))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Tuning for the pipeline stages.
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub limits: IngressLimits,
    /// Deadline for the CPU-bound extraction stage.
    pub extraction_timeout: Duration,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            limits: IngressLimits::default(),
            extraction_timeout: Duration::from_secs(60),
        }
    }
}

/// AnalyzeFirmwareUseCase - orchestrates one analysis request
///
/// Moves the request through `Received -> Extracting -> BuildingInventory ->
/// Correlating -> Complete | Failed`. Only an unparseable image fails the
/// request; every correlation problem degrades the report instead. The
/// completed report is handed to the store, where it supersedes any earlier
/// report of the same image bytes.
///
/// # Type Parameters
/// * `S` - AdvisorySource implementation
/// * `R` - ReportStore implementation
pub struct AnalyzeFirmwareUseCase<S: AdvisorySource + 'static, R: ReportStore> {
    inventory_builder: InventoryBuilder,
    correlator: CorrelateVulnerabilitiesUseCase<S>,
    store: Arc<R>,
    settings: PipelineSettings,
}

impl<S: AdvisorySource + 'static, R: ReportStore> AnalyzeFirmwareUseCase<S, R> {
    pub fn new(
        correlator: CorrelateVulnerabilitiesUseCase<S>,
        store: Arc<R>,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            inventory_builder: InventoryBuilder::new(),
            correlator,
            store,
            settings,
        }
    }

    /// Executes the analysis pipeline for one upload.
    ///
    /// Cancelling `cancel` stops dispatching new vulnerability lookups and
    /// returns the partial report marked degraded.
    pub async fn execute(
        &self,
        request: AnalysisRequest,
        cancel: &CancellationToken,
    ) -> Result<AnalysisReport, AnalysisError> {
        info!(stage = %Stage::Received, filename = %request.filename, "analysis request accepted");
        self.validate_ingress(&request)?;

        let image = FirmwareImage::new(request.filename, request.bytes);
        let summary = ImageSummary {
            filename: image.filename().to_string(),
            size: image.len() as u64,
            content_hash: image.content_hash().to_string(),
        };

        info!(stage = %Stage::Extracting, size = image.len(), "scanning for component signatures");
        let components = self.extract(image.clone()).await?;

        info!(
            stage = %Stage::BuildingInventory,
            components = components.len(),
            "recovering component metadata"
        );
        let bom = self.inventory_builder.build(&image, &components);

        let (vulnerabilities, unresolved) = if request.skip_correlation {
            info!(stage = %Stage::Correlating, "correlation skipped (offline)");
            (Vec::new(), Vec::new())
        } else {
            info!(stage = %Stage::Correlating, entries = bom.len(), "correlating against advisory source");
            self.correlator.correlate(&bom, cancel).await
        };

        let report = AnalysisReport::new(summary, components, bom, vulnerabilities, unresolved);
        info!(
            report = %report.id,
            vulnerabilities = report.vulnerabilities.len(),
            degraded = report.degraded,
            "analysis complete"
        );

        // Persistence is best effort; the analysis itself succeeded.
        if let Err(error) = self.store.save(report.clone()).await {
            warn!(report = %report.id, %error, "failed to persist analysis report");
        }

        Ok(report)
    }

    fn validate_ingress(&self, request: &AnalysisRequest) -> Result<(), IngestError> {
        let limits = &self.settings.limits;

        let size = request.bytes.len() as u64;
        if size > limits.max_payload_bytes {
            return Err(IngestError::PayloadTooLarge {
                size,
                limit: limits.max_payload_bytes,
            });
        }

        let extension = request
            .filename
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .filter(|ext| !ext.is_empty());
        match extension {
            Some(ext) if limits.allowed_extensions.contains(&ext) => Ok(()),
            Some(ext) => Err(IngestError::UnsupportedExtension {
                extension: ext,
                allowed: limits.allowed_display(),
            }),
            None => Err(IngestError::UnsupportedExtension {
                extension: "(none)".to_string(),
                allowed: limits.allowed_display(),
            }),
        }
    }

    /// Runs the CPU-bound signature scan on a blocking worker, bounded by
    /// the stage timeout.
    async fn extract(
        &self,
        image: FirmwareImage,
    ) -> Result<Vec<crate::analysis::domain::ExtractedComponent>, AnalysisError> {
        let scan = tokio::task::spawn_blocking(move || Extractor::new().extract(&image));
        match tokio::time::timeout(self.settings.extraction_timeout, scan).await {
            Ok(Ok(result)) => result,
            Ok(Err(join_error)) => Err(AnalysisError::StageFailed {
                stage: Stage::Extracting,
                source: anyhow!("extraction worker failed: {}", join_error),
            }),
            Err(_) => Err(AnalysisError::StageFailed {
                stage: Stage::Extracting,
                source: anyhow!(
                    "extraction exceeded its {:?} deadline",
                    self.settings.extraction_timeout
                ),
            }),
        }
    }
}
