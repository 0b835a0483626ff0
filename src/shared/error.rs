use std::fmt;
use thiserror::Error;

/// Exit codes for the CLI application.
///
/// These codes allow CI systems to distinguish between different
/// types of failures and successes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Success - analysis completed with no vulnerabilities found
    Success = 0,
    /// Analysis completed and at least one vulnerability matched
    VulnerabilitiesDetected = 1,
    /// Invalid command-line arguments (clap parsing errors)
    InvalidArguments = 2,
    /// Application error (corrupt image, ingest rejection, I/O error, etc.)
    ApplicationError = 3,
}

impl ExitCode {
    /// Convert to i32 for use with std::process::exit
    pub fn as_i32(self) -> i32 {
        self as i32
    }
}

impl fmt::Display for ExitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitCode::Success => write!(f, "Success (0)"),
            ExitCode::VulnerabilitiesDetected => write!(f, "Vulnerabilities Detected (1)"),
            ExitCode::InvalidArguments => write!(f, "Invalid Arguments (2)"),
            ExitCode::ApplicationError => write!(f, "Application Error (3)"),
        }
    }
}

/// Pipeline stages an analysis request moves through.
///
/// Transitions are one-directional: Received -> Extracting ->
/// BuildingInventory -> Correlating -> done. A failure records the
/// stage it happened in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Received,
    Extracting,
    BuildingInventory,
    Correlating,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Received => write!(f, "received"),
            Stage::Extracting => write!(f, "extracting"),
            Stage::BuildingInventory => write!(f, "building-inventory"),
            Stage::Correlating => write!(f, "correlating"),
        }
    }
}

/// Rejections raised before the pipeline starts, while validating the upload.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("firmware payload is too large: {size} bytes (limit {limit} bytes)")]
    PayloadTooLarge { size: u64, limit: u64 },

    #[error("unsupported firmware file extension: {extension:?} (allowed: {allowed})")]
    UnsupportedExtension { extension: String, allowed: String },
}

/// Fatal analysis errors.
///
/// Per-lookup failures during correlation are *not* represented here; they
/// degrade the report instead of failing the request.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// The image cannot be parsed at all. The only error that fails a
    /// request that already passed ingest validation.
    #[error("corrupt firmware image: {reason}")]
    CorruptImage { reason: String },

    #[error(transparent)]
    Ingest(#[from] IngestError),

    #[error("analysis failed during {stage} stage: {source}")]
    StageFailed {
        stage: Stage,
        #[source]
        source: anyhow::Error,
    },
}

impl AnalysisError {
    /// The stage the request failed in, for programmatic handling.
    pub fn failed_stage(&self) -> Stage {
        match self {
            AnalysisError::CorruptImage { .. } => Stage::Extracting,
            AnalysisError::Ingest(_) => Stage::Received,
            AnalysisError::StageFailed { stage, .. } => *stage,
        }
    }
}
