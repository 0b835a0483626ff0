use crate::analysis::domain::{BomEntry, ExtractedComponent, VulnerabilityRecord};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use uuid::Uuid;

/// Why a BOM entry could not be correlated. Machine readable; the entry is
/// reported as insufficient data rather than dropped or guessed at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum UnresolvedReason {
    /// The entry has no resolved version, so a lookup would only guess.
    MissingVersion,
    /// The per-entry lookup timeout elapsed.
    LookupTimeout,
    /// Upstream kept rate limiting past the retry budget.
    RateLimited,
    /// Upstream was unreachable or returned malformed data past the budget.
    SourceUnavailable,
    /// The request was cancelled before this entry was dispatched.
    Cancelled,
}

impl fmt::Display for UnresolvedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnresolvedReason::MissingVersion => write!(f, "missing version"),
            UnresolvedReason::LookupTimeout => write!(f, "lookup timeout"),
            UnresolvedReason::RateLimited => write!(f, "rate limited"),
            UnresolvedReason::SourceUnavailable => write!(f, "source unavailable"),
            UnresolvedReason::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// A correlation that produced insufficient data instead of a result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnresolvedLookup {
    /// BOM entry name, or `name@version` when the version was known.
    pub entry: String,
    pub reason: UnresolvedReason,
}

/// Metadata of the analyzed image carried on the report.
#[derive(Debug, Clone, Serialize)]
pub struct ImageSummary {
    pub filename: String,
    pub size: u64,
    pub content_hash: String,
}

/// The immutable outcome of one analysis run.
///
/// Created once per upload; a re-analysis of the same image produces a new
/// report that supersedes this one in the store, it never mutates it.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub id: Uuid,
    pub image: ImageSummary,
    /// Ordered by extraction offset.
    pub components: Vec<ExtractedComponent>,
    /// Ordered by first source offset, then name.
    pub bom: Vec<BomEntry>,
    /// Ranked: severity desc, score desc, advisory id asc.
    pub vulnerabilities: Vec<VulnerabilityRecord>,
    pub unresolved: Vec<UnresolvedLookup>,
    /// True when the run completed but some correlations are unresolved.
    pub degraded: bool,
    pub generated_at: DateTime<Utc>,
}

impl AnalysisReport {
    pub fn new(
        image: ImageSummary,
        components: Vec<ExtractedComponent>,
        bom: Vec<BomEntry>,
        vulnerabilities: Vec<VulnerabilityRecord>,
        unresolved: Vec<UnresolvedLookup>,
    ) -> Self {
        let degraded = !unresolved.is_empty();
        Self {
            id: Uuid::new_v4(),
            image,
            components,
            bom,
            vulnerabilities,
            unresolved,
            degraded,
            generated_at: Utc::now(),
        }
    }
}

/// Formats a byte count the way the component listing displays sizes.
pub fn format_size(size: u64) -> String {
    if size < 1024 {
        format!("{} B", size)
    } else if size < 1024 * 1024 {
        format!("{:.1} KB", size as f64 / 1024.0)
    } else {
        format!("{:.1} MB", size as f64 / (1024.0 * 1024.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary() -> ImageSummary {
        ImageSummary {
            filename: "router.bin".to_string(),
            size: 64,
            content_hash: "deadbeef".to_string(),
        }
    }

    #[test]
    fn test_degraded_follows_unresolved() {
        let clean = AnalysisReport::new(summary(), vec![], vec![], vec![], vec![]);
        assert!(!clean.degraded);

        let degraded = AnalysisReport::new(
            summary(),
            vec![],
            vec![],
            vec![],
            vec![UnresolvedLookup {
                entry: "openssl@1.1.1k".to_string(),
                reason: UnresolvedReason::LookupTimeout,
            }],
        );
        assert!(degraded.degraded);
    }

    #[test]
    fn test_reports_get_distinct_ids() {
        let a = AnalysisReport::new(summary(), vec![], vec![], vec![], vec![]);
        let b = AnalysisReport::new(summary(), vec![], vec![], vec![], vec![]);
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(2048), "2.0 KB");
        assert_eq!(format_size(5 * 1024 * 1024), "5.0 MB");
    }
}
