use crate::analysis::domain::{
    format_size, AnalysisReport, BomEntry, UnresolvedLookup, VulnerabilityRecord,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// One extracted component as it appears in the egress document.
#[derive(Debug, Clone, Serialize)]
pub struct ComponentView {
    pub kind: String,
    pub offset: usize,
    pub length: usize,
    /// Human-readable rendering of `length`.
    pub size: String,
    pub confidence: String,
    pub nested: bool,
    pub rule: String,
}

/// AnalysisResponse - Egress DTO for one completed analysis run
///
/// A flattened, serde-serializable view of the report. Ordering mirrors the
/// report exactly (components by offset, BOM by first source then name,
/// vulnerabilities ranked) so repeated serializations are byte-identical.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisResponse {
    pub id: Uuid,
    pub filename: String,
    pub content_hash: String,
    pub image_size: u64,
    pub components: Vec<ComponentView>,
    pub bom: Vec<BomEntry>,
    pub vulnerabilities: Vec<VulnerabilityRecord>,
    pub unresolved: Vec<UnresolvedLookup>,
    pub degraded: bool,
    pub generated_at: DateTime<Utc>,
}

impl AnalysisResponse {
    pub fn from_report(report: &AnalysisReport) -> Self {
        let components = report
            .components
            .iter()
            .map(|c| ComponentView {
                kind: c.kind.label().to_string(),
                offset: c.offset,
                length: c.length,
                size: format_size(c.length as u64),
                confidence: format!("{:?}", c.confidence).to_ascii_lowercase(),
                nested: c.nested,
                rule: c.rule_id.to_string(),
            })
            .collect();

        Self {
            id: report.id,
            filename: report.image.filename.clone(),
            content_hash: report.image.content_hash.clone(),
            image_size: report.image.size,
            components,
            bom: report.bom.clone(),
            vulnerabilities: report.vulnerabilities.clone(),
            unresolved: report.unresolved.clone(),
            degraded: report.degraded,
            generated_at: report.generated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::domain::{
        ComponentKind, Confidence, ExtractedComponent, ImageSummary,
    };

    fn report() -> AnalysisReport {
        let component = ExtractedComponent::new(
            ComponentKind::Filesystem,
            0x40000,
            0x1000,
            Confidence::High,
            "squashfs-le",
            1 << 20,
        )
        .unwrap();
        AnalysisReport::new(
            ImageSummary {
                filename: "router.bin".to_string(),
                size: 1 << 20,
                content_hash: "cafe".to_string(),
            },
            vec![component],
            vec![],
            vec![],
            vec![],
        )
    }

    #[test]
    fn test_component_view_carries_human_size() {
        let response = AnalysisResponse::from_report(&report());
        assert_eq!(response.components.len(), 1);
        assert_eq!(response.components[0].kind, "filesystem");
        assert_eq!(response.components[0].size, "4.0 KB");
        assert_eq!(response.components[0].confidence, "high");
    }

    #[test]
    fn test_serialization_is_stable() {
        let response = AnalysisResponse::from_report(&report());
        let a = serde_json::to_string(&response).unwrap();
        let b = serde_json::to_string(&response).unwrap();
        assert_eq!(a, b);
    }
}
