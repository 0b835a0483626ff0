use crate::analysis::domain::{AnalysisReport, BomEntry};
use crate::ports::outbound::BomFormatter;
use crate::shared::Result;
use serde::Serialize;

#[derive(Debug, Serialize)]
struct Document {
    #[serde(rename = "spdxVersion")]
    spdx_version: String,
    #[serde(rename = "dataLicense")]
    data_license: String,
    #[serde(rename = "SPDXID")]
    spdx_id: String,
    name: String,
    #[serde(rename = "documentNamespace")]
    document_namespace: String,
    #[serde(rename = "creationInfo")]
    creation_info: CreationInfo,
    packages: Vec<Package>,
    relationships: Vec<Relationship>,
}

#[derive(Debug, Serialize)]
struct CreationInfo {
    created: String,
    creators: Vec<String>,
}

#[derive(Debug, Serialize)]
struct Package {
    name: String,
    #[serde(rename = "SPDXID")]
    spdx_id: String,
    #[serde(rename = "versionInfo", skip_serializing_if = "Option::is_none")]
    version_info: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    supplier: Option<String>,
    #[serde(rename = "licenseConcluded", skip_serializing_if = "Option::is_none")]
    license_concluded: Option<String>,
    #[serde(rename = "downloadLocation")]
    download_location: String,
    #[serde(rename = "filesAnalyzed")]
    files_analyzed: bool,
}

#[derive(Debug, Serialize)]
struct Relationship {
    #[serde(rename = "spdxElementId")]
    spdx_element_id: String,
    #[serde(rename = "relationshipType")]
    relationship_type: String,
    #[serde(rename = "relatedSpdxElement")]
    related_spdx_element: String,
}

/// SpdxFormatter adapter for generating SPDX 2.3 JSON documents
///
/// Implements the BomFormatter port. Fields the analysis could not recover
/// are omitted from the document, never filled with placeholder values.
pub struct SpdxFormatter;

impl SpdxFormatter {
    pub fn new() -> Self {
        Self
    }

    fn build_package(entry: &BomEntry, index: usize) -> Package {
        Package {
            name: entry.name.clone(),
            spdx_id: format!("SPDXRef-Package-{}", index),
            version_info: entry.version.clone(),
            supplier: entry
                .supplier
                .as_ref()
                .map(|s| format!("Organization: {}", s)),
            license_concluded: entry.license.clone(),
            download_location: "NOASSERTION".to_string(),
            files_analyzed: false,
        }
    }
}

impl Default for SpdxFormatter {
    fn default() -> Self {
        Self::new()
    }
}

impl BomFormatter for SpdxFormatter {
    fn format(&self, report: &AnalysisReport) -> Result<String> {
        let packages: Vec<Package> = report
            .bom
            .iter()
            .enumerate()
            .map(|(index, entry)| Self::build_package(entry, index))
            .collect();

        let relationships = packages
            .iter()
            .map(|package| Relationship {
                spdx_element_id: "SPDXRef-DOCUMENT".to_string(),
                relationship_type: "DESCRIBES".to_string(),
                related_spdx_element: package.spdx_id.clone(),
            })
            .collect();

        let document = Document {
            spdx_version: "SPDX-2.3".to_string(),
            data_license: "CC0-1.0".to_string(),
            spdx_id: "SPDXRef-DOCUMENT".to_string(),
            name: format!("firmlens-{}", report.image.filename),
            document_namespace: format!(
                "https://firmlens.local/spdx/{}/{}",
                report.image.content_hash, report.id
            ),
            creation_info: CreationInfo {
                created: report.generated_at.to_rfc3339(),
                creators: vec![format!("Tool: firmlens-{}", env!("CARGO_PKG_VERSION"))],
            },
            packages,
            relationships,
        };

        Ok(serde_json::to_string_pretty(&document)?)
    }
}
