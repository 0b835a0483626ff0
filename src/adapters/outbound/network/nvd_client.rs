use crate::ports::outbound::{Advisory, AdvisorySource, LookupError};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

/// NVD CVE API 2.0 client
///
/// Performs a keyword search for `<name> <version>` against the NVD REST
/// API and maps each CVE onto an `Advisory`. The CVSS base score is taken
/// with metric fallback v3.1 -> v3.0 -> v2; CVEs carrying no metric at all
/// are reported with score 0.0.
///
/// Failures map onto the lookup taxonomy (429 -> TooManyRequests, 5xx and
/// transport errors -> Unavailable, elapsed deadline -> Timeout, bad JSON
/// -> Malformed) so the correlator can decide what to retry.
pub struct NvdClient {
    client: Client,
    api_url: String,
}

impl NvdClient {
    const API_ENDPOINT: &'static str = "https://services.nvd.nist.gov/rest/json/cves/2.0";
    const TIMEOUT_SECONDS: u64 = 30;
    const RESULTS_PER_PAGE: u32 = 50;

    /// Creates a client against the public NVD endpoint.
    pub fn new() -> Result<Self, LookupError> {
        Self::with_endpoint(Self::API_ENDPOINT.to_string())
    }

    /// Creates a client against an alternate endpoint (mirrors, tests).
    pub fn with_endpoint(api_url: String) -> Result<Self, LookupError> {
        let user_agent = format!("firmlens/{}", env!("CARGO_PKG_VERSION"));
        let client = Client::builder()
            .timeout(Duration::from_secs(Self::TIMEOUT_SECONDS))
            .user_agent(user_agent)
            .build()
            .map_err(|e| LookupError::Unavailable(e.to_string()))?;

        Ok(Self { client, api_url })
    }
}

#[async_trait]
impl AdvisorySource for NvdClient {
    async fn search(
        &self,
        keyword: &str,
        version: Option<&str>,
    ) -> Result<Vec<Advisory>, LookupError> {
        let keyword_search = match version {
            Some(version) => format!("{} {}", keyword, version),
            None => keyword.to_string(),
        };
        debug!(keyword = %keyword_search, "querying NVD");

        let per_page = Self::RESULTS_PER_PAGE.to_string();
        let response = self
            .client
            .get(&self.api_url)
            .query(&[
                ("keywordSearch", keyword_search.as_str()),
                ("resultsPerPage", per_page.as_str()),
            ])
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LookupError::Timeout
                } else {
                    LookupError::Unavailable(e.to_string())
                }
            })?;

        match response.status() {
            StatusCode::TOO_MANY_REQUESTS => return Err(LookupError::TooManyRequests),
            status if status.is_server_error() => {
                return Err(LookupError::Unavailable(format!(
                    "NVD returned status {}",
                    status
                )))
            }
            status if !status.is_success() => {
                return Err(LookupError::Malformed(format!(
                    "NVD returned status {}",
                    status
                )))
            }
            _ => {}
        }

        let body: NvdResponse = response
            .json()
            .await
            .map_err(|e| LookupError::Malformed(e.to_string()))?;

        Ok(body
            .vulnerabilities
            .into_iter()
            .map(|wrapper| to_advisory(wrapper.cve))
            .collect())
    }
}

fn to_advisory(cve: NvdCve) -> Advisory {
    let description = cve
        .descriptions
        .iter()
        .find(|d| d.lang == "en")
        .or_else(|| cve.descriptions.first())
        .map(|d| d.value.clone());

    Advisory {
        id: cve.id,
        description,
        score: base_score(&cve.metrics),
        published: cve.published,
        last_modified: cve.last_modified,
    }
}

/// CVSS base score with metric fallback v3.1 -> v3.0 -> v2.
fn base_score(metrics: &NvdMetrics) -> f32 {
    let v3 = |entries: &[CvssV3Entry]| entries.first().map(|m| m.cvss_data.base_score);
    v3(&metrics.cvss_metric_v31)
        .or_else(|| v3(&metrics.cvss_metric_v30))
        .or_else(|| metrics.cvss_metric_v2.first().map(|m| m.cvss_data.base_score))
        .unwrap_or(0.0)
}

// NVD API 2.0 response structures

#[derive(Debug, Deserialize)]
struct NvdResponse {
    #[serde(default)]
    vulnerabilities: Vec<NvdVulnerability>,
}

#[derive(Debug, Deserialize)]
struct NvdVulnerability {
    cve: NvdCve,
}

#[derive(Debug, Deserialize)]
struct NvdCve {
    id: String,
    #[serde(default)]
    descriptions: Vec<NvdDescription>,
    #[serde(default)]
    metrics: NvdMetrics,
    #[serde(default)]
    published: Option<String>,
    #[serde(default, rename = "lastModified")]
    last_modified: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NvdDescription {
    lang: String,
    value: String,
}

#[derive(Debug, Default, Deserialize)]
struct NvdMetrics {
    #[serde(default, rename = "cvssMetricV31")]
    cvss_metric_v31: Vec<CvssV3Entry>,
    #[serde(default, rename = "cvssMetricV30")]
    cvss_metric_v30: Vec<CvssV3Entry>,
    #[serde(default, rename = "cvssMetricV2")]
    cvss_metric_v2: Vec<CvssV2Entry>,
}

#[derive(Debug, Deserialize)]
struct CvssV3Entry {
    #[serde(rename = "cvssData")]
    cvss_data: CvssData,
}

#[derive(Debug, Deserialize)]
struct CvssV2Entry {
    #[serde(rename = "cvssData")]
    cvss_data: CvssData,
}

#[derive(Debug, Deserialize)]
struct CvssData {
    #[serde(rename = "baseScore")]
    base_score: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        assert!(NvdClient::new().is_ok());
    }

    #[test]
    fn test_deserialize_empty_response() {
        let json = r#"{"resultsPerPage": 0, "totalResults": 0, "vulnerabilities": []}"#;
        let response: NvdResponse = serde_json::from_str(json).unwrap();
        assert!(response.vulnerabilities.is_empty());
    }

    #[test]
    fn test_v31_metric_preferred() {
        let json = r#"{
            "vulnerabilities": [
                {
                    "cve": {
                        "id": "CVE-2021-3711",
                        "published": "2021-08-24T15:15:09.800",
                        "lastModified": "2024-06-27T18:44:33.340",
                        "descriptions": [
                            {"lang": "en", "value": "SM2 decryption buffer overflow."},
                            {"lang": "es", "value": "Desbordamiento del buffer."}
                        ],
                        "metrics": {
                            "cvssMetricV31": [
                                {"cvssData": {"baseScore": 9.8}}
                            ],
                            "cvssMetricV2": [
                                {"cvssData": {"baseScore": 7.5}}
                            ]
                        }
                    }
                }
            ]
        }"#;
        let response: NvdResponse = serde_json::from_str(json).unwrap();
        let advisory = to_advisory(response.vulnerabilities.into_iter().next().unwrap().cve);

        assert_eq!(advisory.id, "CVE-2021-3711");
        assert_eq!(advisory.score, 9.8);
        assert_eq!(
            advisory.description.as_deref(),
            Some("SM2 decryption buffer overflow.")
        );
        assert_eq!(advisory.published.as_deref(), Some("2021-08-24T15:15:09.800"));
    }

    #[test]
    fn test_v2_fallback_when_no_v3() {
        let metrics: NvdMetrics = serde_json::from_str(
            r#"{"cvssMetricV2": [{"cvssData": {"baseScore": 6.4}}]}"#,
        )
        .unwrap();
        assert_eq!(base_score(&metrics), 6.4);
    }

    #[test]
    fn test_missing_metrics_scores_zero() {
        let metrics = NvdMetrics::default();
        assert_eq!(base_score(&metrics), 0.0);
    }

    #[test]
    fn test_non_english_description_used_as_fallback() {
        let cve: NvdCve = serde_json::from_str(
            r#"{
                "id": "CVE-2024-0001",
                "descriptions": [{"lang": "es", "value": "Solo en castellano."}]
            }"#,
        )
        .unwrap();
        let advisory = to_advisory(cve);
        assert_eq!(advisory.description.as_deref(), Some("Solo en castellano."));
    }
}
