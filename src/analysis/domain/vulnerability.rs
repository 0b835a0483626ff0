use crate::shared::Result;
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;

/// CVSS base score, bounded to 0.0..=10.0 at construction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CvssScore(f32);

impl CvssScore {
    pub fn new(value: f32) -> Result<Self> {
        if !(0.0..=10.0).contains(&value) || value.is_nan() {
            anyhow::bail!("CVSS score must be within 0.0..=10.0, got {}", value);
        }
        Ok(Self(value))
    }

    pub fn value(&self) -> f32 {
        self.0
    }
}

/// Severity bands derived from the score via fixed thresholds
/// (9.0 critical, 7.0 high, 4.0 medium).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn from_score(score: CvssScore) -> Self {
        let value = score.value();
        if value >= 9.0 {
            Severity::Critical
        } else if value >= 7.0 {
            Severity::High
        } else if value >= 4.0 {
            Severity::Medium
        } else {
            Severity::Low
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Critical => write!(f, "critical"),
            Severity::High => write!(f, "high"),
            Severity::Medium => write!(f, "medium"),
            Severity::Low => write!(f, "low"),
        }
    }
}

/// One matched advisory, merged across all BOM entries it applies to.
#[derive(Debug, Clone, Serialize)]
pub struct VulnerabilityRecord {
    /// Advisory identifier, e.g. "CVE-2021-3711".
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub score: CvssScore,
    pub severity: Severity,
    /// Correlation keys (`name@version`) of the BOM entries this advisory
    /// matched. BTreeSet keeps output deterministic.
    pub matched_entries: BTreeSet<String>,
}

impl VulnerabilityRecord {
    pub fn new(
        id: impl Into<String>,
        description: Option<String>,
        score: CvssScore,
        entry_key: String,
    ) -> Self {
        Self {
            id: id.into(),
            description,
            score,
            severity: Severity::from_score(score),
            matched_entries: BTreeSet::from([entry_key]),
        }
    }

    /// Folds another sighting of the same advisory into this record.
    pub fn merge(&mut self, other: VulnerabilityRecord) {
        debug_assert_eq!(self.id, other.id);
        self.matched_entries.extend(other.matched_entries);
        if self.description.is_none() {
            self.description = other.description;
        }
        // Keep the worse score if sources disagree.
        if other.score.value() > self.score.value() {
            self.score = other.score;
            self.severity = Severity::from_score(other.score);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_score_bounds() {
        assert!(CvssScore::new(0.0).is_ok());
        assert!(CvssScore::new(10.0).is_ok());
        assert!(CvssScore::new(-0.1).is_err());
        assert!(CvssScore::new(10.1).is_err());
        assert!(CvssScore::new(f32::NAN).is_err());
    }

    #[test]
    fn test_severity_thresholds() {
        let sev = |v: f32| Severity::from_score(CvssScore::new(v).unwrap());
        assert_eq!(sev(9.8), Severity::Critical);
        assert_eq!(sev(9.0), Severity::Critical);
        assert_eq!(sev(8.9), Severity::High);
        assert_eq!(sev(7.0), Severity::High);
        assert_eq!(sev(6.9), Severity::Medium);
        assert_eq!(sev(4.0), Severity::Medium);
        assert_eq!(sev(3.9), Severity::Low);
        assert_eq!(sev(0.0), Severity::Low);
    }

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Critical > Severity::High);
        assert!(Severity::High > Severity::Medium);
        assert!(Severity::Medium > Severity::Low);
    }

    #[test]
    fn test_merge_accumulates_entries_and_keeps_worse_score() {
        let mut record = VulnerabilityRecord::new(
            "CVE-2024-0001",
            None,
            CvssScore::new(7.5).unwrap(),
            "openssl@1.1.1k".to_string(),
        );
        let other = VulnerabilityRecord::new(
            "CVE-2024-0001",
            Some("heap overflow".to_string()),
            CvssScore::new(9.8).unwrap(),
            "busybox@1.30.1".to_string(),
        );
        record.merge(other);

        assert_eq!(record.matched_entries.len(), 2);
        assert_eq!(record.score.value(), 9.8);
        assert_eq!(record.severity, Severity::Critical);
        assert_eq!(record.description.as_deref(), Some("heap overflow"));
    }
}
