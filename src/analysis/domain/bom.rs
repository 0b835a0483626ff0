use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;

/// Whether a BOM entry describes software or hardware.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BomCategory {
    Software,
    Hardware,
}

impl fmt::Display for BomCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BomCategory::Software => write!(f, "software"),
            BomCategory::Hardware => write!(f, "hardware"),
        }
    }
}

/// One inventory entry derived from extracted components.
///
/// Optional fields stay `None` when the metadata could not be recovered.
/// No placeholder strings are ever fabricated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BomEntry {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub supplier: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub license: Option<String>,
    pub category: BomCategory,
    /// Indices into the analysis run's extracted-component list.
    /// Back-references only; the entry does not own the components.
    pub sources: BTreeSet<usize>,
}

impl BomEntry {
    pub fn new(name: impl Into<String>, category: BomCategory, source: usize) -> Self {
        Self {
            name: name.into(),
            version: None,
            supplier: None,
            license: None,
            category,
            sources: BTreeSet::from([source]),
        }
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Deduplication identity within one BOM.
    pub fn identity(&self) -> (&str, Option<&str>) {
        (&self.name, self.version.as_deref())
    }

    /// Normalized cache/correlation key, `name@version`, lowercase.
    /// Only meaningful for entries with a resolved version.
    pub fn correlation_key(&self) -> Option<String> {
        let version = self.version.as_deref()?;
        Some(format!(
            "{}@{}",
            self.name.trim().to_ascii_lowercase(),
            version.trim().to_ascii_lowercase()
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_correlation_key_normalizes() {
        let entry = BomEntry::new("OpenSSL", BomCategory::Software, 0).with_version(" 1.1.1K ");
        assert_eq!(entry.correlation_key().as_deref(), Some("openssl@1.1.1k"));
    }

    #[test]
    fn test_correlation_key_requires_version() {
        let entry = BomEntry::new("unknown-filesystem", BomCategory::Software, 2);
        assert!(entry.correlation_key().is_none());
    }

    #[test]
    fn test_identity_distinguishes_versions() {
        let a = BomEntry::new("busybox", BomCategory::Software, 0).with_version("1.30.1");
        let b = BomEntry::new("busybox", BomCategory::Software, 1).with_version("1.31.0");
        assert_ne!(a.identity(), b.identity());
    }

    #[test]
    fn test_absent_fields_not_serialized() {
        let entry = BomEntry::new("unknown-archive", BomCategory::Software, 0);
        let json = serde_json::to_string(&entry).unwrap();
        assert!(!json.contains("version"));
        assert!(!json.contains("supplier"));
        assert!(!json.contains("license"));
    }
}
