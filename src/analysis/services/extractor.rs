//! Signature-scanning extractor.
//!
//! Scans the firmware byte stream once, left to right, testing only the
//! rules whose magic could start at the current byte (first-byte index).
//! This scan is the performance-critical path for large images.

use crate::analysis::catalog::{Boundary, SignatureCatalog, SignatureRule};
use crate::analysis::domain::{Confidence, ExtractedComponent, FirmwareImage};
use crate::analysis::policies::overlap::{self, Candidate};
use crate::shared::AnalysisError;

/// A raw signature hit before boundary resolution.
struct RawMatch {
    rule: &'static SignatureRule,
    /// Component start (match position minus the rule's magic offset).
    start: usize,
}

pub struct Extractor {
    catalog: &'static SignatureCatalog,
}

impl Default for Extractor {
    fn default() -> Self {
        Self::new()
    }
}

impl Extractor {
    pub fn new() -> Self {
        Self {
            catalog: SignatureCatalog::global(),
        }
    }

    /// Extracts all recognizable components from `image`, ordered by offset.
    ///
    /// Fails with `CorruptImage` only when the image is shorter than the
    /// smallest signature's minimum component length. Unrecognized regions
    /// between components are not emitted.
    pub fn extract(
        &self,
        image: &FirmwareImage,
    ) -> Result<Vec<ExtractedComponent>, AnalysisError> {
        let min_len = self.catalog.min_component_len();
        if image.len() < min_len {
            return Err(AnalysisError::CorruptImage {
                reason: format!(
                    "image is {} bytes, below the smallest recognizable component ({} bytes)",
                    image.len(),
                    min_len
                ),
            });
        }

        let raw = self.scan(image.bytes());
        let candidates = self.resolve_candidates(image.bytes(), &raw);
        Ok(overlap::resolve(candidates))
    }

    /// Single pass over the byte stream collecting signature hits.
    fn scan(&self, bytes: &[u8]) -> Vec<RawMatch> {
        let mut matches = Vec::new();
        for pos in 0..bytes.len() {
            for rule in self.catalog.rules_for_first_byte(bytes[pos]) {
                let magic = rule.magic;
                if bytes.len() - pos < magic.len() || &bytes[pos..pos + magic.len()] != magic {
                    continue;
                }
                // The magic may sit at an interior offset of the component.
                let Some(start) = pos.checked_sub(rule.magic_offset) else {
                    continue;
                };
                if start + rule.min_len > bytes.len() {
                    continue;
                }
                matches.push(RawMatch { rule, start });
            }
        }
        matches
    }

    /// Resolves each hit to a bounded candidate, discarding corrupt ones
    /// (length fields or trailers that do not validate).
    fn resolve_candidates(&self, bytes: &[u8], raw: &[RawMatch]) -> Vec<Candidate> {
        let mut starts: Vec<usize> = raw.iter().map(|m| m.start).collect();
        starts.sort_unstable();
        starts.dedup();

        let mut candidates = Vec::with_capacity(raw.len());
        for m in raw {
            let (length, confidence) = match m.rule.resolve_length(bytes, m.start) {
                Some(length) => (length, Confidence::High),
                None => {
                    if !matches!(m.rule.boundary, Boundary::UntilNextMatch) {
                        // Header matched but the boundary did not validate.
                        continue;
                    }
                    let end = starts
                        .iter()
                        .find(|&&s| s > m.start)
                        .copied()
                        .unwrap_or(bytes.len());
                    (end - m.start, Confidence::Low)
                }
            };
            if length < m.rule.min_len {
                continue;
            }
            let Some(component) = ExtractedComponent::new(
                m.rule.kind,
                m.start,
                length,
                confidence,
                m.rule.id,
                bytes.len(),
            ) else {
                continue;
            };
            candidates.push(Candidate {
                component,
                priority: m.rule.priority,
            });
        }
        candidates
    }
}
