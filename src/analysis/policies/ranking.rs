//! Merging and deterministic ranking of correlated advisories.

use crate::analysis::domain::VulnerabilityRecord;
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Merges records referencing the same advisory id and ranks the result.
///
/// Ranking keys: severity (critical first), then score descending, then
/// advisory id ascending. The id tie-break keeps output reproducible when
/// severity and score are equal.
pub fn merge_and_rank(records: Vec<VulnerabilityRecord>) -> Vec<VulnerabilityRecord> {
    let mut by_id: BTreeMap<String, VulnerabilityRecord> = BTreeMap::new();
    for record in records {
        match by_id.get_mut(&record.id) {
            Some(existing) => existing.merge(record),
            None => {
                by_id.insert(record.id.clone(), record);
            }
        }
    }

    let mut ranked: Vec<VulnerabilityRecord> = by_id.into_values().collect();
    ranked.sort_by(|a, b| {
        b.severity
            .cmp(&a.severity)
            .then_with(|| {
                b.score
                    .value()
                    .partial_cmp(&a.score.value())
                    .unwrap_or(Ordering::Equal)
            })
            .then_with(|| a.id.cmp(&b.id))
    });
    ranked
}
