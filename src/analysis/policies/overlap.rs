//! Overlap resolution for extraction candidates.
//!
//! Firmware images legitimately nest (a gzip member inside a filesystem),
//! so overlapping candidates are not errors. The policy:
//!
//! - candidates are considered in offset order, longest first, then by
//!   descending rule priority;
//! - a candidate fully contained in an already-accepted candidate of
//!   strictly higher priority is discarded as redundant;
//! - any other overlap keeps the candidate but marks it `nested`, so the
//!   inventory does not double count storage size;
//! - non-nested components therefore never overlap each other.

use crate::analysis::domain::ExtractedComponent;
use std::cmp::Reverse;

/// An extraction candidate paired with its rule's priority.
#[derive(Debug)]
pub struct Candidate {
    pub component: ExtractedComponent,
    pub priority: u8,
}

/// Applies the overlap policy, returning accepted components in offset order.
pub fn resolve(mut candidates: Vec<Candidate>) -> Vec<ExtractedComponent> {
    candidates.sort_by_key(|c| {
        (
            c.component.offset,
            Reverse(c.component.length),
            Reverse(c.priority),
        )
    });

    let mut accepted: Vec<Candidate> = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        let contained_in_stronger = accepted.iter().any(|a| {
            a.priority > candidate.priority && a.component.contains(&candidate.component)
        });
        if contained_in_stronger {
            continue;
        }

        let mut component = candidate.component;
        component.nested = accepted.iter().any(|a| a.component.overlaps(&component));
        accepted.push(Candidate {
            component,
            priority: candidate.priority,
        });
    }

    accepted.into_iter().map(|c| c.component).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::domain::{ComponentKind, Confidence};

    fn candidate(
        kind: ComponentKind,
        offset: usize,
        length: usize,
        priority: u8,
    ) -> Candidate {
        Candidate {
            component: ExtractedComponent::new(
                kind,
                offset,
                length,
                Confidence::Low,
                "test",
                1 << 24,
            )
            .unwrap(),
            priority,
        }
    }

    #[test]
    fn test_disjoint_candidates_all_kept_top_level() {
        let resolved = resolve(vec![
            candidate(ComponentKind::Kernel, 0x40000, 0x1000, 90),
            candidate(ComponentKind::Filesystem, 0, 0x1000, 80),
        ]);
        assert_eq!(resolved.len(), 2);
        assert_eq!(resolved[0].offset, 0);
        assert_eq!(resolved[1].offset, 0x40000);
        assert!(resolved.iter().all(|c| !c.nested));
    }

    #[test]
    fn test_contained_in_higher_priority_is_dropped() {
        // generic gzip inside a filesystem superblock's extent
        let resolved = resolve(vec![
            candidate(ComponentKind::Filesystem, 0, 0x10000, 80),
            candidate(ComponentKind::Archive, 0x100, 0x100, 80),
            candidate(ComponentKind::Archive, 0x200, 0x100, 20),
        ]);
        // the equal-priority archive survives as nested, the weaker one
        // survives too: only *higher* priority containment discards
        assert_eq!(resolved.len(), 2);
        assert_eq!(resolved[0].offset, 0);
        assert_eq!(resolved[1].offset, 0x100);
        assert!(resolved[1].nested);
    }

    #[test]
    fn test_partial_overlap_both_retained_later_nested() {
        let resolved = resolve(vec![
            candidate(ComponentKind::Filesystem, 0, 0x1000, 80),
            candidate(ComponentKind::Archive, 0x800, 0x1000, 20),
        ]);
        assert_eq!(resolved.len(), 2);
        assert!(!resolved[0].nested);
        assert!(resolved[1].nested);
    }

    #[test]
    fn test_longest_wins_at_equal_offset() {
        // the filesystem sorts first (longest) and its containment of the
        // weaker archive discards it entirely
        let resolved = resolve(vec![
            candidate(ComponentKind::Archive, 0, 0x100, 20),
            candidate(ComponentKind::Filesystem, 0, 0x1000, 80),
        ]);
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].length, 0x1000);
        assert!(!resolved[0].nested);
    }

    #[test]
    fn test_non_nested_components_never_overlap() {
        let resolved = resolve(vec![
            candidate(ComponentKind::Filesystem, 0, 0x2000, 80),
            candidate(ComponentKind::Archive, 0x1000, 0x2000, 20),
            candidate(ComponentKind::Kernel, 0x4000, 0x1000, 90),
        ]);
        let top_level: Vec<_> = resolved.iter().filter(|c| !c.nested).collect();
        for (i, a) in top_level.iter().enumerate() {
            for b in &top_level[i + 1..] {
                assert!(!a.overlaps(b));
            }
        }
    }
}
