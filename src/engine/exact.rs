//! Exact-match grouping via content fingerprints.
//!
//! All units of one granularity, across all documents, are grouped by the
//! BLAKE3 fingerprint of their normalized key. Every fingerprint with two or
//! more occurrences becomes one duplicate group; single-occurrence
//! fingerprints are discarded silently. Units from the same document count,
//! so "duplicate within one file" is a valid group.
//!
//! Groups are ordered by first occurrence (earliest document, earliest
//! offset), which keeps output deterministic and stable across reruns on
//! unchanged input.

use std::collections::HashMap;

use super::fingerprint::{fingerprint, Fingerprint};
use super::segment::TextUnit;

/// A set of unit indices sharing one fingerprint.
#[derive(Debug, Clone)]
pub struct ExactGroup {
    /// Shared fingerprint of the normalized key
    pub fingerprint: Fingerprint,
    /// Indices into the granularity's unit slice, in unit order
    pub units: Vec<usize>,
}

/// Statistics from the exact grouping stage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExactStats {
    /// Units that entered the stage
    pub total_units: usize,
    /// Distinct fingerprints observed
    pub unique_fingerprints: usize,
    /// Groups with 2+ occurrences
    pub duplicate_groups: usize,
    /// Units covered by those groups
    pub duplicate_units: usize,
}

/// Outcome of exact grouping: the groups plus a per-unit coverage mask.
///
/// The mask marks every unit that fell into a duplicate group, so the fuzzy
/// stage can exclude them and nothing is reported as both duplicate and
/// similar.
#[derive(Debug)]
pub struct ExactOutcome {
    /// Duplicate groups ordered by first occurrence
    pub groups: Vec<ExactGroup>,
    /// `matched[i]` is true iff unit `i` is in some group
    pub matched: Vec<bool>,
    /// Stage counters
    pub stats: ExactStats,
}

/// Group all units of one granularity by fingerprint.
///
/// The input slice must already be in natural document order, then offset
/// order; the segmenter produces it that way and the group ordering relies
/// on it.
#[must_use]
pub fn group_exact(units: &[TextUnit]) -> ExactOutcome {
    let mut by_fingerprint: HashMap<Fingerprint, Vec<usize>> = HashMap::new();

    for (idx, unit) in units.iter().enumerate() {
        by_fingerprint
            .entry(fingerprint(&unit.key))
            .or_default()
            .push(idx);
    }

    let unique_fingerprints = by_fingerprint.len();

    let mut groups: Vec<ExactGroup> = by_fingerprint
        .into_iter()
        .filter(|(_, indices)| indices.len() >= 2)
        .map(|(fingerprint, units)| ExactGroup { fingerprint, units })
        .collect();

    // First occurrence decides group order; member vectors are already
    // sorted because units were visited in order
    groups.sort_by_key(|g| g.units[0]);

    let mut matched = vec![false; units.len()];
    let mut duplicate_units = 0;
    for group in &groups {
        for &idx in &group.units {
            matched[idx] = true;
            duplicate_units += 1;
        }
    }

    let stats = ExactStats {
        total_units: units.len(),
        unique_fingerprints,
        duplicate_groups: groups.len(),
        duplicate_units,
    };

    if !units.is_empty() {
        log::debug!(
            "{}: {} units, {} unique keys, {} duplicate group(s)",
            units[0].granularity,
            stats.total_units,
            stats.unique_fingerprints,
            stats.duplicate_groups
        );
    }

    ExactOutcome {
        groups,
        matched,
        stats,
    }
}
