//! Match group records and run results.
//!
//! These are the output structures of the detection engine and the sole
//! types the reporter and cleanup marker are allowed to depend on.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::segment::Granularity;

/// Whether a group holds exact duplicates or near matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchKind {
    /// Members share one fingerprint (normalized keys are identical)
    Duplicate,
    /// Members are connected by similarity edges at or above the threshold
    Similar,
}

impl MatchKind {
    /// Lowercase label as used in summaries.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            MatchKind::Duplicate => "duplicate",
            MatchKind::Similar => "similar",
        }
    }
}

impl std::fmt::Display for MatchKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One occurrence inside a match group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupMember {
    /// Path of the owning document, relative to the scan root
    pub path: PathBuf,
    /// Index of the owning document in natural document order
    pub doc: usize,
    /// Start byte offset of the span in the document body
    pub start: usize,
    /// End byte offset of the span in the document body (exclusive)
    pub end: usize,
    /// 1-based line number in the original file
    pub line: usize,
    /// Similarity score against the group (100 for exact duplicates)
    pub score: u8,
}

/// A set of ≥2 text locations judged duplicate or similar.
///
/// Members are ordered by natural document order, then by offset within the
/// document. For duplicate groups all members share one fingerprint; for
/// similar groups every member is connected to every other through at least
/// one qualifying similarity edge (single-linkage transitive closure).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchGroup {
    /// Granularity the group was found at
    pub granularity: Granularity,
    /// Duplicate or similar
    pub kind: MatchKind,
    /// Representative text: raw text of the first occurrence for duplicates,
    /// lexicographically earliest normalized key for similar groups
    pub representative: String,
    /// Occurrences, ordered by document order then offset
    pub members: Vec<GroupMember>,
    /// Phrase window length in words, phrase granularity only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub window: Option<usize>,
}

impl MatchGroup {
    /// Number of occurrences in this group.
    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Check if this group is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Distinct document paths involved, in member order.
    #[must_use]
    pub fn paths(&self) -> Vec<&PathBuf> {
        let mut paths: Vec<&PathBuf> = Vec::new();
        for member in &self.members {
            if !paths.contains(&&member.path) {
                paths.push(&member.path);
            }
        }
        paths
    }

    /// Distinct similarity scores, descending.
    #[must_use]
    pub fn scores(&self) -> Vec<u8> {
        let mut scores: Vec<u8> = self.members.iter().map(|m| m.score).collect();
        scores.sort_unstable_by(|a, b| b.cmp(a));
        scores.dedup();
        scores
    }
}

/// Findings for one granularity.
///
/// Only granularities with at least one group appear in the run results;
/// empty categories are omitted, never serialized as empty artifacts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GranularityReport {
    /// The granularity these groups were found at
    pub granularity: Granularity,
    /// Exact duplicate groups, ordered by first occurrence
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub duplicates: Vec<MatchGroup>,
    /// Similar (fuzzy) groups, ordered by first occurrence
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub similar: Vec<MatchGroup>,
}

impl GranularityReport {
    /// Whether this report carries any group.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.duplicates.is_empty() && self.similar.is_empty()
    }
}

/// One flat summary record: group and member counts for a
/// (granularity, kind) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryRow {
    /// Granularity the counts refer to
    pub granularity: Granularity,
    /// Duplicate or similar
    pub kind: MatchKind,
    /// Number of groups
    pub group_count: usize,
    /// Total members across all groups
    pub member_count: usize,
}

/// A non-fatal condition surfaced in the run summary.
///
/// Warnings are recorded, never escalated to abort and never silently
/// dropped.
#[derive(Debug, Clone, Error, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RunWarning {
    /// A document could not be read or decoded and was skipped.
    #[error("skipped {path}: {message}")]
    SkippedDocument {
        /// Path of the skipped document
        path: PathBuf,
        /// Reason the document was skipped
        message: String,
    },

    /// A granularity's fuzzy stage was skipped.
    #[error("fuzzy matching skipped for {granularity}s: {reason}")]
    FuzzySkipped {
        /// Affected granularity
        granularity: Granularity,
        /// Why the stage was skipped (candidate ceiling or deadline)
        reason: String,
    },
}

/// Counters describing the work a run performed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineStats {
    /// Documents that were loaded and segmented
    pub documents: usize,
    /// Units produced per granularity (only enabled granularities appear)
    pub unit_counts: Vec<(Granularity, usize)>,
    /// Fuzzy pair comparisons actually performed
    pub fuzzy_comparisons: usize,
}

/// Complete results of one engine run.
///
/// This is the sole structure the reporter and the cleanup marker depend on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanResults {
    /// Per-granularity findings, canonical granularity order, empty
    /// granularities omitted
    pub reports: Vec<GranularityReport>,
    /// Flat per-(granularity, kind) counts
    pub summary: Vec<SummaryRow>,
    /// Non-fatal conditions encountered during the run
    pub warnings: Vec<RunWarning>,
    /// Work counters
    pub stats: EngineStats,
}

impl ScanResults {
    /// Whether any duplicate or similar group was found.
    #[must_use]
    pub fn has_findings(&self) -> bool {
        self.reports.iter().any(|r| !r.is_empty())
    }

    /// Total number of groups across all granularities and kinds.
    #[must_use]
    pub fn group_count(&self) -> usize {
        self.reports
            .iter()
            .map(|r| r.duplicates.len() + r.similar.len())
            .sum()
    }

    /// The report for one granularity, if it has findings.
    #[must_use]
    pub fn report_for(&self, granularity: Granularity) -> Option<&GranularityReport> {
        self.reports.iter().find(|r| r.granularity == granularity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn member(path: &str, doc: usize, start: usize, score: u8) -> GroupMember {
        GroupMember {
            path: PathBuf::from(path),
            doc,
            start,
            end: start + 4,
            line: 1,
            score,
        }
    }

    #[test]
    fn test_group_paths_dedup_in_order() {
        let group = MatchGroup {
            granularity: Granularity::Sentence,
            kind: MatchKind::Duplicate,
            representative: "text".to_string(),
            members: vec![
                member("a.txt", 0, 0, 100),
                member("a.txt", 0, 40, 100),
                member("b.txt", 1, 0, 100),
            ],
            window: None,
        };
        let paths = group.paths();
        assert_eq!(paths.len(), 2);
        assert_eq!(paths[0], &PathBuf::from("a.txt"));
        assert_eq!(paths[1], &PathBuf::from("b.txt"));
    }

    #[test]
    fn test_group_scores_descending_dedup() {
        let group = MatchGroup {
            granularity: Granularity::Sentence,
            kind: MatchKind::Similar,
            representative: "text".to_string(),
            members: vec![
                member("a.txt", 0, 0, 92),
                member("b.txt", 1, 0, 95),
                member("c.txt", 2, 0, 92),
            ],
            window: None,
        };
        assert_eq!(group.scores(), vec![95, 92]);
    }

    #[test]
    fn test_scan_results_has_findings() {
        let empty = ScanResults {
            reports: Vec::new(),
            summary: Vec::new(),
            warnings: Vec::new(),
            stats: EngineStats::default(),
        };
        assert!(!empty.has_findings());
        assert_eq!(empty.group_count(), 0);
    }

    #[test]
    fn test_warning_display() {
        let warning = RunWarning::FuzzySkipped {
            granularity: Granularity::Phrase,
            reason: "2500 candidates exceed ceiling of 2000".to_string(),
        };
        let text = warning.to_string();
        assert!(text.contains("phrases"));
        assert!(text.contains("ceiling"));
    }

    #[test]
    fn test_results_serde_roundtrip() {
        let results = ScanResults {
            reports: vec![GranularityReport {
                granularity: Granularity::Sentence,
                duplicates: vec![MatchGroup {
                    granularity: Granularity::Sentence,
                    kind: MatchKind::Duplicate,
                    representative: "hello.".to_string(),
                    members: vec![member("a.txt", 0, 0, 100)],
                    window: None,
                }],
                similar: Vec::new(),
            }],
            summary: vec![SummaryRow {
                granularity: Granularity::Sentence,
                kind: MatchKind::Duplicate,
                group_count: 1,
                member_count: 1,
            }],
            warnings: Vec::new(),
            stats: EngineStats::default(),
        };

        let json = serde_json::to_string(&results).unwrap();
        assert!(json.contains("\"sentence\""));
        // Empty similar list is omitted entirely
        assert!(!json.contains("\"similar\""));

        let back: ScanResults = serde_json::from_str(&json).unwrap();
        assert_eq!(back.reports.len(), 1);
        assert_eq!(back.summary[0].group_count, 1);
    }
}
