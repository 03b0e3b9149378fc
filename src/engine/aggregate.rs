//! Assembly of stage outcomes into report structures.
//!
//! The exact and fuzzy stages operate on unit indices; this module resolves
//! those indices back to documents and offsets and produces the
//! [`MatchGroup`]/[`GranularityReport`] records the reporter consumes.

use crate::scanner::Document;

use super::exact::ExactOutcome;
use super::fuzzy::FuzzyOutcome;
use super::groups::{GranularityReport, GroupMember, MatchGroup, MatchKind, SummaryRow};
use super::segment::{Granularity, TextUnit};

/// Build the report for one granularity from its stage outcomes.
///
/// Exact groups become duplicate groups with every member scored 100 and
/// the first occurrence's raw text as representative. Fuzzy groups become
/// similar groups carrying per-member best-edge scores. Both lists keep the
/// first-occurrence ordering the stages established.
#[must_use]
pub fn build_report(
    granularity: Granularity,
    units: &[TextUnit],
    documents: &[Document],
    exact: &ExactOutcome,
    fuzzy: Option<&FuzzyOutcome>,
) -> GranularityReport {
    let duplicates = exact
        .groups
        .iter()
        .map(|group| MatchGroup {
            granularity,
            kind: MatchKind::Duplicate,
            representative: units[group.units[0]].raw.clone(),
            members: members_of(&group.units, |_| 100, units, documents),
            window: units[group.units[0]].window,
        })
        .collect();

    let similar = fuzzy
        .map(|outcome| {
            outcome
                .groups
                .iter()
                .map(|group| MatchGroup {
                    granularity,
                    kind: MatchKind::Similar,
                    representative: group.representative.clone(),
                    members: members_of(
                        &group.units,
                        |pos| group.scores[pos],
                        units,
                        documents,
                    ),
                    window: units[group.units[0]].window,
                })
                .collect()
        })
        .unwrap_or_default();

    GranularityReport {
        granularity,
        duplicates,
        similar,
    }
}

fn members_of(
    unit_indices: &[usize],
    score_of: impl Fn(usize) -> u8,
    units: &[TextUnit],
    documents: &[Document],
) -> Vec<GroupMember> {
    unit_indices
        .iter()
        .enumerate()
        .map(|(pos, &idx)| {
            let unit = &units[idx];
            GroupMember {
                path: documents[unit.doc].path.clone(),
                doc: unit.doc,
                start: unit.start,
                end: unit.end,
                line: unit.line,
                score: score_of(pos),
            }
        })
        .collect()
}

/// Flatten reports into per-(granularity, kind) summary rows.
///
/// Rows follow the canonical granularity order with duplicates before
/// similar; (granularity, kind) pairs without groups get no row.
#[must_use]
pub fn summarize(reports: &[GranularityReport]) -> Vec<SummaryRow> {
    let mut rows = Vec::new();
    for report in reports {
        if !report.duplicates.is_empty() {
            rows.push(SummaryRow {
                granularity: report.granularity,
                kind: MatchKind::Duplicate,
                group_count: report.duplicates.len(),
                member_count: report.duplicates.iter().map(MatchGroup::len).sum(),
            });
        }
        if !report.similar.is_empty() {
            rows.push(SummaryRow {
                granularity: report.granularity,
                kind: MatchKind::Similar,
                group_count: report.similar.len(),
                member_count: report.similar.iter().map(MatchGroup::len).sum(),
            });
        }
    }
    rows
}
