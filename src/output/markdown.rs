//! Markdown report generation.
//!
//! One file per non-empty (granularity, kind) pair inside the output
//! directory: `duplicated_sentences.md`, `similar_paragraphs.md` and so on.
//! Phrase duplicates are additionally split per window length
//! (`duplicated_phrases_3_words.md`) so short and long windows do not drown
//! each other out. Word entries carry their occurrence count inline.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::engine::{Granularity, MatchGroup, MatchKind, ScanResults};

use super::preview;

/// Rendering options for markdown reports.
#[derive(Debug, Clone, Copy)]
pub struct MarkdownOptions {
    /// Render member paths as markdown links
    pub file_links: bool,
}

impl Default for MarkdownOptions {
    fn default() -> Self {
        Self { file_links: true }
    }
}

/// Write all markdown reports for a run.
///
/// The output directory is created if absent. Returns the paths written, in
/// write order. Granularities and kinds without groups produce no file.
///
/// # Errors
///
/// Returns an error if the output directory or any report file cannot be
/// written.
pub fn write_markdown_reports(
    results: &ScanResults,
    dir: &Path,
    options: MarkdownOptions,
) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dir)
        .with_context(|| format!("failed to create output directory {}", dir.display()))?;

    let mut written = Vec::new();
    for report in &results.reports {
        for (kind, groups) in [
            (MatchKind::Duplicate, &report.duplicates),
            (MatchKind::Similar, &report.similar),
        ] {
            if groups.is_empty() {
                continue;
            }
            if report.granularity == Granularity::Phrase && kind == MatchKind::Duplicate {
                written.extend(write_phrase_reports(groups, dir, options)?);
            } else {
                let name = report_file_name(report.granularity, kind, None);
                let body = render_report(report.granularity, kind, groups, options);
                written.push(write_file(dir, &name, &body)?);
            }
        }
    }
    Ok(written)
}

/// Split phrase duplicate groups into one report per window length.
fn write_phrase_reports(
    groups: &[MatchGroup],
    dir: &Path,
    options: MarkdownOptions,
) -> Result<Vec<PathBuf>> {
    let mut by_window: BTreeMap<usize, Vec<&MatchGroup>> = BTreeMap::new();
    for group in groups {
        by_window.entry(group.window.unwrap_or(0)).or_default().push(group);
    }

    let mut written = Vec::new();
    for (window, window_groups) in by_window {
        let name = report_file_name(Granularity::Phrase, MatchKind::Duplicate, Some(window));
        let owned: Vec<MatchGroup> = window_groups.iter().map(|&g| g.clone()).collect();
        let body = render_report(Granularity::Phrase, MatchKind::Duplicate, &owned, options);
        written.push(write_file(dir, &name, &body)?);
    }
    Ok(written)
}

fn write_file(dir: &Path, name: &str, body: &str) -> Result<PathBuf> {
    let path = dir.join(name);
    fs::write(&path, body).with_context(|| format!("failed to write {}", path.display()))?;
    log::debug!("wrote {}", path.display());
    Ok(path)
}

/// Report file name for a (granularity, kind) pair.
#[must_use]
pub fn report_file_name(granularity: Granularity, kind: MatchKind, window: Option<usize>) -> String {
    let prefix = match kind {
        MatchKind::Duplicate => "duplicated",
        MatchKind::Similar => "similar",
    };
    match window {
        Some(n) => format!("{prefix}_phrases_{n}_words.md"),
        None => format!("{prefix}_{}.md", granularity.plural()),
    }
}

fn render_report(
    granularity: Granularity,
    kind: MatchKind,
    groups: &[MatchGroup],
    options: MarkdownOptions,
) -> String {
    let mut out = String::new();
    let title_kind = match kind {
        MatchKind::Duplicate => "Duplicated",
        MatchKind::Similar => "Similar",
    };
    let _ = writeln!(out, "# {title_kind} {}", title_case(granularity.plural()));
    let _ = writeln!(out);
    let _ = writeln!(out, "**Total Distinct {title_kind} Entries:** {}", groups.len());

    for (index, group) in groups.iter().enumerate() {
        let _ = writeln!(out);
        let _ = write!(out, "## Entry {}", index + 1);
        if granularity == Granularity::Word {
            let _ = write!(out, " ({} occurrences)", group.members.len());
        }
        let _ = writeln!(out);
        let _ = writeln!(out);
        for line in preview(&group.representative).lines() {
            let _ = writeln!(out, "> {line}");
        }
        let _ = writeln!(out);
        let _ = writeln!(out, "Found in:");
        let _ = writeln!(out);
        for member in &group.members {
            let location = member.path.display();
            let shown = if options.file_links {
                format!("[{location}]({location})")
            } else {
                location.to_string()
            };
            if kind == MatchKind::Similar {
                let _ = writeln!(
                    out,
                    "- {shown} (line {}, score {})",
                    member.line, member.score
                );
            } else {
                let _ = writeln!(out, "- {shown} (line {})", member.line);
            }
        }
    }
    out
}

fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{EngineStats, GranularityReport, GroupMember};
    use std::path::PathBuf;

    fn member(path: &str, line: usize, score: u8) -> GroupMember {
        GroupMember {
            path: PathBuf::from(path),
            doc: 0,
            start: 0,
            end: 20,
            line,
            score,
        }
    }

    fn group(granularity: Granularity, kind: MatchKind, window: Option<usize>) -> MatchGroup {
        MatchGroup {
            granularity,
            kind,
            representative: "An example sentence.".to_string(),
            members: vec![member("a.txt", 1, 100), member("b.txt", 3, 100)],
            window,
        }
    }

    fn results_with(reports: Vec<GranularityReport>) -> ScanResults {
        ScanResults {
            reports,
            summary: Vec::new(),
            warnings: Vec::new(),
            stats: EngineStats::default(),
        }
    }

    #[test]
    fn test_file_names() {
        assert_eq!(
            report_file_name(Granularity::Sentence, MatchKind::Duplicate, None),
            "duplicated_sentences.md"
        );
        assert_eq!(
            report_file_name(Granularity::Paragraph, MatchKind::Similar, None),
            "similar_paragraphs.md"
        );
        assert_eq!(
            report_file_name(Granularity::Phrase, MatchKind::Duplicate, Some(3)),
            "duplicated_phrases_3_words.md"
        );
    }

    #[test]
    fn test_only_nonempty_reports_written() {
        let dir = tempfile::tempdir().unwrap();
        let results = results_with(vec![GranularityReport {
            granularity: Granularity::Sentence,
            duplicates: vec![group(Granularity::Sentence, MatchKind::Duplicate, None)],
            similar: Vec::new(),
        }]);

        let written =
            write_markdown_reports(&results, dir.path(), MarkdownOptions::default()).unwrap();
        assert_eq!(written.len(), 1);
        assert!(dir.path().join("duplicated_sentences.md").exists());
        assert!(!dir.path().join("similar_sentences.md").exists());
    }

    #[test]
    fn test_report_content_and_links() {
        let dir = tempfile::tempdir().unwrap();
        let results = results_with(vec![GranularityReport {
            granularity: Granularity::Sentence,
            duplicates: vec![group(Granularity::Sentence, MatchKind::Duplicate, None)],
            similar: Vec::new(),
        }]);

        write_markdown_reports(&results, dir.path(), MarkdownOptions::default()).unwrap();
        let text = std::fs::read_to_string(dir.path().join("duplicated_sentences.md")).unwrap();
        assert!(text.contains("# Duplicated Sentences"));
        assert!(text.contains("**Total Distinct Duplicated Entries:** 1"));
        assert!(text.contains("> An example sentence."));
        assert!(text.contains("[a.txt](a.txt) (line 1)"));
    }

    #[test]
    fn test_no_file_links_renders_plain_paths() {
        let dir = tempfile::tempdir().unwrap();
        let results = results_with(vec![GranularityReport {
            granularity: Granularity::Sentence,
            duplicates: vec![group(Granularity::Sentence, MatchKind::Duplicate, None)],
            similar: Vec::new(),
        }]);

        write_markdown_reports(&results, dir.path(), MarkdownOptions { file_links: false })
            .unwrap();
        let text = std::fs::read_to_string(dir.path().join("duplicated_sentences.md")).unwrap();
        assert!(text.contains("- a.txt (line 1)"));
        assert!(!text.contains("]("));
    }

    #[test]
    fn test_phrase_duplicates_split_per_window() {
        let dir = tempfile::tempdir().unwrap();
        let results = results_with(vec![GranularityReport {
            granularity: Granularity::Phrase,
            duplicates: vec![
                group(Granularity::Phrase, MatchKind::Duplicate, Some(2)),
                group(Granularity::Phrase, MatchKind::Duplicate, Some(3)),
            ],
            similar: Vec::new(),
        }]);

        let written =
            write_markdown_reports(&results, dir.path(), MarkdownOptions::default()).unwrap();
        assert_eq!(written.len(), 2);
        assert!(dir.path().join("duplicated_phrases_2_words.md").exists());
        assert!(dir.path().join("duplicated_phrases_3_words.md").exists());
    }

    #[test]
    fn test_similar_entries_show_scores() {
        let dir = tempfile::tempdir().unwrap();
        let mut similar = group(Granularity::Sentence, MatchKind::Similar, None);
        similar.members[0].score = 92;
        similar.members[1].score = 92;
        let results = results_with(vec![GranularityReport {
            granularity: Granularity::Sentence,
            duplicates: Vec::new(),
            similar: vec![similar],
        }]);

        write_markdown_reports(&results, dir.path(), MarkdownOptions::default()).unwrap();
        let text = std::fs::read_to_string(dir.path().join("similar_sentences.md")).unwrap();
        assert!(text.contains("score 92"));
    }

    #[test]
    fn test_word_entries_show_occurrence_counts() {
        let dir = tempfile::tempdir().unwrap();
        let results = results_with(vec![GranularityReport {
            granularity: Granularity::Word,
            duplicates: vec![group(Granularity::Word, MatchKind::Duplicate, None)],
            similar: Vec::new(),
        }]);

        write_markdown_reports(&results, dir.path(), MarkdownOptions::default()).unwrap();
        let text = std::fs::read_to_string(dir.path().join("duplicated_words.md")).unwrap();
        assert!(text.contains("(2 occurrences)"));
    }
}
