//! Cleanup mode: write a deduplicated copy of the input tree.
//!
//! Cleanup consumes exact duplicate groups and mirrors the scanned tree
//! into a fresh output folder with the duplication removed:
//!
//! - file-level duplicates: the first occurrence is copied, later
//!   occurrences are dropped entirely
//! - paragraph- and sentence-level duplicates: the first occurrence is kept
//!   verbatim, later occurrences are replaced with the `[[deleted]]` marker
//! - everything that was not scanned (images, attachments, undecodable
//!   files) is copied byte-for-byte, so the mirror is a drop-in
//!   replacement for the input tree
//!
//! The first member of a group (earliest document, earliest offset) is
//! always the survivor. Frontmatter is preserved byte-for-byte; only
//! document bodies are mutated. Similar (fuzzy) groups are never touched,
//! since near-matches are a judgement call the author has to make.
//!
//! The output folder must not already exist. Refusing to reuse a folder
//! keeps a stale previous run from being mistaken for this one.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use walkdir::WalkDir;

use crate::engine::{Granularity, MatchKind, ScanResults};
use crate::scanner::Document;

/// Marker written in place of removed paragraph and sentence occurrences.
pub const DELETED_MARKER: &str = "[[deleted]]";

/// Errors from a cleanup run.
#[derive(Debug, Error)]
pub enum CleanupError {
    /// The output folder already exists.
    #[error("output folder {path} already exists, refusing to overwrite")]
    OutputExists {
        /// The conflicting path
        path: PathBuf,
    },

    /// An I/O error occurred while writing the output tree.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

/// Counters for one cleanup run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanupStats {
    /// Documents written to the output tree
    pub files_written: usize,
    /// Documents dropped as whole-file duplicates
    pub files_dropped: usize,
    /// Paragraph occurrences replaced with the marker
    pub paragraphs_replaced: usize,
    /// Sentence occurrences replaced with the marker
    pub sentences_replaced: usize,
    /// Non-scanned files copied verbatim into the mirror
    pub other_files_copied: usize,
}

/// A span to blank out in one document body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Removal {
    start: usize,
    end: usize,
    granularity: Granularity,
}

/// Write the deduplicated tree.
///
/// # Arguments
///
/// * `documents` - The loaded documents, in scan order
/// * `results` - Scan results whose exact groups drive the removals
/// * `input_root` - Root of the scanned tree; non-scanned files under it
///   are mirrored verbatim
/// * `output_root` - Folder to create; must not exist yet
///
/// # Errors
///
/// Returns [`CleanupError::OutputExists`] if the output folder is already
/// present, or [`CleanupError::Io`] on any write failure.
pub fn run_cleanup(
    documents: &[Document],
    results: &ScanResults,
    input_root: &Path,
    output_root: &Path,
) -> Result<CleanupStats, CleanupError> {
    if output_root.exists() {
        return Err(CleanupError::OutputExists {
            path: output_root.to_path_buf(),
        });
    }
    fs::create_dir_all(output_root).map_err(|source| CleanupError::Io {
        path: output_root.to_path_buf(),
        source,
    })?;

    let dropped = dropped_documents(results);
    let mut removals = collect_removals(results, &dropped);
    let mut stats = CleanupStats::default();

    for (index, document) in documents.iter().enumerate() {
        if dropped.contains(&index) {
            stats.files_dropped += 1;
            log::info!("dropping duplicate file {}", document.path.display());
            continue;
        }

        let body = match removals.remove(&index) {
            Some(spans) => apply_removals(document.body(), spans, &mut stats),
            None => document.body().to_string(),
        };

        let target = output_root.join(&document.path);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(|source| CleanupError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let mut contents = String::with_capacity(document.raw().len());
        if let Some(frontmatter) = document.frontmatter() {
            contents.push_str(frontmatter);
        }
        contents.push_str(&body);
        fs::write(&target, contents).map_err(|source| CleanupError::Io {
            path: target.clone(),
            source,
        })?;
        stats.files_written += 1;
    }

    stats.other_files_copied = copy_unscanned_files(documents, input_root, output_root)?;

    log::info!(
        "cleanup wrote {} file(s), dropped {}, replaced {} paragraph(s) and {} sentence(s), copied {} other file(s)",
        stats.files_written,
        stats.files_dropped,
        stats.paragraphs_replaced,
        stats.sentences_replaced,
        stats.other_files_copied
    );
    Ok(stats)
}

/// Mirror every file the scan did not load (non-text files, undecodable
/// files) byte-for-byte, so the output tree can stand in for the input.
fn copy_unscanned_files(
    documents: &[Document],
    input_root: &Path,
    output_root: &Path,
) -> Result<usize, CleanupError> {
    let scanned: HashSet<&Path> = documents.iter().map(|d| d.path.as_path()).collect();
    let mut copied = 0;

    for entry in WalkDir::new(input_root) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                log::warn!("cleanup skipping unreadable entry: {e}");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let relative = entry
            .path()
            .strip_prefix(input_root)
            .unwrap_or(entry.path());
        if scanned.contains(relative) {
            continue;
        }

        let target = output_root.join(relative);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(|source| CleanupError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        fs::copy(entry.path(), &target).map_err(|source| CleanupError::Io {
            path: entry.path().to_path_buf(),
            source,
        })?;
        copied += 1;
    }

    Ok(copied)
}

/// Document indices dropped as later members of file-level groups.
fn dropped_documents(results: &ScanResults) -> HashSet<usize> {
    let mut dropped = HashSet::new();
    if let Some(report) = results.report_for(Granularity::File) {
        for group in &report.duplicates {
            debug_assert_eq!(group.kind, MatchKind::Duplicate);
            for member in group.members.iter().skip(1) {
                dropped.insert(member.doc);
            }
        }
    }
    dropped
}

/// Spans to blank out, per document, from later members of paragraph and
/// sentence groups. Members inside documents that are dropped entirely need
/// no in-place removal.
fn collect_removals(
    results: &ScanResults,
    dropped: &HashSet<usize>,
) -> HashMap<usize, Vec<Removal>> {
    let mut removals: HashMap<usize, Vec<Removal>> = HashMap::new();
    for granularity in [Granularity::Paragraph, Granularity::Sentence] {
        let Some(report) = results.report_for(granularity) else {
            continue;
        };
        for group in &report.duplicates {
            for member in group.members.iter().skip(1) {
                if dropped.contains(&member.doc) {
                    continue;
                }
                removals.entry(member.doc).or_default().push(Removal {
                    start: member.start,
                    end: member.end,
                    granularity,
                });
            }
        }
    }
    removals
}

/// Replace the given spans with the marker, skipping spans nested inside an
/// already-replaced one (a sentence inside a removed paragraph).
fn apply_removals(body: &str, mut spans: Vec<Removal>, stats: &mut CleanupStats) -> String {
    // Wider spans first at equal starts, so nested spans are detected
    spans.sort_by(|a, b| a.start.cmp(&b.start).then(b.end.cmp(&a.end)));

    let mut kept: Vec<Removal> = Vec::new();
    for span in spans {
        if kept
            .last()
            .is_some_and(|prev| span.start >= prev.start && span.end <= prev.end)
        {
            continue;
        }
        kept.push(span);
    }

    let mut out = String::with_capacity(body.len());
    let mut cursor = 0;
    for span in &kept {
        // Partially overlapping spans: whatever started first wins
        if span.start < cursor {
            continue;
        }
        out.push_str(&body[cursor..span.start]);
        out.push_str(DELETED_MARKER);
        cursor = span.end;
        match span.granularity {
            Granularity::Paragraph => stats.paragraphs_replaced += 1,
            Granularity::Sentence => stats.sentences_replaced += 1,
            _ => {}
        }
    }
    out.push_str(&body[cursor..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RunConfig;
    use crate::engine::Engine;
    use std::path::PathBuf;

    fn doc(name: &str, raw: &str) -> Document {
        Document::new(PathBuf::from(name), raw.to_string(), name.ends_with(".md"))
    }

    fn scan(documents: &[Document], config: &RunConfig) -> ScanResults {
        Engine::new(config).run(documents).unwrap()
    }

    fn sentence_config() -> RunConfig {
        RunConfig {
            check_files: true,
            check_paragraphs: false,
            check_sentences: true,
            check_phrases: false,
            check_words: false,
            ..Default::default()
        }
    }

    #[test]
    fn test_refuses_existing_output_folder() {
        let input = tempfile::tempdir().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let result = run_cleanup(
            &[],
            &scan(&[], &sentence_config()),
            input.path(),
            dir.path(),
        );
        assert!(matches!(result, Err(CleanupError::OutputExists { .. })));
    }

    #[test]
    fn test_duplicate_file_dropped_first_kept() {
        let input = tempfile::tempdir().unwrap();
        let parent = tempfile::tempdir().unwrap();
        let out = parent.path().join("cleanup_output");
        let documents = vec![
            doc("a.txt", "Identical content here."),
            doc("b.txt", "Identical content here."),
        ];
        let results = scan(&documents, &sentence_config());

        let stats = run_cleanup(&documents, &results, input.path(), &out).unwrap();
        assert_eq!(stats.files_dropped, 1);
        assert_eq!(stats.files_written, 1);
        assert!(out.join("a.txt").exists());
        assert!(!out.join("b.txt").exists());
    }

    #[test]
    fn test_later_sentence_occurrence_replaced() {
        let input = tempfile::tempdir().unwrap();
        let parent = tempfile::tempdir().unwrap();
        let out = parent.path().join("cleanup_output");
        let documents = vec![
            doc("a.txt", "This sentence repeats. Unique trailing text."),
            doc("b.txt", "This sentence repeats. Different ending here."),
        ];
        let config = RunConfig {
            check_files: false,
            ..sentence_config()
        };
        let results = scan(&documents, &config);

        let stats = run_cleanup(&documents, &results, input.path(), &out).unwrap();
        assert_eq!(stats.sentences_replaced, 1);

        let first = std::fs::read_to_string(out.join("a.txt")).unwrap();
        assert!(first.contains("This sentence repeats."));

        let second = std::fs::read_to_string(out.join("b.txt")).unwrap();
        assert!(second.contains(DELETED_MARKER));
        assert!(!second.contains("This sentence repeats."));
        assert!(second.contains("Different ending here."));
    }

    #[test]
    fn test_frontmatter_preserved_verbatim() {
        let input = tempfile::tempdir().unwrap();
        let parent = tempfile::tempdir().unwrap();
        let out = parent.path().join("cleanup_output");
        let frontmatter = "---\ntitle: Note\n---\n";
        let documents = vec![
            doc("a.md", &format!("{frontmatter}Repeated sentence here. Extra a.")),
            doc("b.md", &format!("{frontmatter}Repeated sentence here. Extra b.")),
        ];
        let config = RunConfig {
            check_files: false,
            ..sentence_config()
        };
        let results = scan(&documents, &config);

        run_cleanup(&documents, &results, input.path(), &out).unwrap();
        let second = std::fs::read_to_string(out.join("b.md")).unwrap();
        assert!(second.starts_with(frontmatter));
        assert!(second.contains(DELETED_MARKER));
    }

    #[test]
    fn test_nested_sentence_inside_removed_paragraph_not_double_marked() {
        let mut stats = CleanupStats::default();
        let body = "alpha beta gamma";
        let spans = vec![
            Removal {
                start: 0,
                end: 16,
                granularity: Granularity::Paragraph,
            },
            Removal {
                start: 0,
                end: 10,
                granularity: Granularity::Sentence,
            },
        ];
        let out = apply_removals(body, spans, &mut stats);
        assert_eq!(out, DELETED_MARKER);
        assert_eq!(stats.paragraphs_replaced, 1);
        assert_eq!(stats.sentences_replaced, 0);
    }

    #[test]
    fn test_subdirectories_mirrored() {
        let input = tempfile::tempdir().unwrap();
        let parent = tempfile::tempdir().unwrap();
        let out = parent.path().join("cleanup_output");
        let documents = vec![doc("sub/inner.txt", "Only content, nothing duplicated.")];
        let results = scan(&documents, &sentence_config());

        let stats = run_cleanup(&documents, &results, input.path(), &out).unwrap();
        assert_eq!(stats.files_written, 1);
        assert!(out.join("sub/inner.txt").exists());
    }

    #[test]
    fn test_unscanned_files_copied_verbatim() {
        let input = tempfile::tempdir().unwrap();
        let parent = tempfile::tempdir().unwrap();
        let out = parent.path().join("cleanup_output");
        let image = [0x89u8, 0x50, 0x4e, 0x47, 0x00, 0x01];
        std::fs::create_dir_all(input.path().join("assets")).unwrap();
        std::fs::write(input.path().join("assets/figure.png"), image).unwrap();
        std::fs::write(input.path().join("notes.txt"), "Scanned text content.").unwrap();

        let documents = vec![doc("notes.txt", "Scanned text content.")];
        let results = scan(&documents, &sentence_config());

        let stats = run_cleanup(&documents, &results, input.path(), &out).unwrap();
        assert_eq!(stats.files_written, 1);
        assert_eq!(stats.other_files_copied, 1);
        assert_eq!(std::fs::read(out.join("assets/figure.png")).unwrap(), image);
        // The scanned document is written by the cleanup pass, not the copy
        assert_eq!(
            std::fs::read_to_string(out.join("notes.txt")).unwrap(),
            "Scanned text content."
        );
    }
}
