//! Duplicate detection engine.
//!
//! The engine takes loaded documents and produces [`ScanResults`] through a
//! fixed pipeline per enabled granularity:
//!
//! 1. [`segment`] the document bodies into ordered text units
//! 2. [`normalize`] each unit into a comparison key (done during
//!    segmentation)
//! 3. [`exact`] grouping by BLAKE3 fingerprint of the key
//! 4. optional [`fuzzy`] grouping of the remaining units by similarity
//! 5. [`aggregate`] the outcomes into report structures
//!
//! The pipeline is deterministic: the same input tree with the same
//! configuration yields the same groups in the same order, regardless of
//! thread count.

pub mod aggregate;
pub mod exact;
pub mod fingerprint;
pub mod fuzzy;
pub mod groups;
pub mod normalize;
pub mod segment;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use thiserror::Error;

use crate::config::RunConfig;
use crate::progress::{NoProgress, ProgressSink};
use crate::scanner::Document;

pub use groups::{
    EngineStats, GranularityReport, GroupMember, MatchGroup, MatchKind, RunWarning, ScanResults,
    SummaryRow,
};
pub use segment::{Granularity, Segmenter, TextUnit};

/// Fatal engine failures.
///
/// Everything recoverable (unreadable file, skipped fuzzy stage) is a
/// [`RunWarning`] instead; this enum is reserved for conditions that end
/// the run.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A shutdown was requested while the engine was running.
    #[error("scan interrupted by shutdown request")]
    Interrupted,
}

/// The detection engine.
///
/// # Example
///
/// ```no_run
/// use dejatext::config::RunConfig;
/// use dejatext::engine::Engine;
/// use dejatext::scanner::{read_documents, Walker};
/// use std::path::Path;
///
/// let config = RunConfig::default();
/// let walker = Walker::new(Path::new("./notes"));
/// let (documents, _errors) = read_documents(&walker).unwrap();
/// let results = Engine::new(&config).run(&documents).unwrap();
/// println!("{} group(s) found", results.group_count());
/// ```
pub struct Engine<'a> {
    config: &'a RunConfig,
    shutdown: Option<Arc<AtomicBool>>,
    progress: &'a dyn ProgressSink,
}

impl<'a> Engine<'a> {
    /// Create an engine over a validated configuration.
    #[must_use]
    pub fn new(config: &'a RunConfig) -> Self {
        static SILENT: NoProgress = NoProgress;
        Self {
            config,
            shutdown: None,
            progress: &SILENT,
        }
    }

    /// Attach a shutdown flag checked at stage boundaries and inside the
    /// fuzzy comparison loop.
    #[must_use]
    pub fn with_shutdown(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown = Some(flag);
        self
    }

    /// Attach a progress sink.
    #[must_use]
    pub fn with_progress(mut self, progress: &'a dyn ProgressSink) -> Self {
        self.progress = progress;
        self
    }

    /// Run the full pipeline over the given documents.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Interrupted`] if the shutdown flag was raised
    /// mid-run. Partial results are discarded in that case; the caller maps
    /// the error to the interrupted exit status.
    pub fn run(&self, documents: &[Document]) -> Result<ScanResults, EngineError> {
        let segmenter = Segmenter::new(self.config);
        let mut reports = Vec::new();
        let mut warnings = Vec::new();
        let mut stats = EngineStats {
            documents: documents.len(),
            ..Default::default()
        };

        for granularity in Granularity::ALL {
            if !self.enabled(granularity) {
                continue;
            }
            self.check_shutdown()?;

            self.progress.stage(
                &format!("Segmenting {}", granularity.plural()),
                documents.len() as u64,
            );
            let mut units: Vec<TextUnit> = Vec::new();
            for (index, document) in documents.iter().enumerate() {
                units.extend(segmenter.segment(index, document, granularity));
                self.progress.advance(1);
            }
            self.progress.finish();
            stats.unit_counts.push((granularity, units.len()));
            log::info!("{}: {} unit(s)", granularity.plural(), units.len());

            let exact = exact::group_exact(&units);

            let fuzzy_outcome = if self.config.fuzzy {
                self.check_shutdown()?;
                let outcome =
                    fuzzy::group_fuzzy(&units, &exact.matched, self.config, self.shutdown.as_ref())?;
                if let Some(skip) = &outcome.skipped {
                    log::warn!("fuzzy matching skipped for {}: {skip}", granularity.plural());
                    warnings.push(RunWarning::FuzzySkipped {
                        granularity,
                        reason: skip.to_string(),
                    });
                }
                stats.fuzzy_comparisons += outcome.stats.comparisons;
                Some(outcome)
            } else {
                None
            };

            let report = aggregate::build_report(
                granularity,
                &units,
                documents,
                &exact,
                fuzzy_outcome.as_ref(),
            );
            // Empty granularities are omitted, not carried as empty reports
            if !report.is_empty() {
                reports.push(report);
            }
        }

        let summary = aggregate::summarize(&reports);
        Ok(ScanResults {
            reports,
            summary,
            warnings,
            stats,
        })
    }

    fn enabled(&self, granularity: Granularity) -> bool {
        match granularity {
            Granularity::File => self.config.check_files,
            Granularity::Paragraph => self.config.check_paragraphs,
            Granularity::Sentence => self.config.check_sentences,
            Granularity::Phrase => self.config.check_phrases,
            Granularity::Word => self.config.check_words,
        }
    }

    fn check_shutdown(&self) -> Result<(), EngineError> {
        if self
            .shutdown
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
        {
            return Err(EngineError::Interrupted);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn doc(name: &str, body: &str) -> Document {
        Document::new(PathBuf::from(name), body.to_string(), name.ends_with(".md"))
    }

    fn sentence_only_config() -> RunConfig {
        RunConfig {
            check_files: false,
            check_paragraphs: false,
            check_sentences: true,
            check_phrases: false,
            check_words: false,
            ..Default::default()
        }
    }

    #[test]
    fn test_duplicate_sentence_across_documents() {
        let documents = vec![
            doc("a.txt", "This is an example sentence. Something new here."),
            doc("b.txt", "This is an example sentence. Entirely other text."),
        ];
        let config = sentence_only_config();
        let results = Engine::new(&config).run(&documents).unwrap();

        assert!(results.has_findings());
        let report = results.report_for(Granularity::Sentence).unwrap();
        assert_eq!(report.duplicates.len(), 1);
        assert_eq!(report.duplicates[0].members.len(), 2);
        assert!(report.similar.is_empty());
    }

    #[test]
    fn test_no_findings_on_unique_input() {
        let documents = vec![
            doc("a.txt", "First unique sentence here."),
            doc("b.txt", "Second unrelated sentence there."),
        ];
        let config = sentence_only_config();
        let results = Engine::new(&config).run(&documents).unwrap();
        assert!(!results.has_findings());
        assert!(results.reports.is_empty());
        assert!(results.summary.is_empty());
    }

    #[test]
    fn test_empty_document_list() {
        let config = RunConfig::default();
        let results = Engine::new(&config).run(&[]).unwrap();
        assert!(!results.has_findings());
        assert_eq!(results.stats.documents, 0);
    }

    #[test]
    fn test_disabled_granularity_produces_no_units() {
        let documents = vec![doc("a.txt", "twin twin"), doc("b.txt", "twin twin")];
        let config = sentence_only_config();
        let results = Engine::new(&config).run(&documents).unwrap();
        assert!(results
            .stats
            .unit_counts
            .iter()
            .all(|(g, _)| *g == Granularity::Sentence));
    }

    #[test]
    fn test_exact_and_fuzzy_never_overlap() {
        let documents = vec![
            doc("a.txt", "The quick brown fox jumps over the dog."),
            doc("b.txt", "The quick brown fox jumps over the dog."),
            doc("c.txt", "The quick brown fox jumps over the dig."),
        ];
        let config = RunConfig {
            fuzzy: true,
            fuzz_threshold: 90,
            ..sentence_only_config()
        };
        let results = Engine::new(&config).run(&documents).unwrap();
        let report = results.report_for(Granularity::Sentence).unwrap();
        assert_eq!(report.duplicates.len(), 1);
        // The variant's only potential partners are exact-covered and
        // excluded, so no similar group can form
        assert!(report.similar.is_empty());
    }

    #[test]
    fn test_shutdown_before_run_interrupts() {
        let documents = vec![doc("a.txt", "Some text here.")];
        let config = sentence_only_config();
        let flag = Arc::new(AtomicBool::new(true));
        let result = Engine::new(&config).with_shutdown(flag).run(&documents);
        assert!(matches!(result, Err(EngineError::Interrupted)));
    }

    #[test]
    fn test_fuzzy_ceiling_records_warning() {
        let body: String = (0..30)
            .map(|i| format!("Uniquely numbered sentence {i} content. "))
            .collect();
        let documents = vec![doc("a.txt", &body)];
        let config = RunConfig {
            fuzzy: true,
            max_fuzzy_units: 5,
            ..sentence_only_config()
        };
        let results = Engine::new(&config).run(&documents).unwrap();
        assert!(results
            .warnings
            .iter()
            .any(|w| matches!(w, RunWarning::FuzzySkipped { .. })));
    }
}
