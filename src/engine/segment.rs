//! Multi-granularity segmentation of document bodies into text units.
//!
//! The segmenter produces a finite, ordered sequence of [`TextUnit`]s per
//! enabled granularity:
//!
//! - **File**: one unit covering the whole body
//! - **Paragraph**: contiguous non-blank blocks between runs of blank lines,
//!   subject to a minimum word count
//! - **Sentence**: split on terminal punctuation (`.`, `!`, `?`) followed by
//!   whitespace, with an abbreviation guard
//! - **Phrase**: every sliding window of `min..=max` words over each
//!   sentence's word sequence (intentionally exhaustive; this is the
//!   dominant cost of a run)
//! - **Word**: whitespace-delimited tokens after punctuation stripping
//!
//! All offsets refer to the document body with frontmatter already excluded;
//! a unit never crosses the frontmatter boundary.
//!
//! The sentence splitter is a heuristic: it refuses to split after
//! two-letter titlecase abbreviations ("Mr.", "Dr.") and dotted initialisms
//! ("e.g.", "U.S."), and will still split wrongly on abbreviations outside
//! those shapes. This is a known limitation, not silently corrected.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::config::RunConfig;
use crate::scanner::Document;

use super::normalize::key_for;

/// The segmentation level at which duplication is assessed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    /// Whole-file body
    File,
    /// Blank-line separated block
    Paragraph,
    /// Terminal-punctuation delimited sentence
    Sentence,
    /// Sliding word window
    Phrase,
    /// Single token
    Word,
}

impl Granularity {
    /// All granularities in canonical order.
    pub const ALL: [Granularity; 5] = [
        Granularity::File,
        Granularity::Paragraph,
        Granularity::Sentence,
        Granularity::Phrase,
        Granularity::Word,
    ];

    /// Lowercase singular label, as used in logs and summaries.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Granularity::File => "file",
            Granularity::Paragraph => "paragraph",
            Granularity::Sentence => "sentence",
            Granularity::Phrase => "phrase",
            Granularity::Word => "word",
        }
    }

    /// Plural label, as used in report file names.
    #[must_use]
    pub fn plural(self) -> &'static str {
        match self {
            Granularity::File => "files",
            Granularity::Paragraph => "paragraphs",
            Granularity::Sentence => "sentences",
            Granularity::Phrase => "phrases",
            Granularity::Word => "words",
        }
    }
}

impl std::fmt::Display for Granularity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A located span of text at a given granularity.
///
/// `start..end` are byte offsets into the owning document's body. The raw
/// text is retained verbatim for reporting; the normalized key is what gets
/// fingerprinted and compared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextUnit {
    /// Granularity this unit was produced at
    pub granularity: Granularity,
    /// Index of the owning document in the run's document list
    pub doc: usize,
    /// Start byte offset in the document body
    pub start: usize,
    /// End byte offset in the document body (exclusive)
    pub end: usize,
    /// 1-based line number in the original file (frontmatter included)
    pub line: usize,
    /// Raw text of the span, unmodified
    pub raw: String,
    /// Normalized comparison key
    pub key: String,
    /// Word-count window length, phrases only
    pub window: Option<usize>,
}

/// Segmenter producing ordered text units per granularity.
pub struct Segmenter<'a> {
    config: &'a RunConfig,
}

impl<'a> Segmenter<'a> {
    /// Create a segmenter over the given run configuration.
    #[must_use]
    pub fn new(config: &'a RunConfig) -> Self {
        Self { config }
    }

    /// Produce all units of one granularity for one document, in body order.
    ///
    /// An empty document yields an empty sequence for every granularity;
    /// that is not an error.
    #[must_use]
    pub fn segment(&self, doc_index: usize, doc: &Document, granularity: Granularity) -> Vec<TextUnit> {
        let body = doc.body();
        let lines = LineIndex::new(body, doc.body_line_offset());

        match granularity {
            Granularity::File => self.file_units(doc_index, body, &lines),
            Granularity::Paragraph => self.paragraph_units(doc_index, body, &lines),
            Granularity::Sentence => self.sentence_units(doc_index, body, &lines),
            Granularity::Phrase => self.phrase_units(doc_index, body, &lines),
            Granularity::Word => self.word_units(doc_index, body, &lines),
        }
    }

    fn file_units(&self, doc: usize, body: &str, lines: &LineIndex) -> Vec<TextUnit> {
        let Some((start, end)) = trimmed_span(body, 0, body.len()) else {
            return Vec::new();
        };
        vec![make_unit(Granularity::File, doc, body, start, end, lines, None)]
    }

    fn paragraph_units(&self, doc: usize, body: &str, lines: &LineIndex) -> Vec<TextUnit> {
        paragraph_spans(body)
            .into_iter()
            .filter(|&(start, end)| {
                body[start..end].split_whitespace().count() > self.config.min_paragraph_words
            })
            .map(|(start, end)| {
                make_unit(Granularity::Paragraph, doc, body, start, end, lines, None)
            })
            .collect()
    }

    fn sentence_units(&self, doc: usize, body: &str, lines: &LineIndex) -> Vec<TextUnit> {
        sentence_spans(body)
            .into_iter()
            .map(|(start, end)| {
                make_unit(Granularity::Sentence, doc, body, start, end, lines, None)
            })
            .collect()
    }

    fn phrase_units(&self, doc: usize, body: &str, lines: &LineIndex) -> Vec<TextUnit> {
        let min_len = self.config.min_phrase_len;
        let max_len = self.config.max_phrase_len;
        let mut units = Vec::new();

        for (s_start, s_end) in sentence_spans(body) {
            let sentence = &body[s_start..s_end];
            let words = word_spans(sentence);

            // Every window start and every window length in range is one
            // candidate unit; the combinatorial count is intentional
            for length in min_len..=max_len.min(words.len()) {
                for window in words.windows(length) {
                    let start = s_start + window[0].0;
                    let end = s_start + window[length - 1].1;
                    let unit = make_unit(
                        Granularity::Phrase,
                        doc,
                        body,
                        start,
                        end,
                        lines,
                        Some(length),
                    );
                    // Windows of bare punctuation normalize to nothing
                    if !unit.key.is_empty() {
                        units.push(unit);
                    }
                }
            }
        }

        units
    }

    fn word_units(&self, doc: usize, body: &str, lines: &LineIndex) -> Vec<TextUnit> {
        word_spans(body)
            .into_iter()
            .filter_map(|(start, end)| {
                let unit = make_unit(Granularity::Word, doc, body, start, end, lines, None);
                // Single characters and bare punctuation tokens carry no signal
                (unit.key.chars().count() >= self.config.min_word_chars).then_some(unit)
            })
            .collect()
    }
}

fn make_unit(
    granularity: Granularity,
    doc: usize,
    body: &str,
    start: usize,
    end: usize,
    lines: &LineIndex,
    window: Option<usize>,
) -> TextUnit {
    let raw = &body[start..end];
    TextUnit {
        granularity,
        doc,
        start,
        end,
        line: lines.line_of(start),
        raw: raw.to_string(),
        key: key_for(raw, granularity),
        window,
    }
}

/// Byte spans of paragraphs: contiguous non-blank line blocks, trimmed.
/// Whitespace-only blocks are dropped.
#[must_use]
pub fn paragraph_spans(body: &str) -> Vec<(usize, usize)> {
    let mut spans = Vec::new();
    let mut block_start: Option<usize> = None;
    let mut block_end = 0;
    let mut pos = 0;

    for line in body.split_inclusive('\n') {
        let start = pos;
        pos += line.len();
        if line.trim().is_empty() {
            if let Some(s) = block_start.take() {
                if let Some(span) = trimmed_span(body, s, block_end) {
                    spans.push(span);
                }
            }
        } else {
            if block_start.is_none() {
                block_start = Some(start);
            }
            block_end = pos;
        }
    }

    if let Some(s) = block_start {
        if let Some(span) = trimmed_span(body, s, block_end) {
            spans.push(span);
        }
    }

    spans
}

/// Byte spans of sentences, trimmed, terminal punctuation included.
///
/// Splits after `.`, `!` or `?` followed by whitespace, unless the preceding
/// characters look like a dotted initialism (`e.g.`, `U.S.`) or a two-letter
/// titlecase abbreviation (`Mr.`, `Dr.`).
#[must_use]
pub fn sentence_spans(body: &str) -> Vec<(usize, usize)> {
    static BOUNDARY: OnceLock<Regex> = OnceLock::new();
    let boundary = BOUNDARY.get_or_init(|| Regex::new(r"[.!?]\s").expect("valid regex"));

    let mut spans = Vec::new();
    let mut start = 0;

    for m in boundary.find_iter(body) {
        // Terminal punctuation is ASCII, one byte
        let punct_end = m.start() + 1;
        if is_abbreviation(&body[..punct_end]) {
            continue;
        }
        if let Some(span) = trimmed_span(body, start, punct_end) {
            spans.push(span);
        }
        start = m.end();
    }

    if let Some(span) = trimmed_span(body, start, body.len()) {
        spans.push(span);
    }

    spans
}

/// Whether text ending in terminal punctuation looks like an abbreviation
/// rather than a sentence end.
fn is_abbreviation(text: &str) -> bool {
    let mut rev = text.chars().rev();
    let c1 = rev.next();
    let c2 = rev.next();
    let c3 = rev.next();
    let c4 = rev.next();

    // Dotted initialism: word char, '.', word char, then the terminator
    // ("e.g.", "U.S.", "i.e.")
    if matches!(
        (c4, c3, c2),
        (Some(a), Some('.'), Some(b)) if is_word_char(a) && is_word_char(b)
    ) {
        return true;
    }

    // Two-letter titlecase abbreviation: "Mr.", "Dr.", "St."
    matches!(
        (c3, c2, c1),
        (Some(a), Some(b), Some('.')) if a.is_uppercase() && b.is_lowercase()
    )
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Byte spans of whitespace-delimited tokens within `text`.
#[must_use]
pub fn word_spans(text: &str) -> Vec<(usize, usize)> {
    let mut spans = Vec::new();
    let mut start: Option<usize> = None;

    for (idx, c) in text.char_indices() {
        if c.is_whitespace() {
            if let Some(s) = start.take() {
                spans.push((s, idx));
            }
        } else if start.is_none() {
            start = Some(idx);
        }
    }
    if let Some(s) = start {
        spans.push((s, text.len()));
    }

    spans
}

/// Shrink a span to exclude leading/trailing whitespace; `None` if nothing
/// remains.
fn trimmed_span(body: &str, start: usize, end: usize) -> Option<(usize, usize)> {
    let slice = &body[start..end];
    let trimmed = slice.trim_start();
    let lead = slice.len() - trimmed.len();
    let trimmed = trimmed.trim_end();
    if trimmed.is_empty() {
        None
    } else {
        Some((start + lead, start + lead + trimmed.len()))
    }
}

/// Precomputed line starts for offset-to-line lookups.
struct LineIndex {
    starts: Vec<usize>,
    line_offset: usize,
}

impl LineIndex {
    fn new(body: &str, line_offset: usize) -> Self {
        let mut starts = vec![0];
        for (idx, b) in body.bytes().enumerate() {
            if b == b'\n' {
                starts.push(idx + 1);
            }
        }
        Self {
            starts,
            line_offset,
        }
    }

    /// 1-based line number in the original file for a body byte offset.
    fn line_of(&self, offset: usize) -> usize {
        self.line_offset + self.starts.partition_point(|&s| s <= offset)
    }
}
