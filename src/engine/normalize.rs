//! Text normalization into comparison keys.
//!
//! Two units are "the same text" iff their normalized keys are equal. A key
//! is produced by NFC unicode normalization, lowercasing, collapsing
//! whitespace runs to a single space, and trimming. Punctuation is stripped
//! only at word and phrase granularity; sentences and paragraphs keep their
//! internal punctuation, since punctuation is part of what makes them
//! distinguishable.
//!
//! Normalization never mutates the raw text retained for reporting.

use unicode_normalization::UnicodeNormalization;

use super::segment::Granularity;

/// Whether punctuation is stripped for a granularity's keys.
#[must_use]
pub fn strips_punctuation(granularity: Granularity) -> bool {
    matches!(granularity, Granularity::Phrase | Granularity::Word)
}

/// Normalize a raw text unit into its comparison key.
///
/// # Arguments
///
/// * `text` - The raw unit text
/// * `strip_punctuation` - Remove ASCII punctuation (word/phrase granularity)
#[must_use]
pub fn normalize_key(text: &str, strip_punctuation: bool) -> String {
    let folded: String = text
        .nfc()
        .flat_map(char::to_lowercase)
        .filter(|c| !(strip_punctuation && c.is_ascii_punctuation()))
        .collect();

    folded.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Normalize a raw unit for the given granularity.
#[must_use]
pub fn key_for(text: &str, granularity: Granularity) -> String {
    normalize_key(text, strips_punctuation(granularity))
}
