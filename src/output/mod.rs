//! Report rendering.
//!
//! Three renderers consume [`ScanResults`](crate::engine::ScanResults):
//!
//! - [`markdown`]: one report file per non-empty (granularity, kind) pair,
//!   phrase duplicates split per window length
//! - [`csv`]: the flat summary table
//! - [`json`]: the complete results as a machine-readable document
//!
//! Empty categories produce no artifact at all.

pub mod csv;
pub mod json;
pub mod markdown;

/// Maximum characters of representative text shown in a report entry.
pub const PREVIEW_CHAR_LIMIT: usize = 500;

/// Truncate text for display, appending an ellipsis when cut.
#[must_use]
pub fn preview(text: &str) -> String {
    let mut out = String::new();
    for (count, ch) in text.chars().enumerate() {
        if count >= PREVIEW_CHAR_LIMIT {
            out.push_str("...");
            return out;
        }
        out.push(ch);
    }
    out
}
