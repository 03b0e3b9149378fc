//! JSON output.
//!
//! The JSON document wraps the complete [`ScanResults`] with a generation
//! timestamp and the tool version, so consumers can tell which tool run
//! produced it.

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::engine::ScanResults;

/// Top-level JSON document for a run.
#[derive(Debug, Serialize)]
pub struct JsonReport<'a> {
    /// Tool version that produced the document
    pub version: &'static str,
    /// Generation timestamp, RFC 3339
    pub generated_at: DateTime<Utc>,
    /// Complete run results
    #[serde(flatten)]
    pub results: &'a ScanResults,
}

/// Render results as a pretty-printed JSON string.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn render_json(results: &ScanResults) -> Result<String> {
    let report = JsonReport {
        version: env!("CARGO_PKG_VERSION"),
        generated_at: Utc::now(),
        results,
    };
    Ok(serde_json::to_string_pretty(&report)?)
}
