//! Summary CSV generation.
//!
//! The summary is a flat table with one row per (granularity, kind) pair
//! that produced groups. It is written alongside the markdown reports as
//! `summary_report.csv`.

use std::fs::File;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;

use crate::engine::ScanResults;

/// Name of the summary file inside the output directory.
pub const SUMMARY_FILE_NAME: &str = "summary_report.csv";

#[derive(Debug, Serialize)]
struct SummaryCsvRow<'a> {
    #[serde(rename = "Granularity")]
    granularity: &'a str,
    #[serde(rename = "Kind")]
    kind: &'a str,
    #[serde(rename = "Groups")]
    groups: usize,
    #[serde(rename = "Members")]
    members: usize,
}

/// Write the summary CSV for a run.
///
/// A run without findings still gets a summary file (header only), so that
/// downstream tooling can always rely on its presence. The header is
/// written explicitly; serialization would only emit it alongside a first
/// row.
///
/// # Errors
///
/// Returns an error if the file cannot be created or a row cannot be
/// serialized.
pub fn write_summary_csv(results: &ScanResults, dir: &Path) -> Result<PathBuf> {
    let path = dir.join(SUMMARY_FILE_NAME);
    let file = File::create(&path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(file);

    writer.write_record(["Granularity", "Kind", "Groups", "Members"])?;
    for row in &results.summary {
        writer.serialize(SummaryCsvRow {
            granularity: row.granularity.as_str(),
            kind: row.kind.as_str(),
            groups: row.group_count,
            members: row.member_count,
        })?;
    }
    writer.flush().context("failed to flush summary CSV")?;
    log::debug!("wrote {}", path.display());
    Ok(path)
}
