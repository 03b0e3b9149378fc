//! Command-line interface definitions for DejaText.
//!
//! This module defines all CLI arguments, subcommands, and options using the
//! clap derive API. The CLI follows standard conventions with global options
//! (verbosity, color) and subcommands for different operations.
//!
//! # Example
//!
//! ```bash
//! # Scan a notes directory and write markdown reports
//! dejatext scan ~/notes
//!
//! # Enable fuzzy matching with a custom threshold
//! dejatext scan ~/notes --fuzzy --fuzz-threshold 85
//!
//! # JSON output for scripting
//! dejatext scan ~/notes --output json
//!
//! # Mirror the tree with duplicates removed/marked
//! dejatext cleanup ~/notes --output-folder cleaned
//! ```

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Duplicate and near-duplicate text finder for note collections.
///
/// DejaText scans a tree of plain-text and markdown documents and reports
/// text that repeats - verbatim or approximately - at five granularities:
/// whole file, paragraph, sentence, phrase, and word.
#[derive(Debug, Parser)]
#[command(name = "dejatext")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity level (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    pub no_color: bool,

    /// Emit errors as JSON on stderr
    #[arg(long, global = true)]
    pub json_errors: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands for DejaText.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Scan a directory tree for duplicated and similar text
    Scan(ScanArgs),
    /// Mirror a directory tree with duplicated text removed or marked
    Cleanup(CleanupArgs),
}

/// Arguments for the scan subcommand.
#[derive(Debug, Args)]
pub struct ScanArgs {
    /// Directory tree to scan (.txt and .md files)
    #[arg(value_name = "PATH")]
    pub path: PathBuf,

    /// Directory for generated reports
    ///
    /// Defaults to the config file value or "dedup_output".
    #[arg(long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Output format (reports writes markdown + CSV files, json prints to stdout)
    #[arg(short, long, value_enum, default_value = "reports")]
    pub output: OutputFormat,

    /// Skip whole-file comparison
    #[arg(long = "no-check-files")]
    pub no_check_files: bool,

    /// Skip paragraph comparison
    #[arg(long = "no-check-paragraphs")]
    pub no_check_paragraphs: bool,

    /// Skip sentence comparison
    #[arg(long = "no-check-sentences")]
    pub no_check_sentences: bool,

    /// Skip phrase-window comparison
    #[arg(long = "no-check-phrases")]
    pub no_check_phrases: bool,

    /// Skip word tallies
    #[arg(long = "no-check-words")]
    pub no_check_words: bool,

    /// Minimum phrase window length in words (default 2)
    #[arg(long, value_name = "N")]
    pub min_phrase_length: Option<usize>,

    /// Maximum phrase window length in words (default 20)
    #[arg(long, value_name = "N")]
    pub max_phrase_length: Option<usize>,

    /// Ignore paragraphs with this many words or fewer (default 20)
    #[arg(long, value_name = "N")]
    pub min_paragraph_words: Option<usize>,

    /// Enable fuzzy (near-duplicate) comparison
    #[arg(long)]
    pub fuzzy: bool,

    /// Minimum similarity percentage for fuzzy matches (default 90)
    #[arg(long, value_name = "PCT")]
    pub fuzz_threshold: Option<u8>,

    /// Ceiling on fuzzy comparison candidates per granularity
    ///
    /// Above this the fuzzy stage for that granularity is skipped with a
    /// recorded warning instead of running an unbounded all-pairs pass.
    #[arg(long, value_name = "N", default_value = "2000")]
    pub max_fuzzy_units: usize,

    /// Wall-clock budget in seconds for each granularity's fuzzy stage
    #[arg(long, value_name = "SECS", default_value = "30")]
    pub fuzzy_timeout: u64,

    /// Omit file location lists from generated reports
    #[arg(long)]
    pub no_file_links: bool,
}

/// Arguments for the cleanup subcommand.
#[derive(Debug, Args)]
pub struct CleanupArgs {
    /// Directory tree to clean (never modified in place)
    #[arg(value_name = "PATH")]
    pub path: PathBuf,

    /// Directory for the cleaned mirror of the tree
    #[arg(long, value_name = "DIR", default_value = "cleanup_output")]
    pub output_folder: PathBuf,

    /// Skip whole-file deduplication
    #[arg(long = "no-check-files")]
    pub no_check_files: bool,

    /// Skip paragraph marking
    #[arg(long = "no-check-paragraphs")]
    pub no_check_paragraphs: bool,

    /// Skip sentence marking
    #[arg(long = "no-check-sentences")]
    pub no_check_sentences: bool,
}

/// Output format for scan results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Markdown report files plus a summary CSV in the output directory
    Reports,
    /// JSON printed to stdout for automation
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Reports => write!(f, "reports"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}
