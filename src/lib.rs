//! DejaText: duplicate and near-duplicate text finder for note collections.
//!
//! DejaText scans a tree of `.txt` and `.md` documents and reports text
//! that repeats, verbatim or approximately, at five granularities: whole
//! file, paragraph, sentence, sliding phrase window, and word. A companion
//! cleanup mode mirrors the tree with the duplication removed.
//!
//! # Architecture
//!
//! - [`scanner`]: directory traversal in natural sort order, document
//!   loading, frontmatter isolation
//! - [`engine`]: segmentation, normalization, exact fingerprint grouping,
//!   optional fuzzy grouping, result aggregation
//! - [`output`]: markdown reports, summary CSV, JSON
//! - [`cleanup`]: deduplicated mirror of the input tree
//!
//! Every run is a fresh, stateless batch computation: documents are read
//! fully into memory, compared, and reported. Nothing persists between
//! runs and the scanned tree is never modified in place.

pub mod cleanup;
pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod logging;
pub mod output;
pub mod progress;
pub mod scanner;
pub mod signal;

use std::path::PathBuf;

use anyhow::{Context, Result};
use yansi::Paint;

use cli::{CleanupArgs, Cli, Commands, OutputFormat, ScanArgs};
use config::{FileDefaults, RunConfig};
use engine::{Engine, RunWarning, ScanResults};
use error::ExitCode;
use output::markdown::MarkdownOptions;
use progress::{NoProgress, ProgressSink, TerminalProgress};
use scanner::{read_documents, Document, ScanError, Walker};

/// Default report directory when neither the CLI nor the config file names
/// one.
const DEFAULT_OUTPUT_DIR: &str = "dedup_output";

/// Run the application with parsed CLI arguments.
///
/// # Errors
///
/// Returns an error for fatal conditions (invalid configuration, unwritable
/// output, interruption). Non-fatal conditions become warnings in the run
/// summary and are reflected in the exit code instead.
pub fn run_app(cli: Cli) -> Result<ExitCode> {
    logging::init_logging(cli.verbose, cli.quiet);
    if cli.no_color {
        yansi::disable();
    }

    match cli.command {
        Commands::Scan(args) => run_scan(&args, cli.quiet),
        Commands::Cleanup(args) => run_cleanup_command(&args, cli.quiet),
    }
}

fn run_scan(args: &ScanArgs, quiet: bool) -> Result<ExitCode> {
    let defaults = FileDefaults::load();
    let config = scan_config(args, &defaults);
    config.validate()?;

    let shutdown = signal::install_handler().context("failed to install signal handler")?;
    let (documents, scan_errors) = load_documents(&args.path)?;

    let terminal = TerminalProgress::new();
    let silent = NoProgress;
    let progress: &dyn ProgressSink = if quiet || args.output == OutputFormat::Json {
        &silent
    } else {
        &terminal
    };

    let mut results = Engine::new(&config)
        .with_shutdown(shutdown.get_flag())
        .with_progress(progress)
        .run(&documents)?;
    prepend_scan_warnings(&mut results, scan_errors);

    match args.output {
        OutputFormat::Json => {
            println!("{}", output::json::render_json(&results)?);
        }
        OutputFormat::Reports => {
            let dir = args
                .output_dir
                .clone()
                .or_else(|| defaults.output_dir.clone())
                .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR));
            let options = MarkdownOptions {
                file_links: !args.no_file_links,
            };
            let written = output::markdown::write_markdown_reports(&results, &dir, options)?;
            output::csv::write_summary_csv(&results, &dir)?;
            if !quiet {
                print_scan_summary(&results, &dir, written.len());
            }
        }
    }

    Ok(scan_exit_code(&results))
}

fn run_cleanup_command(args: &CleanupArgs, quiet: bool) -> Result<ExitCode> {
    let config = RunConfig {
        check_files: !args.no_check_files,
        check_paragraphs: !args.no_check_paragraphs,
        check_sentences: !args.no_check_sentences,
        check_phrases: false,
        check_words: false,
        fuzzy: false,
        ..RunConfig::default()
    };
    config.validate()?;

    let shutdown = signal::install_handler().context("failed to install signal handler")?;
    let (documents, scan_errors) = load_documents(&args.path)?;

    let mut results = Engine::new(&config)
        .with_shutdown(shutdown.get_flag())
        .run(&documents)?;
    prepend_scan_warnings(&mut results, scan_errors);

    let stats = cleanup::run_cleanup(&documents, &results, &args.path, &args.output_folder)?;

    if !quiet {
        println!(
            "{} {} file(s) written to {}",
            "Cleanup complete:".green().bold(),
            stats.files_written,
            args.output_folder.display()
        );
        println!(
            "  dropped {} duplicate file(s), replaced {} paragraph(s) and {} sentence(s), copied {} other file(s)",
            stats.files_dropped,
            stats.paragraphs_replaced,
            stats.sentences_replaced,
            stats.other_files_copied
        );
        print_warnings(&results);
    }

    Ok(scan_exit_code(&results))
}

/// Build the effective scan configuration: CLI arguments override config
/// file defaults, which override the built-in values.
fn scan_config(args: &ScanArgs, defaults: &FileDefaults) -> RunConfig {
    let base = RunConfig::default();
    RunConfig {
        check_files: !args.no_check_files,
        check_paragraphs: !args.no_check_paragraphs,
        check_sentences: !args.no_check_sentences,
        check_phrases: !args.no_check_phrases,
        check_words: !args.no_check_words,
        min_phrase_len: args
            .min_phrase_length
            .or(defaults.min_phrase_length)
            .unwrap_or(base.min_phrase_len),
        max_phrase_len: args
            .max_phrase_length
            .or(defaults.max_phrase_length)
            .unwrap_or(base.max_phrase_len),
        min_paragraph_words: args
            .min_paragraph_words
            .or(defaults.min_paragraph_words)
            .unwrap_or(base.min_paragraph_words),
        fuzzy: args.fuzzy,
        fuzz_threshold: args
            .fuzz_threshold
            .or(defaults.fuzz_threshold)
            .unwrap_or(base.fuzz_threshold),
        max_fuzzy_units: args.max_fuzzy_units,
        fuzzy_timeout: std::time::Duration::from_secs(args.fuzzy_timeout),
        ..base
    }
}

fn load_documents(path: &std::path::Path) -> Result<(Vec<Document>, Vec<ScanError>)> {
    let walker = Walker::new(path);
    let (documents, errors) = read_documents(&walker)?;
    if documents.is_empty() {
        log::warn!("no .txt or .md files found under {}", path.display());
    } else {
        log::info!("loaded {} document(s)", documents.len());
    }
    Ok((documents, errors))
}

/// Convert loader errors into warnings ahead of the engine's own.
fn prepend_scan_warnings(results: &mut ScanResults, errors: Vec<ScanError>) {
    let mut warnings: Vec<RunWarning> = errors
        .into_iter()
        .map(|e| RunWarning::SkippedDocument {
            path: e.path().to_path_buf(),
            message: e.to_string(),
        })
        .collect();
    warnings.append(&mut results.warnings);
    results.warnings = warnings;
}

fn scan_exit_code(results: &ScanResults) -> ExitCode {
    if !results.warnings.is_empty() {
        ExitCode::PartialSuccess
    } else if results.has_findings() {
        ExitCode::Success
    } else {
        ExitCode::NoFindings
    }
}

fn print_scan_summary(results: &ScanResults, dir: &std::path::Path, files_written: usize) {
    println!();
    if results.has_findings() {
        println!(
            "{} {} group(s) across {} document(s)",
            "Findings:".green().bold(),
            results.group_count(),
            results.stats.documents
        );
        for row in &results.summary {
            println!(
                "  {:<10} {:<10} {:>5} group(s), {:>6} member(s)",
                row.granularity.plural(),
                row.kind.as_str(),
                row.group_count,
                row.member_count
            );
        }
        println!(
            "{} report file(s) written to {}",
            files_written + 1,
            dir.display()
        );
    } else {
        println!("{}", "No duplicated or similar text found.".green());
    }
    print_warnings(results);
}

fn print_warnings(results: &ScanResults) {
    for warning in &results.warnings {
        println!("{} {warning}", "warning:".yellow().bold());
    }
}
