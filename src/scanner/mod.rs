//! Scanner module for document discovery and loading.
//!
//! This module provides functionality for:
//! - Directory traversal in natural sort order ([`walker`])
//! - Frontmatter isolation for markdown documents ([`frontmatter`])
//! - Loading documents fully into memory before segmentation
//!
//! # Example
//!
//! ```no_run
//! use dejatext::scanner::{read_documents, Walker};
//! use std::path::Path;
//!
//! let walker = Walker::new(Path::new("./notes"));
//! let (documents, errors) = read_documents(&walker).unwrap();
//! for doc in &documents {
//!     println!("{}: {} body bytes", doc.path.display(), doc.body().len());
//! }
//! ```

pub mod frontmatter;
pub mod walker;

use std::path::PathBuf;

use thiserror::Error;

pub use walker::Walker;

/// Errors that can occur while loading a document.
///
/// These are non-fatal: the affected document is skipped, a warning is
/// recorded, and the scan continues.
#[derive(Debug, Error)]
pub enum ScanError {
    /// An I/O error occurred while reading the file.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid UTF-8.
    #[error("{path} is not valid UTF-8")]
    Decode {
        /// Path of the undecodable file
        path: PathBuf,
    },

    /// An error occurred while walking the directory tree.
    #[error("failed to walk {path}: {message}")]
    Walk {
        /// Path where traversal failed
        path: PathBuf,
        /// Error description
        message: String,
    },
}

impl ScanError {
    /// Path the error refers to.
    #[must_use]
    pub fn path(&self) -> &std::path::Path {
        match self {
            Self::Io { path, .. } | Self::Decode { path } | Self::Walk { path, .. } => path,
        }
    }
}

/// A loaded input document.
///
/// Identity is the path relative to the scan root. The raw text is read once
/// and immutable thereafter; the frontmatter/body split is computed at load
/// time so every downstream consumer sees the same boundary.
#[derive(Debug, Clone)]
pub struct Document {
    /// Path relative to the scan root (used in all reports)
    pub path: PathBuf,
    /// Complete raw text of the file
    raw: String,
    /// Byte length of the leading frontmatter block (0 if none)
    frontmatter_len: usize,
    /// Number of raw lines occupied by the frontmatter block
    frontmatter_lines: usize,
}

impl Document {
    /// Create a document from raw text.
    ///
    /// Frontmatter is only detected for frontmatter-eligible files
    /// (markdown); plain text files are taken as all body.
    ///
    /// # Arguments
    ///
    /// * `path` - Path relative to the scan root
    /// * `raw` - Complete file contents
    /// * `frontmatter_eligible` - Whether to look for a leading metadata block
    #[must_use]
    pub fn new(path: PathBuf, raw: String, frontmatter_eligible: bool) -> Self {
        let frontmatter_len = if frontmatter_eligible {
            frontmatter::frontmatter_len(&raw)
        } else {
            0
        };
        let frontmatter_lines = raw[..frontmatter_len].lines().count();
        Self {
            path,
            raw,
            frontmatter_len,
            frontmatter_lines,
        }
    }

    /// Whether a path is frontmatter-eligible (markdown files only).
    #[must_use]
    pub fn is_frontmatter_eligible(path: &std::path::Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("md"))
    }

    /// Complete raw text, frontmatter included.
    #[must_use]
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// The leading metadata block, preserved byte-for-byte, or `None`.
    #[must_use]
    pub fn frontmatter(&self) -> Option<&str> {
        if self.frontmatter_len > 0 {
            Some(&self.raw[..self.frontmatter_len])
        } else {
            None
        }
    }

    /// The document body with frontmatter excluded.
    ///
    /// All segmentation offsets refer to this text; no text unit ever
    /// crosses the frontmatter boundary.
    #[must_use]
    pub fn body(&self) -> &str {
        &self.raw[self.frontmatter_len..]
    }

    /// Number of file lines occupied by the frontmatter block.
    ///
    /// Added to body-relative line numbers so reported locations match the
    /// original file.
    #[must_use]
    pub fn body_line_offset(&self) -> usize {
        self.frontmatter_lines
    }
}

/// Read all documents discovered by the walker, fully into memory.
///
/// Unreadable or undecodable files are skipped and returned as errors
/// alongside the successfully loaded documents; a partial failure never
/// aborts the whole scan.
///
/// # Errors
///
/// Returns an error only if the scan root itself does not exist or is not
/// a directory.
pub fn read_documents(walker: &Walker) -> anyhow::Result<(Vec<Document>, Vec<ScanError>)> {
    let (files, mut errors) = walker.collect_files()?;

    let mut documents = Vec::with_capacity(files.len());
    for file in files {
        match std::fs::read(&file.absolute) {
            Ok(bytes) => match String::from_utf8(bytes) {
                Ok(raw) => {
                    let eligible = Document::is_frontmatter_eligible(&file.relative);
                    documents.push(Document::new(file.relative, raw, eligible));
                }
                Err(_) => {
                    log::warn!("Skipping non-UTF-8 file: {}", file.relative.display());
                    errors.push(ScanError::Decode {
                        path: file.relative,
                    });
                }
            },
            Err(source) => {
                log::warn!("Skipping unreadable file {}: {}", file.relative.display(), source);
                errors.push(ScanError::Io {
                    path: file.relative,
                    source,
                });
            }
        }
    }

    log::info!(
        "Loaded {} document(s), {} skipped",
        documents.len(),
        errors.len()
    );

    Ok((documents, errors))
}
