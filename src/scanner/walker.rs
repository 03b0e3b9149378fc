//! Directory traversal and file discovery.
//!
//! The walker collects `.txt` and `.md` files under a root directory and
//! orders them by natural sort of their relative paths, so `note2.md` comes
//! before `note10.md`. That order is the stable tie-break for all downstream
//! output; the engine preserves it and never re-derives its own.

use std::cmp::Ordering;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use super::ScanError;

/// A discovered input file.
#[derive(Debug, Clone)]
pub struct DiscoveredFile {
    /// Absolute path for reading
    pub absolute: PathBuf,
    /// Path relative to the scan root, used as the document identity
    pub relative: PathBuf,
}

/// Directory walker for text and markdown files.
#[derive(Debug, Clone)]
pub struct Walker {
    root: PathBuf,
}

impl Walker {
    /// Create a walker rooted at the given directory.
    #[must_use]
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
        }
    }

    /// The scan root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Collect all qualifying files in natural sort order.
    ///
    /// Traversal errors for individual entries (permission denied, broken
    /// links) are returned alongside the discovered files; they never abort
    /// the walk.
    ///
    /// # Errors
    ///
    /// Returns an error if the root does not exist or is not a directory.
    pub fn collect_files(&self) -> anyhow::Result<(Vec<DiscoveredFile>, Vec<ScanError>)> {
        if !self.root.is_dir() {
            anyhow::bail!("{} is not a directory", self.root.display());
        }

        let mut files = Vec::new();
        let mut errors = Vec::new();

        for entry in WalkDir::new(&self.root) {
            match entry {
                Ok(entry) => {
                    if !entry.file_type().is_file() || !is_text_file(entry.path()) {
                        continue;
                    }
                    let relative = entry
                        .path()
                        .strip_prefix(&self.root)
                        .unwrap_or(entry.path())
                        .to_path_buf();
                    files.push(DiscoveredFile {
                        absolute: entry.path().to_path_buf(),
                        relative,
                    });
                }
                Err(e) => {
                    let path = e
                        .path()
                        .map(Path::to_path_buf)
                        .unwrap_or_else(|| self.root.clone());
                    log::warn!("Walk error at {}: {}", path.display(), e);
                    errors.push(ScanError::Walk {
                        path,
                        message: e.to_string(),
                    });
                }
            }
        }

        files.sort_by(|a, b| natural_cmp(&a.relative, &b.relative));

        log::debug!("Discovered {} file(s) under {}", files.len(), self.root.display());

        Ok((files, errors))
    }
}

/// Whether a path qualifies for scanning (`.txt` or `.md`, case-insensitive).
#[must_use]
pub fn is_text_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("txt") || e.eq_ignore_ascii_case("md"))
}

/// One segment of a natural sort key: either a digit run or a text run.
#[derive(Debug, PartialEq, Eq)]
enum NaturalChunk<'a> {
    Number(u128),
    Text(&'a str),
}

/// Compare two paths in natural sort order.
///
/// Digit runs compare numerically, everything else compares as lowercase
/// text, so `page2` sorts before `page10`.
#[must_use]
pub fn natural_cmp(a: &Path, b: &Path) -> Ordering {
    let a = a.to_string_lossy();
    let b = b.to_string_lossy();
    let mut left = chunks(&a);
    let mut right = chunks(&b);

    loop {
        match (left.next(), right.next()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(l), Some(r)) => {
                let ord = match (l, r) {
                    (NaturalChunk::Number(x), NaturalChunk::Number(y)) => x.cmp(&y),
                    (NaturalChunk::Number(_), NaturalChunk::Text(_)) => Ordering::Less,
                    (NaturalChunk::Text(_), NaturalChunk::Number(_)) => Ordering::Greater,
                    (NaturalChunk::Text(x), NaturalChunk::Text(y)) => {
                        x.to_lowercase().cmp(&y.to_lowercase())
                    }
                };
                if ord != Ordering::Equal {
                    return ord;
                }
            }
        }
    }
}

/// Split a string into alternating digit and non-digit chunks.
fn chunks(s: &str) -> impl Iterator<Item = NaturalChunk<'_>> {
    let bytes = s.as_bytes();
    let mut pos = 0;
    std::iter::from_fn(move || {
        if pos >= bytes.len() {
            return None;
        }
        let start = pos;
        let digit = bytes[pos].is_ascii_digit();
        while pos < bytes.len() && bytes[pos].is_ascii_digit() == digit {
            pos += 1;
        }
        let chunk = &s[start..pos];
        if digit {
            // Digit runs longer than u128 fall back to text comparison
            match chunk.parse() {
                Ok(n) => Some(NaturalChunk::Number(n)),
                Err(_) => Some(NaturalChunk::Text(chunk)),
            }
        } else {
            Some(NaturalChunk::Text(chunk))
        }
    })
}
