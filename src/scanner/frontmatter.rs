//! Frontmatter isolation for markdown documents.
//!
//! A frontmatter block is a leading YAML metadata section fenced by a `---`
//! marker line and terminated by a `---` or `...` marker line. The opening
//! fence sits at offset 0, or directly after a single non-blank label line
//! (a "Title: x" style prefix some exporters emit); that label line counts
//! as part of the block. Several adjacent blocks are concatenated and
//! treated as one frontmatter unit. The block is excluded from every
//! comparison granularity but preserved byte-for-byte for output that
//! reconstructs the file.
//!
//! Detection fails open: an unterminated or otherwise malformed block is not
//! an error, the whole input is treated as body with no frontmatter.

/// Byte length of the leading frontmatter block, 0 if none is present.
///
/// The returned length always falls on a line boundary, so
/// `&raw[..frontmatter_len(raw)]` is the complete block including its
/// closing fence line, and the remainder is the body.
#[must_use]
pub fn frontmatter_len(raw: &str) -> usize {
    // The label line is tolerated for the first block only; everything
    // after it must open with a fence directly
    let Some(mut total) = block_len(raw).or_else(|| labeled_block_len(raw)) else {
        return 0;
    };

    // Adjacent blocks concatenate into one frontmatter unit
    while let Some(len) = block_len(&raw[total..]) {
        total += len;
    }

    total
}

/// Length of a block whose opening fence is preceded by exactly one
/// non-blank, non-fence label line; the label line is part of the block.
fn labeled_block_len(text: &str) -> Option<usize> {
    let (start, end) = line_spans(text).next()?;
    let first = &text[start..end];
    if first.trim().is_empty() || is_fence(first, false) {
        return None;
    }
    // No newline after the label means no room for a fence
    if end >= text.len() {
        return None;
    }
    let rest = end + 1;
    block_len(&text[rest..]).map(|len| rest + len)
}

/// Length of a single fenced block at the start of `text`, if present
/// and properly terminated.
fn block_len(text: &str) -> Option<usize> {
    let mut lines = line_spans(text);

    let (first_start, first_end) = lines.next()?;
    if !is_fence(&text[first_start..first_end], false) {
        return None;
    }

    for (start, end) in lines {
        if is_fence(&text[start..end], true) {
            // Include the terminator line and its newline
            let terminator_end = match text[end..].find('\n') {
                Some(i) => end + i + 1,
                None => text.len(),
            };
            return Some(terminator_end);
        }
    }

    // Unterminated block: fail open
    None
}

/// Check whether a line (without its newline) is a fence marker.
///
/// Opening fences are `---`; closing fences may also be `...` per YAML
/// document-end convention. Trailing whitespace is tolerated.
fn is_fence(line: &str, closing: bool) -> bool {
    let trimmed = line.trim_end();
    trimmed == "---" || (closing && trimmed == "...")
}

/// Iterate over (start, end) byte spans of lines, ends excluding the newline.
fn line_spans(text: &str) -> impl Iterator<Item = (usize, usize)> + '_ {
    let mut pos = 0;
    std::iter::from_fn(move || {
        if pos >= text.len() {
            return None;
        }
        let start = pos;
        let end = match text[pos..].find('\n') {
            Some(i) => {
                pos += i + 1;
                start + i
            }
            None => {
                pos = text.len();
                text.len()
            }
        };
        Some((start, end))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_frontmatter() {
        assert_eq!(frontmatter_len("Just a body.\nSecond line.\n"), 0);
        assert_eq!(frontmatter_len(""), 0);
    }

    #[test]
    fn test_basic_block() {
        let raw = "---\ntitle: x\n---\nbody\n";
        let len = frontmatter_len(raw);
        assert_eq!(&raw[..len], "---\ntitle: x\n---\n");
        assert_eq!(&raw[len..], "body\n");
    }

    #[test]
    fn test_yaml_document_end_terminator() {
        let raw = "---\ntitle: x\n...\nbody\n";
        let len = frontmatter_len(raw);
        assert_eq!(&raw[..len], "---\ntitle: x\n...\n");
    }

    #[test]
    fn test_label_line_before_fence_included() {
        let raw = "First line here\n---\ntitle: Test Document\nauthor: Test Author\n---\nThis is the main content.";
        let len = frontmatter_len(raw);
        assert!(len > 0);
        assert_eq!(&raw[len..], "This is the main content.");
        assert!(raw[..len].starts_with("First line here\n---\n"));
    }

    #[test]
    fn test_block_not_after_multiple_body_lines() {
        // At most one label line; further in, a fence is body text
        let raw = "intro\nsecond line\n---\ntitle: x\n---\n";
        assert_eq!(frontmatter_len(raw), 0);
    }

    #[test]
    fn test_label_with_unterminated_block_fails_open() {
        let raw = "First line here\n---\ntitle: x\nno terminator\n";
        assert_eq!(frontmatter_len(raw), 0);
    }

    #[test]
    fn test_blank_first_line_is_not_a_label() {
        let raw = "\n---\ntitle: x\n---\nbody\n";
        assert_eq!(frontmatter_len(raw), 0);
    }

    #[test]
    fn test_label_only_tolerated_for_first_block() {
        let raw = "---\na: 1\n---\nnot a label\n---\nb: 2\n---\nbody\n";
        let len = frontmatter_len(raw);
        assert_eq!(&raw[..len], "---\na: 1\n---\n");
    }

    #[test]
    fn test_unterminated_block_fails_open() {
        let raw = "---\ntitle: x\nstill metadata\n";
        assert_eq!(frontmatter_len(raw), 0);
    }

    #[test]
    fn test_adjacent_blocks_concatenate() {
        let raw = "---\na: 1\n---\n---\nb: 2\n---\nbody\n";
        let len = frontmatter_len(raw);
        assert_eq!(&raw[..len], "---\na: 1\n---\n---\nb: 2\n---\n");
        assert_eq!(&raw[len..], "body\n");
    }

    #[test]
    fn test_whole_file_is_frontmatter() {
        let raw = "---\ntitle: x\n---\n";
        assert_eq!(frontmatter_len(raw), raw.len());
    }

    #[test]
    fn test_terminator_without_trailing_newline() {
        let raw = "---\ntitle: x\n---";
        assert_eq!(frontmatter_len(raw), raw.len());
    }

    #[test]
    fn test_fence_with_trailing_whitespace() {
        let raw = "---  \ntitle: x\n---\t\nbody\n";
        let len = frontmatter_len(raw);
        assert_eq!(&raw[len..], "body\n");
    }

    #[test]
    fn test_empty_block() {
        let raw = "---\n---\nbody\n";
        let len = frontmatter_len(raw);
        assert_eq!(&raw[..len], "---\n---\n");
    }
}
