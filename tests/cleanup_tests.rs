//! End-to-end cleanup tests: a scanned tree mirrored with duplicates
//! removed or marked.

use std::fs;
use std::path::Path;

use dejatext::cleanup::{run_cleanup, CleanupError, DELETED_MARKER};
use dejatext::config::RunConfig;
use dejatext::engine::Engine;
use dejatext::scanner::{read_documents, Walker};

fn write(dir: &Path, name: &str, contents: &str) {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, contents).unwrap();
}

fn cleanup_config() -> RunConfig {
    RunConfig {
        check_files: true,
        check_paragraphs: true,
        check_sentences: true,
        check_phrases: false,
        check_words: false,
        min_paragraph_words: 3,
        ..RunConfig::default()
    }
}

fn run(input: &Path, output: &Path, config: &RunConfig) -> dejatext::cleanup::CleanupStats {
    let walker = Walker::new(input);
    let (documents, _errors) = read_documents(&walker).unwrap();
    let results = Engine::new(config).run(&documents).unwrap();
    run_cleanup(&documents, &results, input, output).unwrap()
}

#[test]
fn test_mirror_without_duplicates_is_verbatim() {
    let input = tempfile::tempdir().unwrap();
    let parent = tempfile::tempdir().unwrap();
    let output = parent.path().join("out");
    write(input.path(), "unique.txt", "Nothing here repeats at all.");

    let stats = run(input.path(), &output, &cleanup_config());
    assert_eq!(stats.files_written, 1);
    assert_eq!(stats.files_dropped, 0);
    assert_eq!(
        fs::read_to_string(output.join("unique.txt")).unwrap(),
        "Nothing here repeats at all."
    );
}

#[test]
fn test_duplicate_file_in_subdirectory_dropped() {
    let input = tempfile::tempdir().unwrap();
    let parent = tempfile::tempdir().unwrap();
    let output = parent.path().join("out");
    write(input.path(), "keep.txt", "Whole file duplicated content.");
    write(input.path(), "sub/drop.txt", "Whole file duplicated content.");

    let stats = run(input.path(), &output, &cleanup_config());
    assert_eq!(stats.files_dropped, 1);
    assert!(output.join("keep.txt").exists());
    assert!(!output.join("sub/drop.txt").exists());
}

#[test]
fn test_later_paragraph_replaced_with_marker() {
    let input = tempfile::tempdir().unwrap();
    let parent = tempfile::tempdir().unwrap();
    let output = parent.path().join("out");
    let shared = "This paragraph carries enough words to clear the comparison floor easily";
    write(
        input.path(),
        "a.txt",
        &format!("{shared}\n\nOnly in the first file"),
    );
    write(
        input.path(),
        "b.txt",
        &format!("{shared}\n\nOnly in the second file"),
    );

    let config = RunConfig {
        check_sentences: false,
        ..cleanup_config()
    };
    let stats = run(input.path(), &output, &config);
    assert_eq!(stats.paragraphs_replaced, 1);

    let first = fs::read_to_string(output.join("a.txt")).unwrap();
    assert!(first.contains(shared));
    assert!(!first.contains(DELETED_MARKER));

    let second = fs::read_to_string(output.join("b.txt")).unwrap();
    assert!(second.contains(DELETED_MARKER));
    assert!(!second.contains(shared));
    assert!(second.contains("Only in the second file"));
}

#[test]
fn test_existing_output_folder_rejected() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    write(input.path(), "a.txt", "Anything at all.");

    let walker = Walker::new(input.path());
    let (documents, _errors) = read_documents(&walker).unwrap();
    let results = Engine::new(&cleanup_config()).run(&documents).unwrap();

    let result = run_cleanup(&documents, &results, input.path(), output.path());
    assert!(matches!(result, Err(CleanupError::OutputExists { .. })));
    // The input tree is untouched either way
    assert!(input.path().join("a.txt").exists());
}

#[test]
fn test_non_text_siblings_survive_into_mirror() {
    let input = tempfile::tempdir().unwrap();
    let parent = tempfile::tempdir().unwrap();
    let output = parent.path().join("out");
    write(input.path(), "keep.txt", "Whole file duplicated content.");
    write(input.path(), "drop.txt", "Whole file duplicated content.");
    fs::write(input.path().join("diagram.pdf"), [0x25, 0x50, 0x44, 0x46]).unwrap();
    fs::create_dir_all(input.path().join("media")).unwrap();
    fs::write(input.path().join("media/photo.jpg"), [0xff, 0xd8, 0xff]).unwrap();

    let stats = run(input.path(), &output, &cleanup_config());
    assert_eq!(stats.files_dropped, 1);
    assert_eq!(stats.other_files_copied, 2);

    // The mirror stands in for the input tree: attachments included,
    // duplicate text file gone
    assert!(output.join("keep.txt").exists());
    assert!(!output.join("drop.txt").exists());
    assert_eq!(
        fs::read(output.join("diagram.pdf")).unwrap(),
        vec![0x25, 0x50, 0x44, 0x46]
    );
    assert!(output.join("media/photo.jpg").exists());
}

#[test]
fn test_frontmatter_survives_body_mutation() {
    let input = tempfile::tempdir().unwrap();
    let parent = tempfile::tempdir().unwrap();
    let output = parent.path().join("out");
    write(
        input.path(),
        "a.md",
        "---\nid: first\n---\nA duplicated sentence lives here. Unique tail a.",
    );
    write(
        input.path(),
        "b.md",
        "---\nid: second\n---\nA duplicated sentence lives here. Unique tail b.",
    );

    let config = RunConfig {
        check_files: false,
        check_paragraphs: false,
        ..cleanup_config()
    };
    run(input.path(), &output, &config);

    let second = fs::read_to_string(output.join("b.md")).unwrap();
    assert!(second.starts_with("---\nid: second\n---\n"));
    assert!(second.contains(DELETED_MARKER));
    assert!(second.contains("Unique tail b."));
}
