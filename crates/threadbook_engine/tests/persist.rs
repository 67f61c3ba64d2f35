use std::fs;

use threadbook_engine::{ensure_output_dir, AtomicFileWriter, PersistError};
use tempfile::TempDir;

#[test]
fn creates_missing_output_dir() {
    let temp = TempDir::new().unwrap();
    let new_dir = temp.path().join("out");
    assert!(!new_dir.exists());
    ensure_output_dir(&new_dir).unwrap();
    assert!(new_dir.is_dir());
}

#[test]
fn atomic_write_replaces_existing_and_is_atomic() {
    let temp = TempDir::new().unwrap();
    let writer = AtomicFileWriter::new(temp.path().to_path_buf());

    let first = writer.write("mimetype", "hello").unwrap();
    assert_eq!(first.file_name().unwrap(), "mimetype");
    assert_eq!(fs::read_to_string(&first).unwrap(), "hello");

    // Replace existing
    let second = writer.write("mimetype", "world").unwrap();
    assert_eq!(first, second);
    assert_eq!(fs::read_to_string(&second).unwrap(), "world");
}

#[test]
fn nested_paths_create_their_directories() {
    let temp = TempDir::new().unwrap();
    let writer = AtomicFileWriter::new(temp.path().to_path_buf());

    let written = writer.write_bytes("OEBPS/Images/a.png", b"\x89PNG").unwrap();

    assert_eq!(written, temp.path().join("OEBPS").join("Images").join("a.png"));
    assert_eq!(fs::read(&written).unwrap(), b"\x89PNG");
}

#[test]
fn escaping_paths_are_rejected() {
    let temp = TempDir::new().unwrap();
    let writer = AtomicFileWriter::new(temp.path().join("book"));

    for bad in ["../evil.txt", "a//b", "", "OEBPS/./x"] {
        assert!(matches!(writer.write(bad, "x"), Err(PersistError::InvalidPath(_))), "{bad}");
    }
    assert!(!temp.path().join("evil.txt").exists());
}

#[test]
fn no_partial_file_on_error() {
    let temp = TempDir::new().unwrap();
    let file_path = temp.path().join("not_a_dir");
    fs::write(&file_path, "x").unwrap();

    let writer = AtomicFileWriter::new(file_path.clone());
    let result = writer.write("content.opf", "data");
    assert!(result.is_err());
    assert!(!file_path.with_file_name("content.opf").exists());
}
