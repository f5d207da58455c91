use std::fs;

use shelf_engine::{ensure_output_dir, AtomicFileWriter, PersistError};
use tempfile::TempDir;

#[test]
fn creates_missing_output_dir() {
    let temp = TempDir::new().unwrap();
    let new_dir = temp.path().join("static").join("debug");
    assert!(!new_dir.exists());
    ensure_output_dir(&new_dir).unwrap();
    assert!(new_dir.is_dir());
}

#[test]
fn atomic_write_replaces_existing_file() {
    let temp = TempDir::new().unwrap();
    let writer = AtomicFileWriter::new(temp.path().to_path_buf());

    let first = writer.write("results.csv", "title;price\n").unwrap();
    assert_eq!(first.file_name().unwrap(), "results.csv");

    let second = writer.write("results.csv", "title;price\nMouse;990\n").unwrap();
    assert_eq!(first, second);
    assert_eq!(fs::read_to_string(&second).unwrap(), "title;price\nMouse;990\n");
    assert_eq!(fs::read_dir(temp.path()).unwrap().count(), 1);
}

#[test]
fn binary_artifacts_are_written_verbatim() {
    let temp = TempDir::new().unwrap();
    let writer = AtomicFileWriter::new(temp.path().join("debug"));

    let path = writer.write_bytes("shot.png", &[0x89, b'P', b'N', b'G']).unwrap();
    assert_eq!(fs::read(path).unwrap(), vec![0x89, b'P', b'N', b'G']);
}

#[test]
fn no_partial_file_on_error() {
    let temp = TempDir::new().unwrap();
    let file_path = temp.path().join("not_a_dir");
    fs::write(&file_path, "x").unwrap();

    let writer = AtomicFileWriter::new(file_path.clone());
    let err = writer.write("results.csv", "data").unwrap_err();
    assert!(matches!(&err, PersistError::NotADirectory(path) if *path == file_path));
    assert!(!file_path.with_file_name("results.csv").exists());
}
