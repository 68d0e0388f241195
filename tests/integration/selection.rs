//! Selection behavior over a real filesystem store.

use proforma::record::{FsRecordStore, RecordStore};
use proforma::selector::{select_records, SelectionMode};
use std::path::Path;
use tempfile::TempDir;

fn write_record(dir: &Path, id: &str, org: &str) {
    std::fs::write(
        dir.join(format!("{id}.json")),
        format!(r#"{{"identifier": "{id}", "organization_name": "{org}", "body": "text"}}"#),
    )
    .unwrap();
}

#[test]
fn test_store_discovers_json_files_in_name_order() {
    let input = TempDir::new().unwrap();
    write_record(input.path(), "zulu", "Zulu");
    write_record(input.path(), "alpha", "Alpha");
    std::fs::write(input.path().join("notes.txt"), "ignored").unwrap();
    std::fs::create_dir(input.path().join("nested")).unwrap();
    write_record(&input.path().join("nested"), "hidden", "Hidden");

    let store = FsRecordStore::open(input.path()).unwrap();
    let ids = store.list_identifiers().unwrap();

    // Non-JSON files and nested directories are not records.
    assert_eq!(ids, vec!["alpha", "zulu"]);
}

#[test]
fn test_missing_output_selects_only_unpublished_records() {
    let input = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    write_record(input.path(), "a", "Acme Corp");
    write_record(input.path(), "b", "Globex");
    write_record(input.path(), "c", "Initech");

    // "a" and "c" already have artifacts at their derived names.
    std::fs::write(output.path().join("acmecorp.html"), "<html></html>").unwrap();
    std::fs::write(output.path().join("initech.html"), "<html></html>").unwrap();

    let store = FsRecordStore::open(input.path()).unwrap();
    let selected = select_records(
        &store,
        &SelectionMode::MissingOutput {
            output_dir: output.path().to_path_buf(),
        },
    )
    .unwrap();

    assert_eq!(selected, vec!["b"]);
}

#[test]
fn test_changed_selection_matches_source_paths() {
    let input = TempDir::new().unwrap();
    write_record(input.path(), "a", "Acme");
    write_record(input.path(), "b", "Globex");
    write_record(input.path(), "c", "Initech");

    let store = FsRecordStore::open(input.path()).unwrap();
    let selected = select_records(
        &store,
        &SelectionMode::Changed {
            changed_paths: vec![
                input.path().join("a.json"),
                input.path().join("c.json"),
                input.path().join("unrelated.json"),
            ],
        },
    )
    .unwrap();

    assert_eq!(selected, vec!["a", "c"]);
}

#[test]
fn test_changed_selection_with_no_overlap_falls_back_to_everything() {
    let input = TempDir::new().unwrap();
    let elsewhere = TempDir::new().unwrap();
    write_record(input.path(), "a", "Acme");
    write_record(input.path(), "b", "Globex");

    let store = FsRecordStore::open(input.path()).unwrap();
    let selected = select_records(
        &store,
        &SelectionMode::Changed {
            changed_paths: vec![elsewhere.path().join("x.json")],
        },
    )
    .unwrap();

    assert_eq!(selected, vec!["a", "b"]);
}

#[test]
fn test_missing_input_directory_is_an_error() {
    let temp = TempDir::new().unwrap();
    let err = FsRecordStore::open(&temp.path().join("absent")).unwrap_err();
    assert!(err.to_string().contains("absent"));
}
