//! Unit tests for the state crate.

use rndb_core::{OverrideMap, Value};
use tempfile::TempDir;

use crate::{FilesystemStore, OverrideFile, OverrideStore};

fn indigo_ball() -> OverrideMap {
    let mut overrides = OverrideMap::new();
    overrides
        .entry("ball".to_string())
        .or_default()
        .entry(12345)
        .or_default()
        .insert("colour".to_string(), Value::from("indigo"));
    overrides
}

// ============================================================================
// OverrideFile Tests
// ============================================================================

#[test]
fn test_override_file_json_shape() {
    let file = OverrideFile::new(137, indigo_ball());
    let json: serde_json::Value = serde_json::from_str(&file.to_json().unwrap()).unwrap();

    assert_eq!(json["seed"], 137);
    assert_eq!(json["overrides"]["ball"]["12345"]["colour"], "indigo");
    assert!(json["created_at"].is_string());
}

#[test]
fn test_override_file_roundtrip() {
    let file = OverrideFile::new(137, indigo_ball());
    let parsed = OverrideFile::from_json(&file.to_json().unwrap()).unwrap();

    assert_eq!(parsed, file);
    assert_eq!(parsed.record_count(), 1);
    assert_eq!(
        parsed.into_overrides()["ball"][&12345]["colour"],
        Value::from("indigo")
    );
}

#[test]
fn test_override_file_seed_check() {
    let file = OverrideFile::new(137, indigo_ball());
    assert!(file.check_seed(137).is_ok());

    let err = file.check_seed(138).unwrap_err();
    assert!(err.to_string().contains("seed mismatch"));
}

#[test]
fn test_override_file_rejects_garbage() {
    assert!(OverrideFile::from_json("{\"seed\": \"abc\"}").is_err());
}

// ============================================================================
// FilesystemStore Tests
// ============================================================================

#[test]
fn test_filesystem_store_save_and_load() {
    let temp_dir = TempDir::new().unwrap();
    let store = FilesystemStore::new(temp_dir.path().join("state"));

    assert!(store.load("session").unwrap().is_none());
    assert!(store.list().unwrap().is_empty());

    let file = OverrideFile::new(137, indigo_ball());
    store.save("session", &file).unwrap();

    assert!(store.path_for("session").exists());
    assert_eq!(store.load("session").unwrap(), Some(file));
    assert_eq!(store.list().unwrap(), vec!["session".to_string()]);
}

#[test]
fn test_filesystem_store_replaces() {
    let temp_dir = TempDir::new().unwrap();
    let store = FilesystemStore::new(temp_dir.path());

    store
        .save("session", &OverrideFile::new(1, OverrideMap::new()))
        .unwrap();
    store
        .save("session", &OverrideFile::new(2, indigo_ball()))
        .unwrap();
    store
        .save("other", &OverrideFile::new(3, OverrideMap::new()))
        .unwrap();

    let loaded = store.load("session").unwrap().unwrap();
    assert_eq!(loaded.seed, 2);
    assert_eq!(
        store.list().unwrap(),
        vec!["other".to_string(), "session".to_string()]
    );
}

#[test]
fn test_filesystem_store_ignores_other_files() {
    let temp_dir = TempDir::new().unwrap();
    std::fs::write(temp_dir.path().join("notes.txt"), "hello").unwrap();
    let store = FilesystemStore::new(temp_dir.path());
    assert!(store.list().unwrap().is_empty());
}

#[test]
fn test_read_and_write_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("nested").join("dump.json");

    let file = OverrideFile::new(137, indigo_ball());
    FilesystemStore::write_file(&path, &file).unwrap();
    assert_eq!(FilesystemStore::read_file(&path).unwrap(), file);

    let err = FilesystemStore::read_file(temp_dir.path().join("missing.json")).unwrap_err();
    assert!(err.to_string().contains("Failed to read override file"));
}

// ============================================================================
// OverrideStore Tests
// ============================================================================

#[test]
fn test_store_as_trait_object() {
    let temp_dir = TempDir::new().unwrap();
    let store: Box<dyn OverrideStore> =
        Box::new(FilesystemStore::new(temp_dir.path().join("state")));
    assert!(store.list().unwrap().is_empty());
    assert!(store.load("session").unwrap().is_none());

    store
        .save("session", &OverrideFile::new(137, indigo_ball()))
        .unwrap();
    let loaded = store.load("session").unwrap().unwrap();
    assert_eq!(loaded.record_count(), 1);
    assert_eq!(store.list().unwrap(), vec!["session".to_string()]);
}
