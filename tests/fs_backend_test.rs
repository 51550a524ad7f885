use mdpages::store::{DocumentStore, FsBackend, StorageBackend, KEY_DOCUMENTS};
use std::fs;
use tempfile::TempDir;

fn leftover_tmp_files(dir: &std::path::Path) -> Vec<String> {
    fs::read_dir(dir)
        .unwrap()
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .filter(|name| name.ends_with(".tmp"))
        .collect()
}

#[test]
fn writes_are_atomic_and_leave_no_tmp_files() {
    let dir = TempDir::new().unwrap();
    let backend = FsBackend::new(dir.path().join("nested"));

    backend.write("documents", "[]").unwrap();
    backend.write("documents", "[1]").unwrap();

    assert_eq!(backend.read("documents").unwrap().as_deref(), Some("[1]"));
    assert!(leftover_tmp_files(backend.root()).is_empty());
}

#[test]
fn missing_and_removed_keys_read_as_none() {
    let dir = TempDir::new().unwrap();
    let backend = FsBackend::new(dir.path());

    assert_eq!(backend.read("nothing").unwrap(), None);
    backend.write("k", "v").unwrap();
    backend.remove("k").unwrap();
    backend.remove("k").unwrap();
    assert!(!backend.contains("k").unwrap());
}

#[test]
fn store_survives_reload_from_disk() {
    let dir = TempDir::new().unwrap();
    let (id, active) = {
        let mut store = DocumentStore::load(FsBackend::new(dir.path()));
        let id = store.create(Some("Report"), "# Q3");
        store.set_active(&id);
        (id, store.active_id())
    };

    let store = DocumentStore::load(FsBackend::new(dir.path()));
    assert_eq!(store.len(), 2);
    assert_eq!(store.get(&id).unwrap().name, "Report");
    assert_eq!(store.active_id(), active);
}

#[test]
fn legacy_files_migrate_once() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("content.json"), "# Old notes").unwrap();
    fs::write(dir.path().join("lastSaved.json"), "1714557600000").unwrap();

    let first = DocumentStore::load(FsBackend::new(dir.path()));
    assert_eq!(first.len(), 1);
    assert_eq!(first.active().content, "# Old notes");
    assert!(first.active().last_saved_at.is_some());
    assert!(!dir.path().join("content.json").exists());
    let migrated_id = first.active_id();
    drop(first);

    let second = DocumentStore::load(FsBackend::new(dir.path()));
    assert_eq!(second.len(), 1);
    assert_eq!(second.active_id(), migrated_id);
}

#[test]
fn corrupt_documents_file_is_recovered_with_warning() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join(format!("{}.json", KEY_DOCUMENTS)), "{not json").unwrap();

    let mut store = DocumentStore::load(FsBackend::new(dir.path()));
    assert_eq!(store.len(), 1);
    assert!(!store.take_warnings().is_empty());
}
