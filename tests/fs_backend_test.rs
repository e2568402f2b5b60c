use cmdb_attrs::api::AttributeManager;
use cmdb_attrs::model::{NewAttribute, ValueType};
use cmdb_attrs::store::fs_backend::FsBackend;
use cmdb_attrs::store::{Database, StorageBackend, Tables};
use std::fs;
use tempfile::TempDir;

fn setup() -> (TempDir, FsBackend) {
    let dir = TempDir::new().unwrap();
    let backend = FsBackend::new(dir.path().join("data"));
    (dir, backend)
}

#[test]
fn test_missing_file_loads_empty_tables() {
    let (_dir, backend) = setup();
    assert_eq!(backend.load().unwrap(), Tables::default());
    assert!(!backend.data_file().exists());
}

#[test]
fn test_store_then_load() {
    let (_dir, backend) = setup();
    let db = Database::new(backend);
    let mut tx = db.begin().unwrap();
    let attr_id = tx.next_id("c_attributes");
    tx.bind_ci_type(4, attr_id);
    tx.commit().unwrap();

    let loaded = db.backend().load().unwrap();
    assert_eq!(loaded.revision, 1);
    assert_eq!(loaded.ci_type_attributes.len(), 1);
    assert_eq!(loaded.ci_type_attributes[0].type_id, 4);
}

#[test]
fn test_atomic_write_leaves_no_tmp_files() {
    let (_dir, backend) = setup();
    backend.store(&Tables::default()).unwrap();
    backend.store(&Tables::default()).unwrap();

    for entry in fs::read_dir(backend.root()).unwrap() {
        let path = entry.unwrap().path();
        let name = path.file_name().unwrap().to_str().unwrap().to_string();
        assert!(!name.ends_with(".tmp"), "Found leftover tmp file: {}", name);
    }
}

#[test]
fn test_corrupt_file_is_a_serialization_error() {
    let (_dir, backend) = setup();
    fs::create_dir_all(backend.root()).unwrap();
    fs::write(backend.data_file(), "{ not json").unwrap();

    let err = backend.load().unwrap_err();
    assert!(matches!(err, cmdb_attrs::error::AttrError::Serialization(_)));
}

#[test]
fn test_state_survives_a_new_manager() {
    let (dir, backend) = setup();
    let manager = AttributeManager::new(backend);
    let id = manager
        .add(
            NewAttribute::new("cores")
                .with_value_type(ValueType::Int)
                .with_choices([2i64, 4i64]),
        )
        .unwrap();
    drop(manager);

    let reopened = AttributeManager::new(FsBackend::new(dir.path().join("data")));
    let view = reopened.get_by_id(id).unwrap().unwrap();
    assert_eq!(view.attribute.name, "cores");
    assert_eq!(view.choice_values.len(), 2);

    // sequences are persisted too
    let next = reopened.add(NewAttribute::new("memory")).unwrap();
    assert_eq!(next, id + 1);
}
