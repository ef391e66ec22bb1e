//! Tests for snapshot backends

use rigparams_rs::codec::CodecError;
use rigparams_rs::evaluator::EvaluatorRegistry;
use rigparams_rs::parameters::{Parameter, Value, ValueType};
use rigparams_rs::snapshot::{
    FileSnapshotBackend, MemorySnapshotBackend, SnapshotBackend, SnapshotError,
};
use rigparams_rs::store::ParameterStore;
use rigparams_rs::sysparams::system_parameters;
use std::collections::HashMap;
use std::fs;
use std::sync::Arc;
use std::thread;
use tempfile::TempDir;

fn rig_store() -> ParameterStore {
    let store = ParameterStore::new();
    store
        .load(system_parameters(&EvaluatorRegistry::with_builtin()).unwrap())
        .unwrap();
    store
}

fn values(params: &[Parameter]) -> HashMap<String, Value> {
    params
        .iter()
        .map(|p| (p.name().to_string(), p.value().clone()))
        .collect()
}

/// Exercise the contract every backend shares
fn check_backend(backend: &dyn SnapshotBackend) {
    assert!(backend.list().unwrap().is_empty());

    let first = backend
        .save(&[Parameter::new("iso", 800, ValueType::Int)])
        .unwrap();
    let second = backend
        .save(&[Parameter::new("iso", 1600, ValueType::Int)])
        .unwrap();
    assert_eq!((first, second), (1, 2));
    assert_eq!(backend.list().unwrap(), vec![1, 2]);

    assert_eq!(
        backend.load(2).unwrap()[0].value(),
        &Value::Int(1600)
    );

    // ids continue from the highest one left
    assert_eq!(backend.delete(2).unwrap(), 2);
    assert_eq!(backend.save(&[]).unwrap(), 2);
    assert!(backend.load(2).unwrap().is_empty());

    assert_eq!(backend.delete(40).unwrap(), 40);
    assert!(matches!(
        backend.load(40),
        Err(SnapshotError::NotFound { id: 40 })
    ));

    assert_eq!(backend.delete_all().unwrap(), vec![1, 2]);
    assert!(backend.list().unwrap().is_empty());
    assert_eq!(backend.save(&[]).unwrap(), 1);
}

#[test]
fn test_memory_backend_contract() {
    check_backend(&MemorySnapshotBackend::new());
}

#[test]
fn test_file_backend_contract() {
    let dir = TempDir::new().unwrap();
    check_backend(&FileSnapshotBackend::new(dir.path()).unwrap());
}

#[test]
fn test_file_backend_full_rig() {
    let dir = TempDir::new().unwrap();
    let backend = FileSnapshotBackend::new(dir.path().join("snapshots")).unwrap();
    assert!(backend.location().is_dir());

    let store = rig_store();
    store.set("focus_distance_m", f64::INFINITY).unwrap();
    store.set("scene_name", "harbour").unwrap();
    let params = store.get_parameters();

    let id = backend.save(&params).unwrap();
    let loaded = backend.load(id).unwrap();

    assert_eq!(loaded.len(), params.len());
    assert_eq!(values(&loaded), values(&params));

    let by_name: HashMap<&str, &Parameter> = loaded.iter().map(|p| (p.name(), p)).collect();
    assert!(by_name["camera_id"].is_read_only());
    assert_eq!(by_name["sensor_width_px"].value_type(), ValueType::Int);
    assert_eq!(
        by_name["focus_distance_m"].value(),
        &Value::Float(f64::INFINITY)
    );
}

#[test]
fn test_file_backend_ignores_foreign_files() {
    let dir = TempDir::new().unwrap();
    let backend = FileSnapshotBackend::new(dir.path()).unwrap();

    fs::write(dir.path().join("notes.txt"), "not a snapshot").unwrap();
    fs::create_dir(dir.path().join("17")).unwrap();

    assert!(backend.list().unwrap().is_empty());
    assert_eq!(backend.save(&[]).unwrap(), 1);
    assert_eq!(backend.list().unwrap(), vec![1]);
}

#[test]
fn test_file_backend_reopens_existing() {
    let dir = TempDir::new().unwrap();
    {
        let backend = FileSnapshotBackend::new(dir.path()).unwrap();
        backend
            .save(&[Parameter::new("baseline_mm", 65.0, ValueType::Float)])
            .unwrap();
    }

    let backend = FileSnapshotBackend::new(dir.path()).unwrap();
    assert_eq!(backend.list().unwrap(), vec![1]);
    assert_eq!(backend.save(&[]).unwrap(), 2);
    assert_eq!(
        backend.load(1).unwrap()[0].value(),
        &Value::Float(65.0)
    );
}

#[test]
fn test_file_backend_corrupt_snapshot() {
    let dir = TempDir::new().unwrap();
    let backend = FileSnapshotBackend::new(dir.path()).unwrap();
    fs::write(dir.path().join("3"), "{ truncated").unwrap();

    assert!(matches!(backend.load(3), Err(SnapshotError::Codec(_))));
}

#[test]
fn test_nan_never_written_to_disk() {
    let dir = TempDir::new().unwrap();
    let backend = FileSnapshotBackend::new(dir.path()).unwrap();

    let err = backend
        .save(&[
            Parameter::new("baseline_mm", 65.0, ValueType::Float),
            Parameter::new("focus_distance_m", f64::NAN, ValueType::Float),
        ])
        .unwrap_err();
    assert!(matches!(
        err,
        SnapshotError::Codec(CodecError::NotANumber { .. })
    ));
    assert!(backend.list().unwrap().is_empty());
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);

    // the store refuses the value, so its snapshots stay loadable
    let store = rig_store();
    assert!(store.set("focus_distance_m", "NaN").is_err());
    let id = backend.save(&store.get_parameters()).unwrap();
    let loaded = backend.load(id).unwrap();
    assert_eq!(
        values(&loaded)["focus_distance_m"],
        Value::Float(5.0)
    );
}

#[test]
fn test_concurrent_saves_get_distinct_ids() {
    let dir = TempDir::new().unwrap();
    let backend = Arc::new(FileSnapshotBackend::new(dir.path()).unwrap());

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let backend = backend.clone();
            thread::spawn(move || {
                backend
                    .save(&[Parameter::new("take_no", i, ValueType::Int)])
                    .unwrap()
            })
        })
        .collect();

    let mut ids: Vec<u64> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    ids.sort_unstable();
    assert_eq!(ids, (1..=8).collect::<Vec<u64>>());
}
