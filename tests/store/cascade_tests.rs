//! Tests for cascading re-evaluation

use crate::test_helpers::{derived, doubled, init_logging, input, number};
use approx::assert_relative_eq;
use parking_lot::Mutex;
use rigparams_rs::evaluator::{checked_div, EvaluationError, FnEvaluator};
use rigparams_rs::parameters::{Parameter, Value, ValueType};
use rigparams_rs::store::{ParameterStore, SetOptions, StoreError, StoreSettings};
use std::sync::Arc;

#[test]
fn test_direct_dependent_recomputed() {
    let store = ParameterStore::new();
    store.load(vec![input("a", 1.0), doubled("b", "a")]).unwrap();

    store.set("a", 10.0).unwrap();
    assert_eq!(number(&store, "b"), 20.0);
}

#[test]
fn test_transitive_dependents_see_fresh_values() {
    let store = ParameterStore::new();
    store
        .load(vec![
            input("a", 1.0),
            doubled("b", "a"),
            derived("c", &["a", "b"], |v| Ok(v[0] + v[1])),
            doubled("d", "c"),
        ])
        .unwrap();

    store.set("a", 3.0).unwrap();
    assert_eq!(number(&store, "b"), 6.0);
    assert_eq!(number(&store, "c"), 9.0);
    assert_eq!(number(&store, "d"), 18.0);
}

#[test]
fn test_unrelated_parameters_untouched() {
    let store = ParameterStore::new();
    store
        .load(vec![
            input("a", 1.0),
            input("x", 1.0),
            doubled("b", "a"),
            doubled("y", "x"),
        ])
        .unwrap();

    store.set("a", 2.0).unwrap();
    assert_eq!(number(&store, "b"), 4.0);
    assert_eq!(number(&store, "y"), 0.0);
}

#[test]
fn test_arithmetic_failure_isolated() {
    init_logging();
    let store = ParameterStore::new();
    store
        .load(vec![
            input("a", 2.0),
            derived("inverse", &["a"], |v| checked_div(1.0, v[0])),
            doubled("twice", "a"),
        ])
        .unwrap();

    store.set("a", 4.0).unwrap();
    assert_eq!(number(&store, "inverse"), 0.25);

    // the failing sibling keeps its last value, the other one is updated
    store.set("a", 0.0).unwrap();
    assert_eq!(number(&store, "a"), 0.0);
    assert_eq!(number(&store, "inverse"), 0.25);
    assert_eq!(number(&store, "twice"), 0.0);
}

#[test]
fn test_arithmetic_failure_stops_branch() {
    let store = ParameterStore::new();
    store
        .load(vec![
            input("a", 2.0),
            derived("inverse", &["a"], |v| checked_div(1.0, v[0])),
            doubled("below", "inverse"),
        ])
        .unwrap();

    store.set("a", 1.0).unwrap();
    assert_eq!(number(&store, "below"), 2.0);

    store.set("a", 0.0).unwrap();
    assert_eq!(number(&store, "below"), 2.0);
}

#[test]
fn test_nan_result_tolerated() {
    init_logging();
    let store = ParameterStore::new();
    store
        .load(vec![
            input("a", 4.0),
            derived("root", &["a"], |v| Ok(v[0].sqrt())),
        ])
        .unwrap();

    store.set("a", 9.0).unwrap();
    assert_eq!(number(&store, "root"), 3.0);

    store.set("a", -1.0).unwrap();
    assert_eq!(number(&store, "root"), 3.0);
}

#[test]
fn test_evaluator_failure_propagates() {
    let broken = FnEvaluator::new("broken", &["a"], |_| {
        Err(EvaluationError::Failed {
            message: "lens table missing".to_string(),
        })
    });

    let store = ParameterStore::new();
    store
        .load(vec![
            input("a", 1.0),
            Parameter::new("broken", 0.0, ValueType::Float).with_evaluator(Arc::new(broken)),
        ])
        .unwrap();

    let err = store.set("a", 2.0).unwrap_err();
    assert!(matches!(err, StoreError::Evaluation { ref name, .. } if name == "broken"));
}

#[test]
fn test_non_numeric_input_propagates() {
    let store = ParameterStore::new();
    store
        .load(vec![
            Parameter::new("label", "near", ValueType::Str),
            doubled("twice", "label"),
        ])
        .unwrap();

    assert!(matches!(
        store.set("label", "far"),
        Err(StoreError::Evaluation {
            source: EvaluationError::NonNumericInput { .. },
            ..
        })
    ));
}

#[test]
fn test_invalid_derived_value_propagates() {
    let wrong = FnEvaluator::new("wrong", &["a"], |_| Ok(Value::Str("wide".to_string())));

    let store = ParameterStore::new();
    store
        .load(vec![
            input("a", 1.0),
            Parameter::new("wrong", 0.0, ValueType::Float).with_evaluator(Arc::new(wrong)),
        ])
        .unwrap();

    assert!(matches!(
        store.set("a", 2.0),
        Err(StoreError::Validation { ref name, .. }) if name == "wrong"
    ));
}

#[test]
fn test_derived_value_converted() {
    let store = ParameterStore::new();
    let rounded = FnEvaluator::new("frames", &["seconds"], |i| {
        Ok(Value::Float(i.number("seconds")? * 25.0))
    });
    store
        .load(vec![
            input("seconds", 0.0),
            Parameter::new("frames", 0, ValueType::Int).with_evaluator(Arc::new(rounded)),
        ])
        .unwrap();

    store.set("seconds", 1.5).unwrap();
    assert_eq!(store.get_value("frames").unwrap(), Value::Int(37));
}

#[test]
fn test_out_of_bounds_result_skipped() {
    init_logging();
    let store = ParameterStore::new();
    store
        .load(vec![
            input("a", 1.0),
            doubled("b", "a").with_bounds(0.0, 10.0).unwrap(),
            doubled("c", "a"),
        ])
        .unwrap();

    store.set("a", 4.0).unwrap();
    assert_eq!(number(&store, "b"), 8.0);

    store.set("a", 100.0).unwrap();
    assert_eq!(number(&store, "b"), 8.0);
    assert_eq!(number(&store, "c"), 200.0);
}

#[test]
fn test_failed_set_leaves_state_unchanged() {
    let store = ParameterStore::new();
    store
        .load(vec![
            Parameter::new("iso", 800, ValueType::Int),
            doubled("gain", "iso"),
        ])
        .unwrap();

    assert!(matches!(
        store.set("iso", "fast"),
        Err(StoreError::Validation { .. })
    ));
    assert_eq!(store.get_value("iso").unwrap(), Value::Int(800));
    assert_eq!(number(&store, "gain"), 0.0);

    assert_eq!(
        store.set("missing", 1),
        Err(StoreError::NotFound {
            name: "missing".to_string()
        })
    );
}

#[test]
fn test_nan_write_rejected() {
    let store = ParameterStore::new();
    store
        .load(vec![
            Parameter::new("aperture", 2.8, ValueType::Float)
                .with_bounds(1.0, 22.0)
                .unwrap(),
            doubled("double_aperture", "aperture"),
            input("focus_distance_m", 5.0),
        ])
        .unwrap();

    for name in ["aperture", "focus_distance_m"] {
        assert!(matches!(
            store.set(name, "nan"),
            Err(StoreError::Validation { .. })
        ));
        assert!(store.set(name, f64::NAN).is_err());
        assert!(store.validate(name, "NaN").is_err());
    }
    assert_eq!(store.get_value("aperture").unwrap(), Value::Float(2.8));
    assert_eq!(store.get_value("focus_distance_m").unwrap(), Value::Float(5.0));
    assert_eq!(number(&store, "double_aperture"), 0.0);
}

#[test]
fn test_type_coercion_idempotent() {
    let store = ParameterStore::new();
    store
        .load(vec![Parameter::new("iso", 800, ValueType::Int)])
        .unwrap();

    store.set("iso", 400.7).unwrap();
    assert_eq!(store.get_value("iso").unwrap(), Value::Int(400));

    let converted = store.get_value("iso").unwrap();
    store.set("iso", converted.clone()).unwrap();
    assert_eq!(store.get_value("iso").unwrap(), converted);

    store.set("iso", "1600").unwrap();
    assert_eq!(store.get_value("iso").unwrap(), Value::Int(1600));
}

#[test]
fn test_read_only_not_enforced_by_store() {
    let store = ParameterStore::new();
    store
        .load(vec![
            Parameter::read_only("frame_width_px", 4096, ValueType::Int),
            doubled("double_width", "frame_width_px"),
        ])
        .unwrap();

    store.set("frame_width_px", 1920).unwrap();
    assert_eq!(store.get_value("frame_width_px").unwrap(), Value::Int(1920));
    assert_eq!(number(&store, "double_width"), 3840.0);
}

#[test]
fn test_writing_derived_parameter_cascades() {
    let store = ParameterStore::new();
    store
        .load(vec![input("a", 1.0), doubled("b", "a"), doubled("c", "b")])
        .unwrap();

    // a direct write to a derived parameter sticks until an input changes
    store.set("b", 5.0).unwrap();
    assert_eq!(number(&store, "b"), 5.0);
    assert_eq!(number(&store, "c"), 10.0);

    store.set("a", 1.0).unwrap();
    assert_eq!(number(&store, "b"), 2.0);
    assert_eq!(number(&store, "c"), 4.0);
}

#[test]
fn test_raw_set_skips_cascade() {
    let store = ParameterStore::new();
    store.load(vec![input("a", 1.0), doubled("b", "a")]).unwrap();

    store.set_with("a", 3.0, SetOptions::raw()).unwrap();
    assert_eq!(number(&store, "b"), 0.0);

    store.set_with("a", 3.0, SetOptions::silent()).unwrap();
    assert_eq!(number(&store, "b"), 6.0);
}

#[test]
fn test_diamond_evaluated_per_branch() {
    // a feeds b and c, both feed d; d is recomputed once per branch in load
    // order, seeing the stale c the first time
    let seen = Arc::new(Mutex::new(Vec::new()));
    let record = seen.clone();

    let store = ParameterStore::new();
    store
        .load(vec![
            input("a", 1.0),
            doubled("b", "a"),
            derived("c", &["a"], |v| Ok(v[0] + 1.0)),
            derived("d", &["b", "c"], move |v| {
                record.lock().push((v[0], v[1]));
                Ok(v[0] * v[1])
            }),
        ])
        .unwrap();

    store.set("a", 3.0).unwrap();

    assert_eq!(*seen.lock(), vec![(6.0, 0.0), (6.0, 4.0)]);
    assert_eq!(number(&store, "d"), 24.0);
}

#[test]
fn test_cycle_hits_depth_limit() {
    let store = ParameterStore::new();
    store
        .load(vec![
            derived("x", &["y"], |v| Ok(v[0] + 1.0)),
            derived("y", &["x"], |v| Ok(v[0] + 1.0)),
        ])
        .unwrap();

    let err = store.set("x", 0.0).unwrap_err();
    assert!(matches!(err, StoreError::CascadeDepthExceeded { depth: 33, .. }));
}

#[test]
fn test_custom_depth_limit() {
    fn chain(store: &ParameterStore) {
        store
            .load(vec![
                input("p0", 0.0),
                doubled("p1", "p0"),
                doubled("p2", "p1"),
                doubled("p3", "p2"),
                doubled("p4", "p3"),
            ])
            .unwrap();
    }

    let shallow = ParameterStore::with_settings(StoreSettings {
        cascade_depth_limit: 3,
        ..StoreSettings::default()
    });
    chain(&shallow);
    assert!(matches!(
        shallow.set("p0", 1.0),
        Err(StoreError::CascadeDepthExceeded { ref name, depth: 4 }) if name == "p4"
    ));

    let deep = ParameterStore::with_settings(StoreSettings {
        cascade_depth_limit: 4,
        ..StoreSettings::default()
    });
    chain(&deep);
    deep.set("p0", 1.0).unwrap();
    assert_relative_eq!(number(&deep, "p4"), 16.0);
}

#[test]
fn test_dependents_in_load_order() {
    let store = ParameterStore::new();
    store
        .load(vec![
            input("a", 0.0),
            doubled("z", "a"),
            doubled("m", "a"),
            doubled("b", "m"),
        ])
        .unwrap();

    assert_eq!(
        store.dependents("a").unwrap(),
        vec!["z".to_string(), "m".to_string()]
    );
    assert!(store.dependents("b").unwrap().is_empty());
    assert!(matches!(
        store.dependents("missing"),
        Err(StoreError::NotFound { .. })
    ));
}
