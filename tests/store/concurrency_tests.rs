//! Tests for concurrent access to one store

use crate::test_helpers::{doubled, input, number};
use rigparams_rs::store::ParameterStore;
use std::sync::Arc;
use std::thread;

const WRITERS: usize = 8;
const WRITES: usize = 200;

fn pairs() -> ParameterStore {
    let store = ParameterStore::new();
    let mut params = Vec::new();
    for i in 0..WRITERS {
        params.push(input(&format!("a{}", i), 0.0));
        params.push(doubled(&format!("b{}", i), &format!("a{}", i)));
    }
    params.push(input("shared", 0.0));
    params.push(doubled("shared_doubled", "shared"));
    store.load(params).unwrap();
    store
}

#[test]
fn test_parallel_writers_keep_cascades_consistent() {
    let store = Arc::new(pairs());

    let handles: Vec<_> = (0..WRITERS)
        .map(|i| {
            let store = store.clone();
            thread::spawn(move || {
                for n in 0..WRITES {
                    store.set(&format!("a{}", i), n as f64).unwrap();
                    store.set("shared", (i * WRITES + n) as f64).unwrap();
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    for i in 0..WRITERS {
        assert_eq!(number(&store, &format!("a{}", i)), (WRITES - 1) as f64);
        assert_eq!(number(&store, &format!("b{}", i)), 2.0 * (WRITES - 1) as f64);
    }
    assert_eq!(
        number(&store, "shared_doubled"),
        2.0 * number(&store, "shared")
    );
}

#[test]
fn test_readers_never_see_half_cascade() {
    let store = Arc::new(pairs());

    let writer = {
        let store = store.clone();
        thread::spawn(move || {
            for n in 1..=WRITES {
                store.set("shared", n as f64).unwrap();
            }
        })
    };

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let store = store.clone();
            thread::spawn(move || {
                for _ in 0..WRITES {
                    let (value, derived) = store.with_lock(|s| {
                        (number(s, "shared"), number(s, "shared_doubled"))
                    });
                    assert_eq!(derived, 2.0 * value);
                }
            })
        })
        .collect();

    writer.join().unwrap();
    for reader in readers {
        reader.join().unwrap();
    }
    assert_eq!(number(&store, "shared_doubled"), 2.0 * WRITES as f64);
}

#[test]
fn test_snapshot_of_parameters_is_consistent() {
    let store = Arc::new(pairs());

    let writer = {
        let store = store.clone();
        thread::spawn(move || {
            for n in 1..=WRITES {
                store.set("a0", n as f64).unwrap();
            }
        })
    };

    for _ in 0..WRITES {
        let params = store.get_parameters();
        let a = params.iter().find(|p| p.name() == "a0").unwrap();
        let b = params.iter().find(|p| p.name() == "b0").unwrap();
        assert_eq!(
            b.value().as_f64().unwrap(),
            2.0 * a.value().as_f64().unwrap()
        );
    }

    writer.join().unwrap();
}
