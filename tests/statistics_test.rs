use std::sync::atomic::Ordering;

use cfkv::{DB, DBOptions, EngineKind, Statistics};

#[test]
fn test_statistics_basic_tracking() {
    let db = DB::open(DBOptions::default()).unwrap();
    let stats = db.statistics();
    let cf = db.default_cf();

    // Initially zero
    assert_eq!(stats.num_keys_written.load(Ordering::Relaxed), 0);
    assert_eq!(stats.num_keys_read.load(Ordering::Relaxed), 0);

    db.put_cf(&cf, b"key1", b"value1").unwrap();
    db.put_cf(&cf, b"key2", b"value2").unwrap();
    db.get_cf(&cf, b"key1").unwrap();
    db.get_cf(&cf, b"key3").unwrap();

    assert_eq!(stats.num_keys_written.load(Ordering::Relaxed), 2);
    assert_eq!(stats.num_keys_read.load(Ordering::Relaxed), 2);
    assert_eq!(stats.num_keys_not_found.load(Ordering::Relaxed), 1);

    let report = stats.report();
    assert!(report.contains("** Writes **"));
    assert!(report.contains("** Iteration **"));
}

#[test]
fn test_iteration_tracking() {
    for engine in [EngineKind::Versioned, EngineKind::Ordered] {
        let db = DB::open(DBOptions {
            engine,
            ..Default::default()
        })
        .unwrap();
        let stats = db.statistics();
        let cf = db.default_cf();
        for k in ["a", "b", "c"] {
            db.put_cf(&cf, k.as_bytes(), b"12").unwrap();
        }

        let mut iter = db.new_iterator(&cf).unwrap();
        assert_eq!(stats.open_iterators(), 1);

        iter.seek_to_cf_start();
        while iter.valid() {
            iter.value().unwrap();
            iter.next();
        }
        iter.close();

        assert_eq!(stats.open_iterators(), 0);
        assert_eq!(stats.num_seeks.load(Ordering::Relaxed), 1);
        assert_eq!(stats.num_steps.load(Ordering::Relaxed), 3);
        if engine == EngineKind::Versioned {
            assert_eq!(stats.num_value_fetches.load(Ordering::Relaxed), 3);
            assert_eq!(stats.bytes_fetched.load(Ordering::Relaxed), 6);
        }
    }
}

#[test]
fn test_statistics_reset() {
    let stats = Statistics::new();
    stats.record_write(1024);
    stats.record_read(false);
    stats.record_error();

    stats.reset();
    assert_eq!(stats.num_keys_written.load(Ordering::Relaxed), 0);
    assert_eq!(stats.num_keys_not_found.load(Ordering::Relaxed), 0);
    assert_eq!(stats.num_errors.load(Ordering::Relaxed), 0);
}
