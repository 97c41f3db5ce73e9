use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use cfkv::{DB, DBOptions, EngineKind, WriteBatch};

const NUM_KEYS: usize = 10_000;
const FAMILIES: [&str; 3] = ["lock", "raft", "write"];

fn setup_db(engine: EngineKind) -> DB {
    let db = DB::open(DBOptions {
        engine,
        column_families: FAMILIES.iter().map(|s| s.to_string()).collect(),
        ..Default::default()
    })
    .unwrap();

    let value = vec![b'x'; 100];
    for name in FAMILIES {
        let cf = db.cf(name).unwrap();
        let mut batch = WriteBatch::with_capacity(NUM_KEYS);
        for i in 0..NUM_KEYS {
            batch.put(&cf, format!("key{i:010}").as_bytes(), &value);
        }
        db.write(&batch).unwrap();
    }
    db
}

fn bench_full_scan(c: &mut Criterion) {
    let mut group = c.benchmark_group("full_scan");
    group.throughput(Throughput::Elements(NUM_KEYS as u64));

    for engine in [EngineKind::Versioned, EngineKind::Ordered] {
        let db = setup_db(engine);
        let cf = db.cf("raft").unwrap();

        group.bench_with_input(BenchmarkId::from_parameter(format!("{engine:?}")), &cf, |b, cf| {
            b.iter(|| {
                let mut iter = db.new_iterator(cf).unwrap();
                iter.seek_to_cf_start();
                let mut n = 0;
                while iter.valid() {
                    black_box(iter.key());
                    n += 1;
                    iter.next();
                }
                assert_eq!(n, NUM_KEYS);
            });
        });
    }

    group.finish();
}

fn bench_seek(c: &mut Criterion) {
    let mut group = c.benchmark_group("seek");
    group.throughput(Throughput::Elements(1));

    for engine in [EngineKind::Versioned, EngineKind::Ordered] {
        let db = setup_db(engine);
        let cf = db.cf("lock").unwrap();

        group.bench_with_input(BenchmarkId::from_parameter(format!("{engine:?}")), &cf, |b, cf| {
            let mut iter = db.new_iterator(cf).unwrap();
            let mut i = 0usize;
            b.iter(|| {
                let key = format!("key{:010}", (i * 7919) % NUM_KEYS);
                iter.seek(key.as_bytes());
                black_box(iter.valid());
                i += 1;
            });
        });
    }

    group.finish();
}

fn bench_value_fetch(c: &mut Criterion) {
    let db = setup_db(EngineKind::Versioned);
    let cf = db.cf("write").unwrap();

    c.bench_function("value_copy_reuse", |b| {
        let txn = db.read_txn().unwrap();
        let mut iter = db
            .new_versioned_iterator(&cf, &txn, Default::default())
            .unwrap();
        let mut buf = Vec::new();
        b.iter(|| {
            iter.rewind();
            while let Some(item) = iter.item() {
                buf = item.value_copy(std::mem::take(&mut buf)).unwrap();
                black_box(&buf);
                iter.next();
            }
        });
    });
}

criterion_group!(benches, bench_full_scan, bench_seek, bench_value_fetch);
criterion_main!(benches);
