#![no_main]

use std::collections::BTreeMap;

use cfkv::{DB, DBOptions, EngineKind};
use libfuzzer_sys::fuzz_target;

const FAMILIES: [&str; 3] = ["default", "lo", "lock"];

// Fuzz target for column family isolation.
// Applies a byte-driven stream of puts and deletes to an ordered database
// and checks every family scan against a model.
fuzz_target!(|data: &[u8]| {
    if data.len() > 4096 {
        return;
    }

    let db = DB::open(DBOptions {
        engine: EngineKind::Ordered,
        column_families: FAMILIES[1..].iter().map(|s| s.to_string()).collect(),
        ..Default::default()
    })
    .unwrap();
    let handles: Vec<_> = FAMILIES.iter().map(|name| db.cf(name).unwrap()).collect();
    let mut model: Vec<BTreeMap<Vec<u8>, Vec<u8>>> = vec![BTreeMap::new(); FAMILIES.len()];

    let mut i = 0;
    while i + 2 <= data.len() {
        let op = data[i];
        let key_len = (data[i + 1] % 8) as usize;
        i += 2;
        if i + key_len > data.len() {
            break;
        }
        let key = &data[i..i + key_len];
        i += key_len;

        let cf = op as usize % FAMILIES.len();
        if op & 0x80 == 0 {
            let value = vec![op; (op % 5) as usize];
            db.put_cf(&handles[cf], key, &value).unwrap();
            model[cf].insert(key.to_vec(), value);
        } else {
            db.delete_cf(&handles[cf], key).unwrap();
            model[cf].remove(key);
        }
    }

    for (cf, expected) in handles.iter().zip(&model) {
        let mut iter = db.new_ordered_iterator(cf).unwrap();
        let mut scanned = Vec::new();
        iter.seek_to_first();
        while iter.valid_in_cf() {
            scanned.push((iter.key().to_vec(), iter.value().to_vec()));
            iter.next();
        }
        iter.error().unwrap();
        let ordered: Vec<_> = expected
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        assert_eq!(scanned, ordered);

        for (key, value) in expected {
            assert_eq!(db.get_cf(cf, key).unwrap().as_deref(), Some(value.as_slice()));
        }
    }
});
