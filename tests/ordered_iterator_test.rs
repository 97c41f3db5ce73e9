use std::{cell::Cell, rc::Rc};

use cfkv::{
    CfPrefix, DB, DbIter, DBOptions, EngineKind, OrderedCfIterator, Result, Status,
    engine::RawOrderedCursor,
};

/// Sorted in-memory cursor whose read of one position fails
struct FaultyCursor {
    entries: Vec<(Vec<u8>, Vec<u8>)>,
    pos: Option<usize>,
    fail_at: Option<usize>,
    status: Result<()>,
    closes: Rc<Cell<usize>>,
}

impl FaultyCursor {
    fn new(mut entries: Vec<(Vec<u8>, Vec<u8>)>, fail_at: Option<usize>) -> Self {
        entries.sort();
        FaultyCursor {
            entries,
            pos: None,
            fail_at,
            status: Ok(()),
            closes: Rc::new(Cell::new(0)),
        }
    }

    fn land(&mut self, pos: Option<usize>) {
        if self.status.is_err() {
            self.pos = None;
            return;
        }
        if pos.is_some() && pos == self.fail_at {
            self.pos = None;
            self.status = Err(Status::io_error("injected read failure"));
            return;
        }
        self.pos = pos;
    }
}

impl RawOrderedCursor for FaultyCursor {
    fn valid(&self) -> bool {
        self.pos.is_some()
    }

    fn key(&self) -> &[u8] {
        self.pos.map_or(&[][..], |i| self.entries[i].0.as_slice())
    }

    fn value(&self) -> &[u8] {
        self.pos.map_or(&[][..], |i| self.entries[i].1.as_slice())
    }

    fn next(&mut self) {
        let pos = self
            .pos
            .map(|i| i + 1)
            .filter(|&i| i < self.entries.len());
        self.land(pos);
    }

    fn prev(&mut self) {
        let pos = self.pos.and_then(|i| i.checked_sub(1));
        self.land(pos);
    }

    fn seek(&mut self, key: &[u8]) {
        let pos = self.entries.iter().position(|(k, _)| k.as_slice() >= key);
        self.land(pos);
    }

    fn seek_to_first(&mut self) {
        let pos = (!self.entries.is_empty()).then_some(0);
        self.land(pos);
    }

    fn seek_to_last(&mut self) {
        let pos = self.entries.len().checked_sub(1);
        self.land(pos);
    }

    fn status(&self) -> Result<()> {
        self.status.clone()
    }

    fn close(&mut self) {
        self.closes.set(self.closes.get() + 1);
    }
}

fn physical(cf: &str, key: &str, value: &str) -> (Vec<u8>, Vec<u8>) {
    (
        CfPrefix::new(cf).unwrap().encode(key.as_bytes()),
        value.as_bytes().to_vec(),
    )
}

fn rows() -> Vec<(Vec<u8>, Vec<u8>)> {
    vec![
        physical("default", "a", "1"),
        physical("default", "b", "2"),
        physical("default", "c", "3"),
        physical("lock", "m", "4"),
    ]
}

fn drain(iter: &mut OrderedCfIterator<FaultyCursor>) -> Vec<Vec<u8>> {
    let mut keys = Vec::new();
    iter.seek_to_first();
    while iter.valid_in_cf() {
        keys.push(iter.key().to_vec());
        iter.next();
    }
    keys
}

#[test]
fn test_clean_exhaustion_reports_ok() {
    let prefix = CfPrefix::new("default").unwrap();
    let mut iter = OrderedCfIterator::with_cursor(prefix, FaultyCursor::new(rows(), None));

    assert_eq!(drain(&mut iter), vec![b"a".to_vec(), b"b".to_vec(), b"c".to_vec()]);
    assert!(iter.error().is_ok());
}

#[test]
fn test_engine_fault_reported_by_error() {
    let prefix = CfPrefix::new("default").unwrap();
    // Sorted position 1 is default_b
    let mut iter = OrderedCfIterator::with_cursor(prefix, FaultyCursor::new(rows(), Some(1)));

    // Looks like a short scan until the caller asks
    assert_eq!(drain(&mut iter), vec![b"a".to_vec()]);
    assert!(!iter.valid());
    let err = iter.error().unwrap_err();
    assert!(err.is_io_error());
    assert_eq!(err.message(), Some("injected read failure"));
}

#[test]
fn test_drop_closes_cursor_once() {
    let prefix = CfPrefix::new("lock").unwrap();
    let cursor = FaultyCursor::new(rows(), None);
    let closes = Rc::clone(&cursor.closes);

    let mut iter = OrderedCfIterator::with_cursor(prefix, cursor);
    iter.seek(b"m");
    assert!(iter.valid_in_cf());
    assert_eq!(iter.value(), b"4");

    iter.close();
    drop(iter);
    assert_eq!(closes.get(), 1);
}

#[test]
fn test_dyn_iteration_through_trait() {
    let prefix = CfPrefix::new("default").unwrap();
    let mut iter = OrderedCfIterator::with_cursor(prefix, FaultyCursor::new(rows(), None));
    let dyn_iter: &mut dyn DbIter = &mut iter;

    dyn_iter.seek(b"b");
    assert_eq!(dyn_iter.key(), b"b");
    dyn_iter.prev();
    assert_eq!(dyn_iter.key(), b"a");
    dyn_iter.prev();
    assert!(!dyn_iter.valid());
}

fn open_ordered(column_families: &[&str]) -> DB {
    DB::open(DBOptions {
        engine: EngineKind::Ordered,
        column_families: column_families.iter().map(|s| s.to_string()).collect(),
        ..Default::default()
    })
    .unwrap()
}

#[test]
fn test_reverse_scan_through_db() {
    let db = open_ordered(&["lock", "write"]);
    let lock_cf = db.cf("lock").unwrap();
    let write_cf = db.cf("write").unwrap();
    let default_cf = db.default_cf();

    db.put_cf(&default_cf, b"z", b"d").unwrap();
    for k in ["k1", "k2", "k3"] {
        db.put_cf(&lock_cf, k.as_bytes(), b"l").unwrap();
    }
    db.put_cf(&write_cf, b"a", b"w").unwrap();

    let mut iter = db.new_ordered_iterator(&lock_cf).unwrap();
    iter.seek_to_last();
    let mut seen = Vec::new();
    while iter.valid_in_cf() {
        seen.push(iter.key().to_vec());
        iter.prev();
    }
    iter.error().unwrap();
    assert_eq!(seen, vec![b"k3".to_vec(), b"k2".to_vec(), b"k1".to_vec()]);

    // Backward past the family start lands on the previous family
    assert!(iter.valid());
    assert_eq!(iter.value(), b"d");
}

#[test]
fn test_delete_removes_from_scan() {
    let db = open_ordered(&[]);
    let cf = db.default_cf();
    for k in ["a", "b", "c"] {
        db.put_cf(&cf, k.as_bytes(), b"v").unwrap();
    }
    db.delete_cf(&cf, b"b").unwrap();

    let mut iter = db.new_iterator(&cf).unwrap();
    iter.seek_to_cf_start();
    let mut seen = Vec::new();
    while iter.valid() {
        seen.push(iter.key().unwrap().to_vec());
        iter.next();
    }
    iter.error().unwrap();
    assert_eq!(seen, vec![b"a".to_vec(), b"c".to_vec()]);
}

#[test]
fn test_keyspace_repositioning_leaves_family() {
    let db = open_ordered(&["lock"]);
    let default_cf = db.default_cf();
    let lock_cf = db.cf("lock").unwrap();
    db.put_cf(&default_cf, b"a", b"1").unwrap();
    db.put_cf(&lock_cf, b"m", b"2").unwrap();

    let mut iter = db.new_ordered_iterator(&lock_cf).unwrap();
    iter.seek_to_first_in_keyspace();
    assert!(iter.valid());
    assert!(!iter.valid_in_cf());

    iter.seek_to_first();
    assert!(iter.valid_in_cf());
    assert_eq!(iter.key(), b"m");
}
