use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use bytes::Bytes;
use crossbeam_skiplist::SkipMap;

mod cursor;

pub use cursor::OrderedCursor;

/// Value plus the crc32 computed when it was written
#[derive(Debug, Clone)]
pub(crate) struct ChecksummedValue {
    data: Bytes,
    crc: u32,
}

impl ChecksummedValue {
    fn new(data: Bytes) -> Self {
        let crc = crc32fast::hash(&data);
        ChecksummedValue { data, crc }
    }

    #[inline]
    pub(crate) fn data(&self) -> &Bytes {
        &self.data
    }

    #[inline]
    pub(crate) fn verify(&self) -> bool {
        crc32fast::hash(&self.data) == self.crc
    }
}

pub(crate) struct OrderedInner {
    pub(crate) map: SkipMap<Vec<u8>, ChecksummedValue>,
    pub(crate) open_cursors: AtomicUsize,
    pub(crate) verify_checksums: bool,
}

/// Plain ordered key-value store
///
/// One value per key, no versions, no snapshots: a delete removes the key.
/// Cursors read the live map, so they observe concurrent writes.
///
/// Cloning is cheap and yields another handle to the same store.
#[derive(Clone)]
pub struct OrderedStore {
    inner: Arc<OrderedInner>,
}

impl OrderedStore {
    /// `verify_checksums` makes cursors check every value they land on and
    /// stop with a corruption status on mismatch
    pub fn new(verify_checksums: bool) -> Self {
        OrderedStore {
            inner: Arc::new(OrderedInner {
                map: SkipMap::new(),
                open_cursors: AtomicUsize::new(0),
                verify_checksums,
            }),
        }
    }

    pub fn put(&self, key: Vec<u8>, value: Bytes) {
        self.inner.map.insert(key, ChecksummedValue::new(value));
    }

    pub fn delete(&self, key: &[u8]) {
        self.inner.map.remove(key);
    }

    pub fn get(&self, key: &[u8]) -> Option<Bytes> {
        self.inner.map.get(key).map(|entry| entry.value().data().clone())
    }

    /// Open a cursor over the whole physical keyspace
    pub fn new_iterator(&self) -> OrderedCursor {
        OrderedCursor::new(Arc::clone(&self.inner))
    }

    /// Number of cursors not yet closed
    pub fn open_cursors(&self) -> usize {
        self.inner.open_cursors.load(Ordering::Relaxed)
    }

    pub fn len(&self) -> usize {
        self.inner.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.map.is_empty()
    }

    /// Replace the stored value of `key` without updating its checksum
    #[cfg(test)]
    pub(crate) fn corrupt(&self, key: &[u8], garbage: &[u8]) {
        if let Some(entry) = self.inner.map.get(key) {
            let crc = entry.value().crc;
            self.inner.map.insert(
                key.to_vec(),
                ChecksummedValue {
                    data: Bytes::copy_from_slice(garbage),
                    crc,
                },
            );
        }
    }
}

impl Default for OrderedStore {
    fn default() -> Self {
        Self::new(true)
    }
}
