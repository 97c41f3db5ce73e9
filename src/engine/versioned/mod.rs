use std::{
    cmp::Reverse,
    path::Path,
    sync::{
        Arc,
        atomic::{AtomicU64, AtomicUsize, Ordering},
    },
};

use bytes::Bytes;
use crossbeam_skiplist::SkipMap;
use parking_lot::Mutex;
use tracing::debug;

use crate::{transaction::Snapshot, util::Result};

mod cursor;
pub mod value_log;

pub use cursor::{SnapshotCursor, VersionedEntry};
pub use value_log::{VALUE_LOG_FILE_NAME, ValueLog, ValuePointer};

const VALUE_TYPE_DELETION: u8 = 0;
const VALUE_TYPE_VALUE: u8 = 1;

/// Skiplist key: physical key ascending, then sequence descending
///
/// The newest version of a key is met first when scanning forward, so a seek
/// to `(key, u64::MAX)` lands on the newest version and skipping versions
/// newer than a snapshot is a forward walk.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) struct InternalKey {
    user_key: Vec<u8>,
    sequence: Reverse<u64>,
}

impl InternalKey {
    pub(crate) fn new(user_key: Vec<u8>, sequence: u64) -> Self {
        InternalKey {
            user_key,
            sequence: Reverse(sequence),
        }
    }

    #[inline]
    pub(crate) fn user_key(&self) -> &[u8] {
        &self.user_key
    }

    #[inline]
    pub(crate) fn sequence(&self) -> u64 {
        self.sequence.0
    }
}

/// Where a value lives
#[derive(Debug, Clone)]
pub(crate) enum ValueRef {
    Inline(Bytes),
    Log(ValuePointer),
}

#[derive(Debug, Clone)]
pub(crate) struct StoredValue {
    value_type: u8,
    value: ValueRef,
    user_meta: Bytes,
}

impl StoredValue {
    #[inline]
    pub(crate) fn is_deletion(&self) -> bool {
        self.value_type == VALUE_TYPE_DELETION
    }
}

/// A single write applied by [`VersionedStore::commit`]
#[derive(Debug, Clone)]
pub enum Mutation {
    Put { value: Bytes, user_meta: Bytes },
    Delete,
}

/// Options for a snapshot cursor
#[derive(Debug, Clone, Copy, Default)]
pub struct IteratorOptions {
    /// Yield every version visible to the snapshot, newest first, instead of
    /// only the newest one per key
    pub all_versions: bool,
}

pub(crate) struct StoreInner {
    pub(crate) map: SkipMap<InternalKey, StoredValue>,
    pub(crate) value_log: Option<Arc<ValueLog>>,
    pub(crate) open_cursors: Arc<AtomicUsize>,
    value_threshold: usize,
    last_sequence: AtomicU64,
    commit_lock: Mutex<()>,
    active_snapshots: Arc<AtomicUsize>,
    approximate_memory: AtomicUsize,
}

/// Multi-version ordered store
///
/// Every commit gets one sequence number; each key keeps all of its versions,
/// deletes included, as there is no compaction. Values at or above the value
/// threshold go to a [`ValueLog`] when one is configured and are fetched
/// lazily by readers.
///
/// Cloning is cheap and yields another handle to the same store.
#[derive(Clone)]
pub struct VersionedStore {
    inner: Arc<StoreInner>,
}

impl VersionedStore {
    /// In-memory store; every value is kept inline
    pub fn new() -> Self {
        Self::build(None, usize::MAX)
    }

    /// Store with values of at least `value_threshold` bytes kept in a value
    /// log under `dir`
    pub fn with_value_log(dir: &Path, value_threshold: usize) -> Result<Self> {
        let value_log = ValueLog::create(dir)?;
        Ok(Self::build(Some(Arc::new(value_log)), value_threshold))
    }

    fn build(value_log: Option<Arc<ValueLog>>, value_threshold: usize) -> Self {
        VersionedStore {
            inner: Arc::new(StoreInner {
                map: SkipMap::new(),
                value_log,
                open_cursors: Arc::new(AtomicUsize::new(0)),
                value_threshold,
                last_sequence: AtomicU64::new(0),
                commit_lock: Mutex::new(()),
                active_snapshots: Arc::new(AtomicUsize::new(0)),
                approximate_memory: AtomicUsize::new(0),
            }),
        }
    }

    /// Apply `mutations` atomically under one new sequence number
    ///
    /// Readers observe either none or all of the batch: the sequence is
    /// published only after every entry is in the skiplist. Returns the
    /// commit sequence.
    pub fn commit(&self, mutations: Vec<(Vec<u8>, Mutation)>) -> Result<u64> {
        let _guard = self.inner.commit_lock.lock();
        let last = self.inner.last_sequence.load(Ordering::Acquire);
        if mutations.is_empty() {
            return Ok(last);
        }
        let sequence = last + 1;

        // Resolve value log writes first so a failure leaves no entries
        // behind at an unpublished sequence.
        let mut entries = Vec::with_capacity(mutations.len());
        for (key, mutation) in mutations {
            let stored = match mutation {
                Mutation::Put { value, user_meta } => StoredValue {
                    value_type: VALUE_TYPE_VALUE,
                    value: self.place_value(value)?,
                    user_meta,
                },
                Mutation::Delete => StoredValue {
                    value_type: VALUE_TYPE_DELETION,
                    value: ValueRef::Inline(Bytes::new()),
                    user_meta: Bytes::new(),
                },
            };
            entries.push((InternalKey::new(key, sequence), stored));
        }

        let count = entries.len();
        for (key, stored) in entries {
            let inline_len = match &stored.value {
                ValueRef::Inline(v) => v.len(),
                ValueRef::Log(_) => ValuePointer::ENCODED_SIZE,
            };
            self.inner.approximate_memory.fetch_add(
                key.user_key().len() + inline_len + stored.user_meta.len(),
                Ordering::Relaxed,
            );
            self.inner.map.insert(key, stored);
        }

        self.inner.last_sequence.store(sequence, Ordering::Release);
        debug!(sequence, count, "committed batch");
        Ok(sequence)
    }

    fn place_value(&self, value: Bytes) -> Result<ValueRef> {
        match &self.inner.value_log {
            Some(vlog) if value.len() >= self.inner.value_threshold => {
                Ok(ValueRef::Log(vlog.append(&value)?))
            },
            _ => Ok(ValueRef::Inline(value)),
        }
    }

    /// Start a read-only transaction pinned at the latest committed sequence
    pub fn read_txn(&self) -> Txn {
        let sequence = self.inner.last_sequence.load(Ordering::Acquire);
        Txn {
            store: self.clone(),
            snapshot: Snapshot::new(sequence, Arc::clone(&self.inner.active_snapshots)),
        }
    }

    /// Sequence number of the latest commit
    pub fn last_sequence(&self) -> u64 {
        self.inner.last_sequence.load(Ordering::Acquire)
    }

    /// Number of snapshots (transactions and cursors) not yet released
    pub fn active_snapshots(&self) -> usize {
        self.inner.active_snapshots.load(Ordering::Relaxed)
    }

    /// Number of cursors not yet closed
    pub fn open_cursors(&self) -> usize {
        self.inner.open_cursors.load(Ordering::Relaxed)
    }

    /// Number of stored versions, tombstones included
    pub fn num_versions(&self) -> usize {
        self.inner.map.len()
    }

    pub fn approximate_memory_usage(&self) -> usize {
        self.inner.approximate_memory.load(Ordering::Relaxed)
    }

    pub fn value_log(&self) -> Option<&ValueLog> {
        self.inner.value_log.as_deref()
    }

    /// Do `self` and `other` refer to the same underlying store?
    pub fn same_store(&self, other: &VersionedStore) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Default for VersionedStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Read-only transaction: a store handle plus a pinned snapshot
///
/// Iterators created from a transaction all read at the same snapshot. The
/// pin is released when the transaction and every cursor created from it are
/// gone.
pub struct Txn {
    store: VersionedStore,
    snapshot: Snapshot,
}

impl Txn {
    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    /// Store this transaction reads from
    pub fn store(&self) -> &VersionedStore {
        &self.store
    }

    /// Open a raw cursor over the whole physical keyspace at this snapshot
    pub fn new_iterator(&self, options: IteratorOptions) -> SnapshotCursor {
        SnapshotCursor::new(
            Arc::clone(&self.store.inner),
            self.snapshot.clone(),
            options,
        )
    }

    /// Newest version of the physical `key` visible to this snapshot
    ///
    /// Tombstones are returned as such; the caller decides what a delete
    /// means.
    pub fn get(&self, key: &[u8]) -> Option<VersionedEntry> {
        let start = InternalKey::new(key.to_vec(), self.snapshot.sequence());
        let entry = self.store.inner.map.range(start..).next()?;
        if entry.key().user_key() != key {
            return None;
        }
        Some(VersionedEntry::from_stored(
            entry.key(),
            entry.value(),
            self.store.inner.value_log.as_ref(),
        ))
    }
}
