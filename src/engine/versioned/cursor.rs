use std::{
    fmt,
    ops::Bound,
    sync::{Arc, atomic::Ordering},
};

use bytes::Bytes;
use tracing::debug;

use crate::{
    engine::{
        RawVersionedCursor, RawVersionedItem,
        versioned::{
            InternalKey, IteratorOptions, StoreInner, StoredValue, ValueLog, ValuePointer,
            ValueRef,
        },
    },
    transaction::Snapshot,
    util::{Result, Status},
};

/// One version of a key as surfaced by a [`SnapshotCursor`]
///
/// The key and metadata are copied out of the skiplist when the cursor
/// moves; the value is fetched from the value log only when asked for.
#[derive(Clone)]
pub struct VersionedEntry {
    key: Vec<u8>,
    version: u64,
    stored: StoredValue,
    value_log: Option<Arc<ValueLog>>,
}

impl VersionedEntry {
    pub(crate) fn from_stored(
        key: &InternalKey,
        stored: &StoredValue,
        value_log: Option<&Arc<ValueLog>>,
    ) -> Self {
        VersionedEntry {
            key: key.user_key().to_vec(),
            version: key.sequence(),
            stored: stored.clone(),
            value_log: value_log.cloned(),
        }
    }
}

impl RawVersionedItem for VersionedEntry {
    fn key(&self) -> &[u8] {
        &self.key
    }

    fn version(&self) -> u64 {
        self.version
    }

    fn is_deleted(&self) -> bool {
        self.stored.is_deletion()
    }

    fn user_meta(&self) -> &[u8] {
        &self.stored.user_meta
    }

    fn value_size(&self) -> usize {
        match &self.stored.value {
            ValueRef::Inline(v) => v.len(),
            ValueRef::Log(ptr) => ptr.len as usize,
        }
    }

    fn estimated_size(&self) -> u64 {
        let value_len = match &self.stored.value {
            ValueRef::Inline(v) => v.len(),
            ValueRef::Log(_) => ValuePointer::ENCODED_SIZE,
        };
        (self.key.len() + value_len + self.stored.user_meta.len()) as u64
    }

    fn value(&self) -> Result<Bytes> {
        match &self.stored.value {
            ValueRef::Inline(v) => Ok(v.clone()),
            ValueRef::Log(ptr) => match &self.value_log {
                Some(vlog) => vlog.read(*ptr),
                None => Err(Status::corruption("value pointer without a value log")),
            },
        }
    }
}

impl fmt::Debug for VersionedEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VersionedEntry")
            .field("key", &String::from_utf8_lossy(&self.key))
            .field("version", &self.version)
            .field("deleted", &self.is_deleted())
            .field("value_size", &self.value_size())
            .finish()
    }
}

/// Forward cursor over a versioned store at one snapshot
///
/// Walks the whole physical keyspace. Versions newer than the snapshot are
/// skipped; with default options only the newest visible version of each key
/// is surfaced, tombstones included.
///
/// # Implementation Notes
///
/// crossbeam_skiplist entries cannot be held across calls without borrowing
/// the map, so the cursor keeps a copy of the current entry and re-enters the
/// skiplist with a range query on every move.
pub struct SnapshotCursor {
    store: Arc<StoreInner>,
    /// `None` once closed
    snapshot: Option<Snapshot>,
    options: IteratorOptions,
    current: Option<VersionedEntry>,
}

impl SnapshotCursor {
    pub(crate) fn new(store: Arc<StoreInner>, snapshot: Snapshot, options: IteratorOptions) -> Self {
        let open = store.open_cursors.fetch_add(1, Ordering::Relaxed) + 1;
        debug!(
            sequence = snapshot.sequence(),
            all_versions = options.all_versions,
            open,
            "opened snapshot cursor"
        );
        SnapshotCursor {
            store,
            snapshot: Some(snapshot),
            options,
            current: None,
        }
    }

    pub fn is_closed(&self) -> bool {
        self.snapshot.is_none()
    }

    /// Land on the first visible entry at or after `start`
    fn position_from(&mut self, start: Bound<InternalKey>) {
        self.current = None;
        let Some(snapshot) = &self.snapshot else {
            return;
        };

        for entry in self.store.map.range((start, Bound::Unbounded)) {
            if !snapshot.is_visible(entry.key().sequence()) {
                continue;
            }
            self.current = Some(VersionedEntry::from_stored(
                entry.key(),
                entry.value(),
                self.store.value_log.as_ref(),
            ));
            return;
        }
    }
}

impl RawVersionedCursor for SnapshotCursor {
    type Item = VersionedEntry;

    fn item(&self) -> Option<&VersionedEntry> {
        self.current.as_ref()
    }

    fn next(&mut self) {
        let Some(current) = self.current.take() else {
            return;
        };

        // Sequence 0 is never assigned, so (key, 0) sorts after every
        // version of key.
        let after = if self.options.all_versions {
            InternalKey::new(current.key, current.version)
        } else {
            InternalKey::new(current.key, 0)
        };
        self.position_from(Bound::Excluded(after));
    }

    fn seek(&mut self, key: &[u8]) {
        self.position_from(Bound::Included(InternalKey::new(key.to_vec(), u64::MAX)));
    }

    fn rewind(&mut self) {
        self.position_from(Bound::Unbounded);
    }

    fn close(&mut self) {
        if let Some(snapshot) = self.snapshot.take() {
            self.current = None;
            let open = self.store.open_cursors.fetch_sub(1, Ordering::Relaxed) - 1;
            debug!(sequence = snapshot.sequence(), open, "closed snapshot cursor");
        }
    }
}

impl Drop for SnapshotCursor {
    fn drop(&mut self) {
        self.close();
    }
}
