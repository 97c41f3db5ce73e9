use std::{
    ops::Bound,
    sync::{Arc, atomic::Ordering},
};

use bytes::Bytes;
use crossbeam_skiplist::map::Entry;
use tracing::{debug, warn};

use crate::{
    engine::{RawOrderedCursor, ordered::{ChecksummedValue, OrderedInner}},
    util::{Result, Status},
};

/// Bidirectional cursor over an [`OrderedStore`](super::OrderedStore)
///
/// The cursor copies the current key and value out of the skiplist and
/// re-enters it with a range query on every move. When checksum
/// verification is on, landing on a damaged value invalidates the cursor and
/// records a corruption status that only [`status`](RawOrderedCursor::status)
/// reports; every further move is a no-op.
pub struct OrderedCursor {
    store: Arc<OrderedInner>,
    current: Option<(Vec<u8>, Bytes)>,
    status: Result<()>,
    closed: bool,
}

impl OrderedCursor {
    pub(crate) fn new(store: Arc<OrderedInner>) -> Self {
        let open = store.open_cursors.fetch_add(1, Ordering::Relaxed) + 1;
        debug!(open, "opened ordered cursor");
        OrderedCursor {
            store,
            current: None,
            status: Ok(()),
            closed: false,
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    fn usable(&self) -> bool {
        !self.closed && self.status.is_ok()
    }

    fn land(&mut self, entry: Option<Entry<'_, Vec<u8>, ChecksummedValue>>) {
        self.current = None;
        let Some(entry) = entry else {
            return;
        };

        if self.store.verify_checksums && !entry.value().verify() {
            warn!(
                key = %String::from_utf8_lossy(entry.key()),
                "checksum mismatch in ordered store"
            );
            self.status = Err(Status::corruption(format!(
                "checksum mismatch at key {:?}",
                String::from_utf8_lossy(entry.key())
            )));
            return;
        }

        self.current = Some((entry.key().clone(), entry.value().data().clone()));
    }
}

impl RawOrderedCursor for OrderedCursor {
    fn valid(&self) -> bool {
        self.current.is_some()
    }

    fn key(&self) -> &[u8] {
        self.current.as_ref().map(|(k, _)| k.as_slice()).unwrap_or_default()
    }

    fn value(&self) -> &[u8] {
        self.current.as_ref().map(|(_, v)| v.as_ref()).unwrap_or_default()
    }

    fn next(&mut self) {
        let Some((key, _)) = self.current.take() else {
            return;
        };
        let store = Arc::clone(&self.store);
        let entry = store
            .map
            .range::<Vec<u8>, _>((Bound::Excluded(key), Bound::Unbounded))
            .next();
        self.land(entry);
    }

    fn prev(&mut self) {
        let Some((key, _)) = self.current.take() else {
            return;
        };
        let store = Arc::clone(&self.store);
        let entry = store.map.range::<Vec<u8>, _>(..key).next_back();
        self.land(entry);
    }

    fn seek(&mut self, key: &[u8]) {
        if !self.usable() {
            self.current = None;
            return;
        }
        let store = Arc::clone(&self.store);
        let entry = store.map.range::<[u8], _>((Bound::Included(key), Bound::Unbounded)).next();
        self.land(entry);
    }

    fn seek_to_first(&mut self) {
        if !self.usable() {
            self.current = None;
            return;
        }
        let store = Arc::clone(&self.store);
        let entry = store.map.front();
        self.land(entry);
    }

    fn seek_to_last(&mut self) {
        if !self.usable() {
            self.current = None;
            return;
        }
        let store = Arc::clone(&self.store);
        let entry = store.map.back();
        self.land(entry);
    }

    fn status(&self) -> Result<()> {
        self.status.clone()
    }

    fn close(&mut self) {
        if !self.closed {
            self.closed = true;
            self.current = None;
            let open = self.store.open_cursors.fetch_sub(1, Ordering::Relaxed) - 1;
            debug!(open, "closed ordered cursor");
        }
    }
}

impl Drop for OrderedCursor {
    fn drop(&mut self) {
        self.close();
    }
}
