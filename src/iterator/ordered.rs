use std::sync::Arc;

use tracing::{debug, warn};

use crate::{
    column_family::{CfPrefix, ColumnFamilyHandle},
    engine::{OrderedCursor, OrderedStore, RawOrderedCursor},
    iterator::{DbIter, PrefixScoped},
    statistics::Statistics,
    util::Result,
};

/// Column family iterator over an ordered engine
///
/// Bidirectional, no versions, no tombstones. `valid()` mirrors the engine
/// cursor and says nothing about the family; use
/// [`valid_in_cf`](Self::valid_in_cf) or
/// [`valid_for_prefix`](Self::valid_for_prefix) to stop at the family
/// boundary.
///
/// Engine failures do not surface while iterating. The cursor just turns
/// invalid, so every loop must end with a call to [`error`](Self::error):
///
/// ```ignore
/// let mut iter = OrderedCfIterator::new(&cf, &store);
/// iter.seek_to_first();
/// while iter.valid_in_cf() {
///     handle(iter.key(), iter.value());
///     iter.next();
/// }
/// iter.error()?;
/// ```
pub struct OrderedCfIterator<C: RawOrderedCursor = OrderedCursor> {
    cursor: C,
    prefix: CfPrefix,
    /// Scratch buffer for physical seek targets
    seek_buf: Vec<u8>,
    statistics: Option<Arc<Statistics>>,
    closed: bool,
}

impl OrderedCfIterator<OrderedCursor> {
    /// Iterate column family `cf` of `store`
    pub fn new(cf: &ColumnFamilyHandle, store: &OrderedStore) -> Self {
        Self::with_cursor(cf.prefix().clone(), store.new_iterator())
    }
}

impl<C: RawOrderedCursor> OrderedCfIterator<C> {
    /// Bind an already opened engine cursor to the family with `prefix`
    pub fn with_cursor(prefix: CfPrefix, cursor: C) -> Self {
        debug!(?prefix, "opened ordered cf iterator");
        OrderedCfIterator {
            cursor,
            seek_buf: Vec::with_capacity(prefix.len() + 16),
            prefix,
            statistics: None,
            closed: false,
        }
    }

    pub(crate) fn with_statistics(mut self, statistics: Arc<Statistics>) -> Self {
        statistics.record_iterator_created();
        self.statistics = Some(statistics);
        self
    }

    pub fn prefix(&self) -> &CfPrefix {
        &self.prefix
    }

    /// Logical key under the cursor
    pub fn key(&self) -> &[u8] {
        self.prefix.decode(self.cursor.key())
    }

    /// Raw value under the cursor
    pub fn value(&self) -> &[u8] {
        self.cursor.value()
    }

    /// Engine validity only
    pub fn valid(&self) -> bool {
        self.cursor.valid()
    }

    /// Engine valid and positioned on a key of this family
    pub fn valid_in_cf(&self) -> bool {
        self.cursor.valid() && self.prefix.covers(self.cursor.key())
    }

    /// Positioned on a key of this family starting with the logical `prefix`
    pub fn valid_for_prefix(&self, prefix: &[u8]) -> bool {
        self.cursor.valid() && self.prefix.covers_with(self.cursor.key(), prefix)
    }

    pub fn next(&mut self) {
        self.record_step();
        self.cursor.next();
    }

    pub fn prev(&mut self) {
        self.record_step();
        self.cursor.prev();
    }

    /// Seek to `prefix ++ key` in the engine
    pub fn seek(&mut self, key: &[u8]) {
        self.record_seek();
        self.prefix.encode_into(key, &mut self.seek_buf);
        self.cursor.seek(&self.seek_buf);
    }

    /// Position at the first key of this family
    pub fn seek_to_first(&mut self) {
        self.seek(&[]);
    }

    /// Position at the last key of this family
    ///
    /// When the family is empty the cursor ends up on the closest key before
    /// it, if any; `valid_in_cf()` is false then.
    pub fn seek_to_last(&mut self) {
        self.record_seek();
        let bound = self.prefix.upper_bound();
        self.cursor.seek(&bound);
        if self.cursor.valid() {
            self.cursor.prev();
        } else if self.cursor.status().is_ok() {
            self.cursor.seek_to_last();
        }
    }

    /// Position at the smallest key of the whole physical keyspace
    ///
    /// The key found there usually belongs to another family. Prefer
    /// [`seek_to_first`](Self::seek_to_first).
    pub fn seek_to_first_in_keyspace(&mut self) {
        self.record_seek();
        self.cursor.seek_to_first();
    }

    /// Position at the largest key of the whole physical keyspace
    ///
    /// Prefer [`seek_to_last`](Self::seek_to_last).
    pub fn seek_to_last_in_keyspace(&mut self) {
        self.record_seek();
        self.cursor.seek_to_last();
    }

    /// Failure that stopped the iteration, if any
    ///
    /// `Ok` after the loop means the family was exhausted cleanly.
    pub fn error(&self) -> Result<()> {
        let status = self.cursor.status();
        if let Err(e) = &status {
            warn!(prefix = ?self.prefix, error = %e, "ordered cf iterator stopped by engine error");
            if let Some(stats) = &self.statistics {
                stats.record_error();
            }
        }
        status
    }

    /// Release the engine cursor; later calls do nothing
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        self.cursor.close();
        if let Some(stats) = &self.statistics {
            stats.record_iterator_closed();
        }
        debug!(prefix = ?self.prefix, "closed ordered cf iterator");
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    fn record_seek(&self) {
        if let Some(stats) = &self.statistics {
            stats.record_seek();
        }
    }

    fn record_step(&self) {
        if let Some(stats) = &self.statistics {
            stats.record_step();
        }
    }
}

impl<C: RawOrderedCursor> Drop for OrderedCfIterator<C> {
    fn drop(&mut self) {
        self.close();
    }
}

impl<C: RawOrderedCursor> DbIter for OrderedCfIterator<C> {
    fn key(&self) -> &[u8] {
        OrderedCfIterator::key(self)
    }

    fn value(&self) -> &[u8] {
        OrderedCfIterator::value(self)
    }

    fn valid(&self) -> bool {
        OrderedCfIterator::valid(self)
    }

    fn prev(&mut self) {
        OrderedCfIterator::prev(self)
    }

    fn next(&mut self) {
        OrderedCfIterator::next(self)
    }

    fn seek(&mut self, key: &[u8]) {
        OrderedCfIterator::seek(self, key)
    }

    fn close(&mut self) {
        OrderedCfIterator::close(self)
    }
}

impl<C: RawOrderedCursor> PrefixScoped for OrderedCfIterator<C> {
    fn valid_for_prefix(&self, prefix: &[u8]) -> bool {
        OrderedCfIterator::valid_for_prefix(self, prefix)
    }

    fn seek_to_cf_start(&mut self) {
        self.seek_to_first();
    }
}
