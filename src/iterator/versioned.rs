use std::{fmt, sync::Arc};

use bytes::Bytes;
use tracing::debug;

use crate::{
    column_family::{CfPrefix, ColumnFamilyHandle, decode_key},
    engine::{IteratorOptions, RawVersionedCursor, RawVersionedItem, SnapshotCursor, Txn},
    iterator::{DbItem, DbIterator, PrefixScoped, VersionedItem, copy_into},
    statistics::Statistics,
    util::Result,
};

/// Item of a column family, borrowed from its iterator
///
/// Wraps the engine item and strips the family prefix from its key. The
/// borrow ends when the iterator moves, which is exactly how long the
/// engine guarantees the underlying data.
pub struct CfItem<'a, I: RawVersionedItem> {
    item: &'a I,
    prefix_len: usize,
    statistics: Option<&'a Statistics>,
}

impl<'a, I: RawVersionedItem> CfItem<'a, I> {
    /// Logical key, valid for as long as the iterator is not moved
    pub fn key(&self) -> &'a [u8] {
        decode_key(self.item.key(), self.prefix_len)
    }

    pub fn key_copy(&self, dst: Vec<u8>) -> Vec<u8> {
        copy_into(dst, self.key())
    }

    /// Fetch the value; may read the engine's value log
    pub fn value(&self) -> Result<Bytes> {
        let result = self.item.value();
        if let Some(stats) = self.statistics {
            match &result {
                Ok(v) => stats.record_value_fetch(v.len() as u64),
                Err(_) => stats.record_error(),
            }
        }
        result
    }

    pub fn value_copy(&self, dst: Vec<u8>) -> Result<Vec<u8>> {
        let value = self.value()?;
        Ok(copy_into(dst, &value))
    }

    pub fn value_size(&self) -> usize {
        self.item.value_size()
    }

    pub fn version(&self) -> u64 {
        self.item.version()
    }

    pub fn is_deleted(&self) -> bool {
        self.item.is_deleted()
    }

    pub fn is_empty(&self) -> bool {
        self.item.value_size() == 0
    }

    pub fn estimated_size(&self) -> u64 {
        self.item.estimated_size()
    }

    pub fn user_meta(&self) -> &'a [u8] {
        self.item.user_meta()
    }
}

impl<I: RawVersionedItem> DbItem for CfItem<'_, I> {
    fn key(&self) -> &[u8] {
        CfItem::key(self)
    }

    fn key_copy(&self, dst: Vec<u8>) -> Vec<u8> {
        CfItem::key_copy(self, dst)
    }

    fn value(&self) -> Result<Bytes> {
        CfItem::value(self)
    }

    fn value_size(&self) -> usize {
        CfItem::value_size(self)
    }

    fn value_copy(&self, dst: Vec<u8>) -> Result<Vec<u8>> {
        CfItem::value_copy(self, dst)
    }
}

impl<I: RawVersionedItem> VersionedItem for CfItem<'_, I> {
    fn version(&self) -> u64 {
        CfItem::version(self)
    }

    fn is_deleted(&self) -> bool {
        CfItem::is_deleted(self)
    }

    fn is_empty(&self) -> bool {
        CfItem::is_empty(self)
    }

    fn estimated_size(&self) -> u64 {
        CfItem::estimated_size(self)
    }

    fn user_meta(&self) -> &[u8] {
        CfItem::user_meta(self)
    }
}

impl<I: RawVersionedItem> fmt::Display for CfItem<'_, I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "key={:?}, version={}, deleted={}, meta={:02x?}",
            String::from_utf8_lossy(self.key()),
            self.version(),
            self.is_deleted(),
            self.user_meta()
        )
    }
}

impl<I: RawVersionedItem> fmt::Debug for CfItem<'_, I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

/// Column family iterator over a versioned engine snapshot
///
/// Forward only. Surfaces every version the cursor yields, tombstones
/// included; with [`IteratorOptions::all_versions`] each visible version of
/// a key appears, newest first.
///
/// Releases its cursor and snapshot pin on [`close`](Self::close) or drop,
/// whichever comes first.
pub struct VersionedCfIterator<C: RawVersionedCursor = SnapshotCursor> {
    cursor: C,
    prefix: CfPrefix,
    /// Scratch buffer for `prefix ++ key` on seek
    seek_buf: Vec<u8>,
    statistics: Option<Arc<Statistics>>,
    closed: bool,
}

impl VersionedCfIterator<SnapshotCursor> {
    /// Iterate column family `cf` at the snapshot of `txn`
    pub fn new(cf: &ColumnFamilyHandle, txn: &Txn, options: IteratorOptions) -> Self {
        Self::with_cursor(cf.prefix().clone(), txn.new_iterator(options))
    }
}

impl<C: RawVersionedCursor> VersionedCfIterator<C> {
    /// Bind an already opened engine cursor to the family with `prefix`
    pub fn with_cursor(prefix: CfPrefix, cursor: C) -> Self {
        debug!(?prefix, "opened versioned cf iterator");
        VersionedCfIterator {
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

    /// Current item, `None` when not positioned inside the family
    pub fn item(&self) -> Option<CfItem<'_, C::Item>> {
        let item = self.cursor.item()?;
        if !self.prefix.covers(item.key()) {
            return None;
        }
        Some(CfItem {
            item,
            prefix_len: self.prefix.len(),
            statistics: self.statistics.as_deref(),
        })
    }

    /// True while the cursor sits on a key of this family
    pub fn valid(&self) -> bool {
        self.cursor
            .item()
            .is_some_and(|item| self.prefix.covers(item.key()))
    }

    /// True while the cursor sits on a key of this family starting with
    /// the logical `prefix`
    pub fn valid_for_prefix(&self, prefix: &[u8]) -> bool {
        self.cursor
            .item()
            .is_some_and(|item| self.prefix.covers_with(item.key(), prefix))
    }

    pub fn next(&mut self) {
        if let Some(stats) = &self.statistics {
            stats.record_step();
        }
        self.cursor.next();
    }

    /// Seek to `prefix ++ key` in the engine
    pub fn seek(&mut self, key: &[u8]) {
        if let Some(stats) = &self.statistics {
            stats.record_seek();
        }
        self.prefix.encode_into(key, &mut self.seek_buf);
        self.cursor.seek(&self.seek_buf);
    }

    /// Position at the first key of this family
    pub fn rewind(&mut self) {
        self.seek(&[]);
    }

    /// Position at the smallest key of the whole physical keyspace
    ///
    /// Unless this family happens to hold the smallest key, `valid()` is
    /// false afterwards. Prefer [`rewind`](Self::rewind).
    pub fn rewind_keyspace(&mut self) {
        if let Some(stats) = &self.statistics {
            stats.record_seek();
        }
        self.cursor.rewind();
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
        debug!(prefix = ?self.prefix, "closed versioned cf iterator");
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

impl<C: RawVersionedCursor> Drop for VersionedCfIterator<C> {
    fn drop(&mut self) {
        self.close();
    }
}

impl<C: RawVersionedCursor> DbIterator for VersionedCfIterator<C> {
    type Item<'a>
        = CfItem<'a, C::Item>
    where
        Self: 'a;

    fn item(&self) -> Option<CfItem<'_, C::Item>> {
        VersionedCfIterator::item(self)
    }

    fn valid(&self) -> bool {
        VersionedCfIterator::valid(self)
    }

    fn next(&mut self) {
        VersionedCfIterator::next(self)
    }

    fn seek(&mut self, key: &[u8]) {
        VersionedCfIterator::seek(self, key)
    }

    fn close(&mut self) {
        VersionedCfIterator::close(self)
    }
}

impl<C: RawVersionedCursor> PrefixScoped for VersionedCfIterator<C> {
    fn valid_for_prefix(&self, prefix: &[u8]) -> bool {
        VersionedCfIterator::valid_for_prefix(self, prefix)
    }

    fn seek_to_cf_start(&mut self) {
        self.rewind();
    }
}
