//! Column family iterators
//!
//! Callers above this module see logical keys only. Each engine family gets
//! its own adapter and its own contract; there is no single fat interface
//! papering over the differences:
//!
//! ```text
//! VersionedStore ──→ SnapshotCursor ──→ VersionedCfIterator ─┐  DbIterator + DbItem
//!                                                           ├─→ CfIterator
//! OrderedStore ────→ OrderedCursor ───→ OrderedCfIterator ──┘  DbIter
//! ```
//!
//! # Scoping
//!
//! An adapter never hands the engine an upper bound. It seeks to
//! `prefix ++ key` and afterwards asks whether the physical key under the
//! cursor still carries the family prefix. The cursor itself roams the whole
//! physical keyspace; stepping past the family's last key lands on the next
//! family's first key, which the validity check rejects.
//!
//! ```ignore
//! let mut iter = VersionedCfIterator::new(&cf, &txn, IteratorOptions::default());
//! iter.seek(b"a");
//! while iter.valid() {
//!     let item = iter.item().unwrap();
//!     println!("{:?} = {:?}", item.key(), item.value()?);
//!     iter.next();
//! }
//! iter.close();
//! ```
//!
//! # Whole-keyspace repositioning
//!
//! `rewind_keyspace`, `seek_to_first_in_keyspace` and
//! `seek_to_last_in_keyspace` move to the extremes of the *entire* physical
//! keyspace, not of the family. They exist for compatibility; the family
//! scoped `rewind`, `seek_to_first` and `seek_to_last` are what callers
//! normally want.
use bytes::Bytes;

use crate::util::Result;

mod cf_iterator;
mod ordered;
mod versioned;

pub use cf_iterator::CfIterator;
pub use ordered::OrderedCfIterator;
pub use versioned::{CfItem, VersionedCfIterator};

/// Item capability of the versioned family
///
/// Items are views into iterator-owned state and live until the iterator
/// moves. Use the `*_copy` methods to keep data longer.
pub trait DbItem {
    /// Logical key of the item
    fn key(&self) -> &[u8];

    /// Copy the logical key into `dst`, reusing its allocation when the
    /// capacity suffices
    fn key_copy(&self, dst: Vec<u8>) -> Vec<u8>;

    /// Retrieve the value, which may require engine I/O
    fn value(&self) -> Result<Bytes>;

    /// Size of the value, without fetching it
    fn value_size(&self) -> usize;

    /// Copy the value into `dst`, reusing its allocation when the capacity
    /// suffices
    fn value_copy(&self, dst: Vec<u8>) -> Result<Vec<u8>>;
}

/// Version and tombstone metadata, only honest for multi-version engines
pub trait VersionedItem: DbItem {
    fn version(&self) -> u64;

    /// Is this item a deletion marker? Tombstones are surfaced, never
    /// filtered; the caller decides what they mean.
    fn is_deleted(&self) -> bool;

    /// Is the value empty?
    fn is_empty(&self) -> bool;

    fn estimated_size(&self) -> u64;

    fn user_meta(&self) -> &[u8];
}

/// Iterator capability of the versioned family
pub trait DbIterator {
    type Item<'a>: DbItem
    where
        Self: 'a;

    /// Current item, `None` unless [`valid`](Self::valid)
    fn item(&self) -> Option<Self::Item<'_>>;

    /// False once iteration leaves the column family
    fn valid(&self) -> bool;

    /// Advance by one. Always check `valid()` afterwards.
    fn next(&mut self);

    /// Position at `key` if present, otherwise at the next larger key
    fn seek(&mut self, key: &[u8]);

    fn close(&mut self);
}

/// Iterator capability of the ordered family
///
/// No item, version or tombstone members: the engine has none of those.
pub trait DbIter {
    fn key(&self) -> &[u8];

    fn value(&self) -> &[u8];

    /// Mirrors engine validity; after the loop, check the adapter's
    /// `error()` to tell exhaustion from failure
    fn valid(&self) -> bool;

    /// Move to the previous key. Always check `valid()` afterwards.
    fn prev(&mut self);

    /// Move to the next key. Always check `valid()` afterwards.
    fn next(&mut self);

    /// Position at `key` if present, otherwise at the next larger key
    fn seek(&mut self, key: &[u8]);

    fn close(&mut self);
}

/// Column family scoped positioning, shared by both families
pub trait PrefixScoped {
    /// Positioned inside the family on a key starting with `prefix`?
    fn valid_for_prefix(&self, prefix: &[u8]) -> bool;

    /// Position at the family's first key
    fn seek_to_cf_start(&mut self);
}

/// Copy `src` into `dst`; allocates only when `dst` is too small
#[inline]
pub(crate) fn copy_into(mut dst: Vec<u8>, src: &[u8]) -> Vec<u8> {
    dst.clear();
    dst.extend_from_slice(src);
    dst
}
