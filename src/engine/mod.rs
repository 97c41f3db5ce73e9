//! Storage engine bindings
//!
//! The column family adapters never talk to a concrete engine directly; they
//! consume one of two minimal raw capabilities, one per engine family:
//!
//! ```text
//! versioned family                  ordered family
//! ─────────────────                 ──────────────
//! RawVersionedCursor                RawOrderedCursor
//!   └─→ RawVersionedItem              (key/value on the cursor)
//!       version, tombstone,           bidirectional movement,
//!       lazily fetched value          deferred status()
//! ```
//!
//! Both operate on *physical* keys over the engine's single global
//! keyspace. Prefixing and stripping is the adapters' job.
//!
//! Two reference engines ship with the crate: [`VersionedStore`], a
//! multi-version skiplist with snapshots and a value log, and
//! [`OrderedStore`], a plain ordered skiplist.
use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::util::Result;

pub mod ordered;
pub mod versioned;

pub use ordered::{OrderedCursor, OrderedStore};
pub use versioned::{
    IteratorOptions, Mutation, SnapshotCursor, Txn, VersionedEntry, VersionedStore,
};

/// One entry of a versioned engine, as seen through its cursor
pub trait RawVersionedItem {
    /// Physical key
    fn key(&self) -> &[u8];

    /// Commit sequence that wrote this version
    fn version(&self) -> u64;

    /// Is this version a deletion marker?
    fn is_deleted(&self) -> bool;

    /// Opaque metadata stored alongside the value
    fn user_meta(&self) -> &[u8];

    /// Size of the value, known without fetching it
    fn value_size(&self) -> usize;

    /// Approximate bytes this entry occupies in the engine
    fn estimated_size(&self) -> u64;

    /// Fetch the value, possibly performing I/O
    fn value(&self) -> Result<Bytes>;
}

/// Cursor over a versioned engine snapshot
///
/// Forward-only. `valid` reports whether the cursor sits on an entry at all;
/// it knows nothing about column families.
pub trait RawVersionedCursor {
    type Item: RawVersionedItem;

    /// Current entry, `None` when not positioned
    fn item(&self) -> Option<&Self::Item>;

    fn valid(&self) -> bool {
        self.item().is_some()
    }

    /// Positioned on an entry whose physical key starts with `prefix`?
    fn valid_for_prefix(&self, prefix: &[u8]) -> bool {
        self.item().is_some_and(|item| item.key().starts_with(prefix))
    }

    fn next(&mut self);

    /// Position at the first entry with physical key >= `key`
    fn seek(&mut self, key: &[u8]);

    /// Position at the smallest key of the whole keyspace
    fn rewind(&mut self);

    /// Release engine resources; safe to call more than once
    fn close(&mut self);
}

/// Cursor over an ordered engine without versions
pub trait RawOrderedCursor {
    fn valid(&self) -> bool;

    /// Physical key of the current entry; empty when not valid
    fn key(&self) -> &[u8];

    /// Value of the current entry; empty when not valid
    fn value(&self) -> &[u8];

    fn next(&mut self);

    fn prev(&mut self);

    /// Position at the first entry with physical key >= `key`
    fn seek(&mut self, key: &[u8]);

    /// Position at the smallest key of the whole keyspace
    fn seek_to_first(&mut self);

    /// Position at the largest key of the whole keyspace
    fn seek_to_last(&mut self);

    /// Deferred failure that stopped the cursor, if any
    ///
    /// An invalid cursor is either exhausted (`Ok`) or broken (`Err`); only
    /// this call tells the two apart.
    fn status(&self) -> Result<()>;

    /// Release engine resources; safe to call more than once
    fn close(&mut self);
}

/// Which engine family backs a database
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineKind {
    /// Multi-version items with tombstones and snapshots
    #[default]
    Versioned,
    /// Plain ordered keys with bidirectional cursors
    Ordered,
}

/// A configured engine instance
#[derive(Clone)]
pub enum Engine {
    Versioned(VersionedStore),
    Ordered(OrderedStore),
}

impl Engine {
    pub fn kind(&self) -> EngineKind {
        match self {
            Engine::Versioned(_) => EngineKind::Versioned,
            Engine::Ordered(_) => EngineKind::Ordered,
        }
    }

    /// Number of cursors not yet closed
    pub fn open_cursors(&self) -> usize {
        match self {
            Engine::Versioned(store) => store.open_cursors(),
            Engine::Ordered(store) => store.open_cursors(),
        }
    }
}
