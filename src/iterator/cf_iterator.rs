use bytes::Bytes;

use crate::{
    engine::EngineKind,
    iterator::{OrderedCfIterator, VersionedCfIterator},
    util::Result,
};

/// Column family iterator of whichever engine the database was opened with
///
/// The shared surface is the forward, family-scoped subset both engine
/// families support honestly. Version metadata, tombstones and reverse
/// movement are reached through [`as_versioned`](Self::as_versioned) and
/// [`as_ordered`](Self::as_ordered).
pub enum CfIterator {
    Versioned(VersionedCfIterator),
    Ordered(OrderedCfIterator),
}

impl CfIterator {
    pub fn kind(&self) -> EngineKind {
        match self {
            CfIterator::Versioned(_) => EngineKind::Versioned,
            CfIterator::Ordered(_) => EngineKind::Ordered,
        }
    }

    /// Positioned on a key of the column family?
    pub fn valid(&self) -> bool {
        match self {
            CfIterator::Versioned(it) => it.valid(),
            CfIterator::Ordered(it) => it.valid_in_cf(),
        }
    }

    /// Positioned on a key of the column family starting with `prefix`?
    pub fn valid_for_prefix(&self, prefix: &[u8]) -> bool {
        match self {
            CfIterator::Versioned(it) => it.valid_for_prefix(prefix),
            CfIterator::Ordered(it) => it.valid_for_prefix(prefix),
        }
    }

    pub fn seek(&mut self, key: &[u8]) {
        match self {
            CfIterator::Versioned(it) => it.seek(key),
            CfIterator::Ordered(it) => it.seek(key),
        }
    }

    /// Position at the first key of the column family
    pub fn seek_to_cf_start(&mut self) {
        match self {
            CfIterator::Versioned(it) => it.rewind(),
            CfIterator::Ordered(it) => it.seek_to_first(),
        }
    }

    pub fn next(&mut self) {
        match self {
            CfIterator::Versioned(it) => it.next(),
            CfIterator::Ordered(it) => it.next(),
        }
    }

    /// Logical key, `None` outside the column family
    pub fn key(&self) -> Option<&[u8]> {
        match self {
            CfIterator::Versioned(it) => it.item().map(|item| item.key()),
            CfIterator::Ordered(it) => it.valid_in_cf().then(|| it.key()),
        }
    }

    /// Value of the current key, `None` outside the column family
    ///
    /// For the versioned family a tombstone yields an empty value; check
    /// `as_versioned()` items to tell it from an empty put.
    pub fn value(&self) -> Result<Option<Bytes>> {
        match self {
            CfIterator::Versioned(it) => it.item().map(|item| item.value()).transpose(),
            CfIterator::Ordered(it) => {
                Ok(it.valid_in_cf().then(|| Bytes::copy_from_slice(it.value())))
            },
        }
    }

    /// Deferred engine failure; always `Ok` for the versioned family, whose
    /// failures surface from value fetches
    pub fn error(&self) -> Result<()> {
        match self {
            CfIterator::Versioned(_) => Ok(()),
            CfIterator::Ordered(it) => it.error(),
        }
    }

    pub fn close(&mut self) {
        match self {
            CfIterator::Versioned(it) => it.close(),
            CfIterator::Ordered(it) => it.close(),
        }
    }

    pub fn as_versioned(&self) -> Option<&VersionedCfIterator> {
        match self {
            CfIterator::Versioned(it) => Some(it),
            CfIterator::Ordered(_) => None,
        }
    }

    pub fn as_versioned_mut(&mut self) -> Option<&mut VersionedCfIterator> {
        match self {
            CfIterator::Versioned(it) => Some(it),
            CfIterator::Ordered(_) => None,
        }
    }

    pub fn as_ordered(&self) -> Option<&OrderedCfIterator> {
        match self {
            CfIterator::Ordered(it) => Some(it),
            CfIterator::Versioned(_) => None,
        }
    }

    pub fn as_ordered_mut(&mut self) -> Option<&mut OrderedCfIterator> {
        match self {
            CfIterator::Ordered(it) => Some(it),
            CfIterator::Versioned(_) => None,
        }
    }
}

impl From<VersionedCfIterator> for CfIterator {
    fn from(it: VersionedCfIterator) -> Self {
        CfIterator::Versioned(it)
    }
}

impl From<OrderedCfIterator> for CfIterator {
    fn from(it: OrderedCfIterator) -> Self {
        CfIterator::Ordered(it)
    }
}
