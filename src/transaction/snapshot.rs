use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

/// Snapshot provides a consistent point-in-time view of a versioned store
///
/// Reads through a snapshot see every commit with a sequence number up to and
/// including `sequence`, and nothing committed later.
#[derive(Clone)]
pub struct Snapshot {
    /// Sequence number at snapshot creation
    sequence: u64,
    /// Keeps the snapshot counted as active until the last clone drops
    _pin: Arc<SnapshotPin>,
}

/// Tracks snapshot lifetime against the owning store's active count
struct SnapshotPin {
    active: Arc<AtomicUsize>,
}

impl Snapshot {
    /// Create a new snapshot at `sequence`, counted in `active`
    pub(crate) fn new(sequence: u64, active: Arc<AtomicUsize>) -> Self {
        active.fetch_add(1, Ordering::Relaxed);
        Snapshot {
            sequence,
            _pin: Arc::new(SnapshotPin { active }),
        }
    }

    /// Get the snapshot's sequence number
    #[inline]
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Is a commit with sequence `seq` visible to this snapshot?
    #[inline]
    pub fn is_visible(&self, seq: u64) -> bool {
        seq <= self.sequence
    }
}

impl Drop for SnapshotPin {
    fn drop(&mut self) {
        self.active.fetch_sub(1, Ordering::Relaxed);
    }
}
