use std::sync::atomic::{AtomicU64, Ordering};

/// Database-wide statistics
///
/// Thread-safe statistics tracking for writes, point reads and column family
/// iteration. Uses atomic counters for lock-free updates.
#[derive(Debug, Default)]
pub struct Statistics {
    // Writes
    pub num_keys_written: AtomicU64,
    pub num_keys_deleted: AtomicU64,
    pub bytes_written: AtomicU64,
    pub num_batches: AtomicU64,

    // Point reads
    pub num_keys_read: AtomicU64,
    pub num_keys_not_found: AtomicU64,

    // Iteration
    pub num_iterators_created: AtomicU64,
    pub num_iterators_closed: AtomicU64,
    pub num_seeks: AtomicU64,
    pub num_steps: AtomicU64,

    // Value fetches through items
    pub num_value_fetches: AtomicU64,
    pub bytes_fetched: AtomicU64,

    // Error counts
    pub num_errors: AtomicU64,
}

impl Statistics {
    pub fn new() -> Self {
        Statistics::default()
    }

    #[inline]
    pub fn record_write(&self, bytes: u64) {
        self.num_keys_written.fetch_add(1, Ordering::Relaxed);
        self.bytes_written.fetch_add(bytes, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_delete(&self) {
        self.num_keys_deleted.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_batch(&self) {
        self.num_batches.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_read(&self, found: bool) {
        self.num_keys_read.fetch_add(1, Ordering::Relaxed);
        if !found {
            self.num_keys_not_found.fetch_add(1, Ordering::Relaxed);
        }
    }

    #[inline]
    pub fn record_iterator_created(&self) {
        self.num_iterators_created.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_iterator_closed(&self) {
        self.num_iterators_closed.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_seek(&self) {
        self.num_seeks.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_step(&self) {
        self.num_steps.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_value_fetch(&self, bytes: u64) {
        self.num_value_fetches.fetch_add(1, Ordering::Relaxed);
        self.bytes_fetched.fetch_add(bytes, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_error(&self) {
        self.num_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Iterators created and not yet closed
    pub fn open_iterators(&self) -> u64 {
        let created = self.num_iterators_created.load(Ordering::Relaxed);
        let closed = self.num_iterators_closed.load(Ordering::Relaxed);
        created.saturating_sub(closed)
    }

    /// Reset all counters to zero
    pub fn reset(&self) {
        let counters = [
            &self.num_keys_written,
            &self.num_keys_deleted,
            &self.bytes_written,
            &self.num_batches,
            &self.num_keys_read,
            &self.num_keys_not_found,
            &self.num_iterators_created,
            &self.num_iterators_closed,
            &self.num_seeks,
            &self.num_steps,
            &self.num_value_fetches,
            &self.bytes_fetched,
            &self.num_errors,
        ];
        for counter in counters {
            counter.store(0, Ordering::Relaxed);
        }
    }

    /// Get formatted statistics report
    pub fn report(&self) -> String {
        let load = |c: &AtomicU64| c.load(Ordering::Relaxed);
        format!(
            "** Writes **\n\
             Keys written: {}\n\
             Keys deleted: {}\n\
             Bytes written: {}\n\
             Batches: {}\n\
             \n\
             ** Reads **\n\
             Keys read: {}\n\
             Not found: {}\n\
             \n\
             ** Iteration **\n\
             Iterators created: {}\n\
             Iterators closed: {}\n\
             Seeks: {}\n\
             Steps: {}\n\
             Value fetches: {}\n\
             Bytes fetched: {}\n\
             \n\
             ** Errors **\n\
             Errors: {}\n",
            load(&self.num_keys_written),
            load(&self.num_keys_deleted),
            load(&self.bytes_written),
            load(&self.num_batches),
            load(&self.num_keys_read),
            load(&self.num_keys_not_found),
            load(&self.num_iterators_created),
            load(&self.num_iterators_closed),
            load(&self.num_seeks),
            load(&self.num_steps),
            load(&self.num_value_fetches),
            load(&self.bytes_fetched),
            load(&self.num_errors),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_statistics_basic() {
        let stats = Statistics::new();

        stats.record_write(100);
        stats.record_write(200);
        stats.record_read(true);
        stats.record_read(false);
        stats.record_delete();

        assert_eq!(stats.num_keys_written.load(Ordering::Relaxed), 2);
        assert_eq!(stats.bytes_written.load(Ordering::Relaxed), 300);
        assert_eq!(stats.num_keys_read.load(Ordering::Relaxed), 2);
        assert_eq!(stats.num_keys_not_found.load(Ordering::Relaxed), 1);
        assert_eq!(stats.num_keys_deleted.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_open_iterators() {
        let stats = Statistics::new();
        stats.record_iterator_created();
        stats.record_iterator_created();
        stats.record_iterator_closed();
        assert_eq!(stats.open_iterators(), 1);
    }

    #[test]
    fn test_statistics_reset() {
        let stats = Statistics::new();
        stats.record_write(100);
        stats.record_seek();
        stats.record_error();

        stats.reset();

        assert_eq!(stats.num_keys_written.load(Ordering::Relaxed), 0);
        assert_eq!(stats.num_seeks.load(Ordering::Relaxed), 0);
        assert_eq!(stats.num_errors.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn test_statistics_report() {
        let stats = Statistics::new();
        stats.record_write(100);
        stats.record_step();

        let report = stats.report();
        assert!(report.contains("Keys written: 1"));
        assert!(report.contains("Steps: 1"));
    }
}
