use crate::column_family::ColumnFamilyHandle;

/// Write operation type
///
/// Keys are logical keys; the column family prefix is applied when the batch
/// is written to the engine.
#[derive(Debug, Clone)]
pub enum WriteOp {
    Put {
        key: Vec<u8>,
        value: Vec<u8>,
        user_meta: Vec<u8>,
    },
    Delete {
        key: Vec<u8>,
    },
}

impl WriteOp {
    pub fn key(&self) -> &[u8] {
        match self {
            WriteOp::Put { key, .. } | WriteOp::Delete { key } => key,
        }
    }
}

/// WriteBatch accumulates multiple write operations for atomic execution
///
/// Operations apply in insertion order, so a later write to the same key in
/// the same column family wins.
pub struct WriteBatch {
    /// Operations in insertion order
    ops: Vec<(ColumnFamilyHandle, WriteOp)>,
    /// Approximate memory usage in bytes
    data_size: usize,
}

impl WriteBatch {
    /// Create a new empty WriteBatch
    #[inline]
    pub fn new() -> Self {
        WriteBatch {
            ops: Vec::new(),
            data_size: 0,
        }
    }

    /// Create WriteBatch with reserved capacity
    #[inline]
    pub fn with_capacity(capacity: usize) -> Self {
        WriteBatch {
            ops: Vec::with_capacity(capacity),
            data_size: 0,
        }
    }

    /// Add a Put operation to the batch
    pub fn put(&mut self, cf: &ColumnFamilyHandle, key: &[u8], value: &[u8]) {
        self.put_with_meta(cf, key, value, &[]);
    }

    /// Add a Put operation carrying opaque user metadata
    pub fn put_with_meta(
        &mut self,
        cf: &ColumnFamilyHandle,
        key: &[u8],
        value: &[u8],
        user_meta: &[u8],
    ) {
        self.data_size += key.len() + value.len() + user_meta.len();

        let op = WriteOp::Put {
            key: key.to_vec(),
            value: value.to_vec(),
            user_meta: user_meta.to_vec(),
        };

        self.ops.push((cf.clone(), op));
    }

    /// Add a Delete operation to the batch
    pub fn delete(&mut self, cf: &ColumnFamilyHandle, key: &[u8]) {
        self.data_size += key.len();

        let op = WriteOp::Delete { key: key.to_vec() };

        self.ops.push((cf.clone(), op));
    }

    /// Get all operations
    #[inline]
    pub fn ops(&self) -> &[(ColumnFamilyHandle, WriteOp)] {
        &self.ops
    }

    /// Number of operations in the batch
    #[inline]
    pub fn count(&self) -> usize {
        self.ops.len()
    }

    /// Clear all operations
    pub fn clear(&mut self) {
        self.ops.clear();
        self.data_size = 0;
    }

    /// Approximate memory usage in bytes
    #[inline]
    pub fn data_size(&self) -> usize {
        self.data_size
    }

    /// Check if batch is empty
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

impl Default for WriteBatch {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cf(id: u32, name: &str) -> ColumnFamilyHandle {
        ColumnFamilyHandle::new(id, name.to_string())
    }

    #[test]
    fn test_write_batch_basic() {
        let default_cf = cf(0, "default");
        let mut batch = WriteBatch::new();

        batch.put(&default_cf, b"key1", b"value1");
        batch.put(&default_cf, b"key2", b"value2");
        batch.delete(&default_cf, b"key3");

        assert_eq!(batch.count(), 3);
        assert_eq!(batch.data_size(), 4 + 6 + 4 + 6 + 4);
    }

    #[test]
    fn test_write_batch_keeps_insertion_order() {
        let default_cf = cf(0, "default");
        let lock_cf = cf(1, "lock");
        let mut batch = WriteBatch::new();

        batch.put(&default_cf, b"key1", b"value1");
        batch.put_with_meta(&lock_cf, b"key1", b"value2", b"\x01");
        batch.delete(&default_cf, b"key1");

        let ops = batch.ops();
        assert_eq!(ops.len(), 3);
        assert_eq!(ops[0].0.name(), "default");
        match &ops[1] {
            (handle, WriteOp::Put { value, user_meta, .. }) => {
                assert_eq!(handle.name(), "lock");
                assert_eq!(value, b"value2");
                assert_eq!(user_meta, b"\x01");
            },
            _ => panic!("Expected Put for lock CF"),
        }
        match &ops[2].1 {
            WriteOp::Delete { key } => assert_eq!(key, b"key1"),
            _ => panic!("Expected Delete operation"),
        }
    }

    #[test]
    fn test_write_batch_clear() {
        let default_cf = cf(0, "default");
        let mut batch = WriteBatch::new();

        batch.put(&default_cf, b"key1", b"value1");
        assert_eq!(batch.count(), 1);

        batch.clear();
        assert!(batch.is_empty());
        assert_eq!(batch.data_size(), 0);
        assert!(batch.ops().is_empty());
    }
}
