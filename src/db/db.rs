use std::sync::Arc;

use bytes::Bytes;
use tracing::{debug, info};

use crate::{
    column_family::{ColumnFamilyHandle, ColumnFamilySet},
    db::DBOptions,
    engine::{
        Engine, EngineKind, IteratorOptions, Mutation, OrderedStore, RawVersionedItem, Txn,
        VersionedStore,
    },
    iterator::{CfIterator, OrderedCfIterator, VersionedCfIterator},
    statistics::Statistics,
    transaction::{WriteBatch, WriteOp},
    util::{Result, Status},
};

/// A set of column families multiplexed onto one engine instance
///
/// `DB` is an ordinary value: open as many as needed, each with its own
/// engine, and pass them around explicitly.
pub struct DB {
    /// Engine holding every column family's keys
    engine: Engine,
    /// Registered column families
    column_families: ColumnFamilySet,
    /// Options the database was opened with
    options: DBOptions,
    /// Database-wide statistics
    statistics: Arc<Statistics>,
}

impl DB {
    pub fn open(options: DBOptions) -> Result<Self> {
        let engine = match options.engine {
            EngineKind::Versioned => match &options.value_log_dir {
                Some(dir) => {
                    Engine::Versioned(VersionedStore::with_value_log(dir, options.value_threshold)?)
                },
                None => Engine::Versioned(VersionedStore::new()),
            },
            EngineKind::Ordered => Engine::Ordered(OrderedStore::new(options.verify_checksums)),
        };

        let column_families = ColumnFamilySet::open(&options.column_families)?;

        info!(
            engine = ?options.engine,
            column_families = column_families.count(),
            "opened database"
        );

        Ok(DB {
            engine,
            column_families,
            options,
            statistics: Arc::new(Statistics::new()),
        })
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn options(&self) -> &DBOptions {
        &self.options
    }

    pub fn statistics(&self) -> Arc<Statistics> {
        Arc::clone(&self.statistics)
    }

    /// Create a new column family
    pub fn create_column_family(&self, name: &str) -> Result<ColumnFamilyHandle> {
        self.column_families.create_cf(name)
    }

    /// Look up a column family by name
    pub fn cf(&self, name: &str) -> Option<ColumnFamilyHandle> {
        self.column_families.get_cf_by_name(name)
    }

    /// Get default column family handle
    pub fn default_cf(&self) -> ColumnFamilyHandle {
        self.column_families.default_cf()
    }

    pub fn list_column_families(&self) -> Vec<ColumnFamilyHandle> {
        self.column_families.list_column_families()
    }

    /// Reject handles that were not issued by this database
    fn check_cf(&self, cf: &ColumnFamilyHandle) -> Result<()> {
        if self.column_families.contains(cf) {
            Ok(())
        } else {
            Err(Status::invalid_argument(format!(
                "Column family '{}' not found",
                cf.name()
            )))
        }
    }

    /// Apply a write batch
    ///
    /// Atomic for the versioned engine: the batch commits under one
    /// sequence number. The ordered engine applies operations in order with
    /// no isolation from concurrent readers.
    pub fn write(&self, batch: &WriteBatch) -> Result<()> {
        for (cf, _) in batch.ops() {
            self.check_cf(cf)?;
        }
        if batch.is_empty() {
            return Ok(());
        }

        match &self.engine {
            Engine::Versioned(store) => {
                let mutations = batch
                    .ops()
                    .iter()
                    .map(|(cf, op)| {
                        let mutation = match op {
                            WriteOp::Put {
                                value, user_meta, ..
                            } => Mutation::Put {
                                value: Bytes::copy_from_slice(value),
                                user_meta: Bytes::copy_from_slice(user_meta),
                            },
                            WriteOp::Delete { .. } => Mutation::Delete,
                        };
                        (cf.prefix().encode(op.key()), mutation)
                    })
                    .collect();
                let sequence = store.commit(mutations).inspect_err(|_| {
                    self.statistics.record_error();
                })?;
                debug!(sequence, ops = batch.count(), "wrote batch");
            },
            Engine::Ordered(store) => {
                for (cf, op) in batch.ops() {
                    let physical = cf.prefix().encode(op.key());
                    match op {
                        WriteOp::Put { value, .. } => {
                            store.put(physical, Bytes::copy_from_slice(value))
                        },
                        WriteOp::Delete { .. } => store.delete(&physical),
                    }
                }
                debug!(ops = batch.count(), "wrote batch");
            },
        }

        for (_, op) in batch.ops() {
            match op {
                WriteOp::Put {
                    key,
                    value,
                    user_meta,
                } => self
                    .statistics
                    .record_write((key.len() + value.len() + user_meta.len()) as u64),
                WriteOp::Delete { .. } => self.statistics.record_delete(),
            }
        }
        self.statistics.record_batch();
        Ok(())
    }

    pub fn put_cf(&self, cf: &ColumnFamilyHandle, key: &[u8], value: &[u8]) -> Result<()> {
        let mut batch = WriteBatch::with_capacity(1);
        batch.put(cf, key, value);
        self.write(&batch)
    }

    pub fn delete_cf(&self, cf: &ColumnFamilyHandle, key: &[u8]) -> Result<()> {
        let mut batch = WriteBatch::with_capacity(1);
        batch.delete(cf, key);
        self.write(&batch)
    }

    /// Read the latest value of `key`; a tombstone reads as `None`
    pub fn get_cf(&self, cf: &ColumnFamilyHandle, key: &[u8]) -> Result<Option<Bytes>> {
        self.check_cf(cf)?;
        let physical = cf.prefix().encode(key);

        let value = match &self.engine {
            Engine::Versioned(store) => match store.read_txn().get(&physical) {
                Some(entry) if !entry.is_deleted() => {
                    Some(entry.value().inspect_err(|_| self.statistics.record_error())?)
                },
                _ => None,
            },
            Engine::Ordered(store) => store.get(&physical),
        };

        self.statistics.record_read(value.is_some());
        Ok(value)
    }

    /// Start a read-only transaction at the latest commit
    pub fn read_txn(&self) -> Result<Txn> {
        match &self.engine {
            Engine::Versioned(store) => Ok(store.read_txn()),
            Engine::Ordered(_) => Err(Status::not_supported(
                "ordered engine has no snapshots",
            )),
        }
    }

    /// Iterator over `cf` for whichever engine backs this database
    ///
    /// On the versioned engine the iterator reads at its own fresh snapshot.
    pub fn new_iterator(&self, cf: &ColumnFamilyHandle) -> Result<CfIterator> {
        self.check_cf(cf)?;
        let iter = match &self.engine {
            Engine::Versioned(store) => {
                let txn = store.read_txn();
                CfIterator::from(
                    VersionedCfIterator::new(cf, &txn, IteratorOptions::default())
                        .with_statistics(self.statistics()),
                )
            },
            Engine::Ordered(store) => CfIterator::from(
                OrderedCfIterator::new(cf, store).with_statistics(self.statistics()),
            ),
        };
        Ok(iter)
    }

    /// Versioned iterator over `cf` at the snapshot of `txn`
    ///
    /// `txn` must come from this database's [`read_txn`](Self::read_txn).
    pub fn new_versioned_iterator(
        &self,
        cf: &ColumnFamilyHandle,
        txn: &Txn,
        options: IteratorOptions,
    ) -> Result<VersionedCfIterator> {
        self.check_cf(cf)?;
        match &self.engine {
            Engine::Versioned(store) if !store.same_store(txn.store()) => Err(
                Status::invalid_argument("transaction belongs to another database"),
            ),
            Engine::Versioned(_) => {
                Ok(VersionedCfIterator::new(cf, txn, options).with_statistics(self.statistics()))
            },
            Engine::Ordered(_) => Err(Status::not_supported(
                "database is backed by the ordered engine",
            )),
        }
    }

    /// Bidirectional iterator over `cf`
    pub fn new_ordered_iterator(&self, cf: &ColumnFamilyHandle) -> Result<OrderedCfIterator> {
        self.check_cf(cf)?;
        match &self.engine {
            Engine::Ordered(store) => {
                Ok(OrderedCfIterator::new(cf, store).with_statistics(self.statistics()))
            },
            Engine::Versioned(_) => Err(Status::not_supported(
                "database is backed by the versioned engine",
            )),
        }
    }
}
