pub mod column_family;
pub mod db;
pub mod engine;
pub mod iterator;
pub mod statistics;
pub mod transaction;
pub mod util;

pub use column_family::{CfPrefix, ColumnFamilyHandle, DEFAULT_COLUMN_FAMILY_NAME};
pub use db::{DB, DBOptions};
pub use engine::{EngineKind, IteratorOptions};
pub use iterator::{
    CfItem, CfIterator, DbItem, DbIter, DbIterator, OrderedCfIterator, PrefixScoped,
    VersionedCfIterator, VersionedItem,
};
pub use statistics::Statistics;
pub use transaction::{Snapshot, WriteBatch};
pub use util::{Code, Result, Status};
