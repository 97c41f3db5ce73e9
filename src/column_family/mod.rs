/// Column Family module
///
/// Column families are independent logical keyspaces multiplexed onto one
/// flat, globally ordered engine. Each family owns the slice of the
/// physical keyspace starting with its prefix:
///
/// ```text
/// physical keyspace (sorted)
///  ├─→ default_a
///  ├─→ default_b
///  ├─→ default_c
///  ├─→ lock_m
///  └─→ write_k1
/// ```
///
/// # Usage
///
/// ```ignore
/// use cfkv::{DB, DBOptions};
///
/// let db = DB::open(DBOptions::default())?;
/// let lock_cf = db.create_column_family("lock")?;
///
/// db.put_cf(&lock_cf, b"m", b"1")?;
/// let mut iter = db.new_iterator(&lock_cf)?;
/// iter.seek_to_cf_start();
/// ```
pub mod column_family_handle;
pub mod column_family_set;
pub mod prefix;

pub use column_family_handle::ColumnFamilyHandle;
pub use column_family_set::ColumnFamilySet;
pub use prefix::{CF_SEPARATOR, CfPrefix, decode_key, encode_key, validate_cf_name};

/// Default column family name
pub const DEFAULT_COLUMN_FAMILY_NAME: &str = "default";
