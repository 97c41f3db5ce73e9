use crate::column_family::CfPrefix;

/// Handle to a Column Family
///
/// A lightweight reference to a column family used in put/get/delete and
/// iterator construction. Carries the precomputed key prefix so that every
/// iterator bound to the family shares it.
///
/// # Example
///
/// ```ignore
/// use cfkv::{DB, DBOptions};
///
/// let db = DB::open(DBOptions::default())?;
/// let lock_cf = db.create_column_family("lock")?;
///
/// db.put_cf(&lock_cf, b"m", b"1")?;
/// let value = db.get_cf(&lock_cf, b"m")?;
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ColumnFamilyHandle {
    /// Internal ID of the column family
    pub(crate) id: u32,

    /// Name of the column family
    pub(crate) name: String,

    /// `name ++ '_'`
    pub(crate) prefix: CfPrefix,

    /// Token of the registry that issued the handle
    pub(crate) owner: u64,
}

impl ColumnFamilyHandle {
    pub(crate) fn new(id: u32, name: String) -> Self {
        let prefix = CfPrefix::new_unchecked(&name);
        ColumnFamilyHandle {
            id,
            name,
            prefix,
            owner: 0,
        }
    }

    pub(crate) fn with_owner(mut self, owner: u64) -> Self {
        self.owner = owner;
        self
    }

    /// Get the column family ID
    pub fn id(&self) -> u32 {
        self.id
    }

    /// Get the column family name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the physical key prefix of this column family
    pub fn prefix(&self) -> &CfPrefix {
        &self.prefix
    }
}
