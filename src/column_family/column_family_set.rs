use std::{
    collections::HashMap,
    sync::atomic::{AtomicU64, Ordering},
};

use parking_lot::RwLock;
use tracing::info;

use crate::{
    column_family::{ColumnFamilyHandle, DEFAULT_COLUMN_FAMILY_NAME, prefix::validate_cf_name},
    util::{Result, Status},
};

/// Registry of the column families sharing one physical engine
///
/// Column families here are pure naming: all of them live in the same
/// ordered keyspace and are told apart only by their key prefix. The set
/// guarantees names are valid for the prefix codec and unique.
///
/// # Lifecycle
///
/// ```text
/// DB Open → Create ColumnFamilySet → Register "default" (ID 0)
///         ↓
/// User creates more CFs → Validate name → Add to map
/// ```
///
/// Every set carries a process-unique token stamped into the handles it
/// issues, so a handle from one set is never mistaken for one of another.
pub struct ColumnFamilySet {
    /// Token stamped into every issued handle
    token: u64,

    /// Map of CF name → handle
    column_families: RwLock<HashMap<String, ColumnFamilyHandle>>,

    /// Next CF ID to allocate
    next_id: RwLock<u32>,
}

impl ColumnFamilySet {
    /// Create a new ColumnFamilySet holding only the default CF
    pub fn new() -> Self {
        static NEXT_TOKEN: AtomicU64 = AtomicU64::new(1);
        let token = NEXT_TOKEN.fetch_add(1, Ordering::Relaxed);

        let mut cfs = HashMap::new();
        cfs.insert(
            DEFAULT_COLUMN_FAMILY_NAME.to_string(),
            ColumnFamilyHandle::new(0, DEFAULT_COLUMN_FAMILY_NAME.to_string()).with_owner(token),
        );

        ColumnFamilySet {
            token,
            column_families: RwLock::new(cfs),
            next_id: RwLock::new(1),
        }
    }

    /// Open a ColumnFamilySet with the default CF plus `names`
    ///
    /// Listing "default" again is allowed; any other repeated name is an error.
    pub fn open<S: AsRef<str>>(names: &[S]) -> Result<Self> {
        let set = Self::new();
        for name in names {
            let name = name.as_ref();
            if name == DEFAULT_COLUMN_FAMILY_NAME {
                continue;
            }
            set.create_cf(name)?;
        }
        Ok(set)
    }

    /// Was `handle` issued by this set and is its family still registered?
    pub fn contains(&self, handle: &ColumnFamilyHandle) -> bool {
        handle.owner == self.token
            && self
                .column_families
                .read()
                .get(handle.name())
                .is_some_and(|registered| registered.id() == handle.id())
    }

    /// Get default column family
    pub fn default_cf(&self) -> ColumnFamilyHandle {
        ColumnFamilyHandle::new(0, DEFAULT_COLUMN_FAMILY_NAME.to_string()).with_owner(self.token)
    }

    /// Get column family by name
    pub fn get_cf_by_name(&self, name: &str) -> Option<ColumnFamilyHandle> {
        self.column_families.read().get(name).cloned()
    }

    /// Create a new column family
    pub fn create_cf(&self, name: &str) -> Result<ColumnFamilyHandle> {
        validate_cf_name(name)?;

        let mut cfs = self.column_families.write();
        if cfs.contains_key(name) {
            return Err(Status::invalid_argument(format!(
                "Column family '{name}' already exists"
            )));
        }

        let mut next_id = self.next_id.write();
        let handle = ColumnFamilyHandle::new(*next_id, name.to_string()).with_owner(self.token);
        *next_id += 1;

        cfs.insert(name.to_string(), handle.clone());
        info!(cf = name, id = handle.id(), "created column family");
        Ok(handle)
    }

    /// List all column families, ordered by ID
    pub fn list_column_families(&self) -> Vec<ColumnFamilyHandle> {
        let mut handles: Vec<_> = self.column_families.read().values().cloned().collect();
        handles.sort_by_key(|h| h.id());
        handles
    }

    /// Number of column families
    pub fn count(&self) -> usize {
        self.column_families.read().len()
    }
}

impl Default for ColumnFamilySet {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_family_set_creation() {
        let cf_set = ColumnFamilySet::new();

        assert_eq!(cf_set.count(), 1);

        let default_cf = cf_set.default_cf();
        assert_eq!(default_cf.id(), 0);
        assert_eq!(default_cf.name(), "default");
        assert_eq!(default_cf.prefix().as_bytes(), b"default_");
    }

    #[test]
    fn test_create_cf() {
        let cf_set = ColumnFamilySet::new();

        let handle = cf_set.create_cf("lock").unwrap();
        assert_eq!(handle.id(), 1);
        assert_eq!(handle.name(), "lock");
        assert_eq!(cf_set.count(), 2);

        let found = cf_set.get_cf_by_name("lock").unwrap();
        assert_eq!(found, handle);
    }

    #[test]
    fn test_create_duplicate_cf() {
        let cf_set = ColumnFamilySet::new();

        cf_set.create_cf("write").unwrap();
        let result = cf_set.create_cf("write");
        assert!(result.unwrap_err().is_invalid_argument());
        assert!(cf_set.create_cf("default").is_err());
    }

    #[test]
    fn test_create_cf_with_separator_fails() {
        let cf_set = ColumnFamilySet::new();

        assert!(cf_set.create_cf("raft_state").is_err());
        assert!(cf_set.create_cf("").is_err());
        assert_eq!(cf_set.count(), 1);
    }

    #[test]
    fn test_list_column_families() {
        let cf_set = ColumnFamilySet::open(&["default", "write", "lock"]).unwrap();

        let names: Vec<String> = cf_set
            .list_column_families()
            .iter()
            .map(|h| h.name().to_string())
            .collect();
        assert_eq!(names, vec!["default", "write", "lock"]);
    }

    #[test]
    fn test_contains_only_own_handles() {
        let cf_set = ColumnFamilySet::open(&["lock"]).unwrap();
        let other = ColumnFamilySet::open(&["lock"]).unwrap();

        assert!(cf_set.contains(&cf_set.default_cf()));
        assert!(cf_set.contains(&cf_set.get_cf_by_name("lock").unwrap()));
        assert!(!cf_set.contains(&other.default_cf()));
        assert!(!cf_set.contains(&other.get_cf_by_name("lock").unwrap()));
    }
}
