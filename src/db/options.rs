use std::{fs, path::{Path, PathBuf}};

use serde::{Deserialize, Serialize};

use crate::{engine::EngineKind, util::Result};

/// Options for opening a [`DB`](crate::DB)
///
/// # Example
///
/// ```ignore
/// use cfkv::{DBOptions, EngineKind};
///
/// let options = DBOptions {
///     engine: EngineKind::Ordered,
///     column_families: vec!["lock".into(), "write".into()],
///     ..Default::default()
/// };
/// ```
///
/// The same options as JSON, every field optional:
///
/// ```json
/// {
///   "engine": "versioned",
///   "column_families": ["lock", "write"],
///   "value_log_dir": "/var/lib/cfkv/vlog",
///   "value_threshold": 1024
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DBOptions {
    /// Engine family backing the database
    pub engine: EngineKind,

    /// Column families created at open, besides "default"
    pub column_families: Vec<String>,

    /// Directory of the value log (versioned engine only)
    /// Default: None, every value kept inline
    pub value_log_dir: Option<PathBuf>,

    /// Values of at least this many bytes go to the value log
    /// Default: 1KB
    pub value_threshold: usize,

    /// Verify value checksums while iterating (ordered engine only)
    /// Default: true
    pub verify_checksums: bool,
}

impl Default for DBOptions {
    fn default() -> Self {
        DBOptions {
            engine: EngineKind::Versioned,
            column_families: Vec::new(),
            value_log_dir: None,
            value_threshold: 1024,
            verify_checksums: true,
        }
    }
}

impl DBOptions {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = DBOptions::default();
        assert_eq!(options.engine, EngineKind::Versioned);
        assert!(options.column_families.is_empty());
        assert!(options.value_log_dir.is_none());
        assert_eq!(options.value_threshold, 1024);
        assert!(options.verify_checksums);
    }

    #[test]
    fn test_from_json_partial() {
        let options =
            DBOptions::from_json(r#"{"engine": "ordered", "column_families": ["lock"]}"#).unwrap();
        assert_eq!(options.engine, EngineKind::Ordered);
        assert_eq!(options.column_families, vec!["lock".to_string()]);
        assert_eq!(options.value_threshold, 1024);
    }

    #[test]
    fn test_from_json_invalid() {
        let err = DBOptions::from_json(r#"{"engine": "btree"}"#).unwrap_err();
        assert!(err.is_invalid_argument());
    }

    #[test]
    fn test_json_file_round_trip() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("options.json");
        let options = DBOptions {
            value_log_dir: Some(temp_dir.path().join("vlog")),
            value_threshold: 64,
            ..Default::default()
        };
        fs::write(&path, options.to_json().unwrap()).unwrap();

        let loaded = DBOptions::from_json_file(&path).unwrap();
        assert_eq!(loaded.value_log_dir, options.value_log_dir);
        assert_eq!(loaded.value_threshold, 64);
    }

    #[test]
    fn test_from_missing_file() {
        let err = DBOptions::from_json_file(Path::new("/nonexistent/options.json")).unwrap_err();
        assert!(err.is_io_error());
    }
}
