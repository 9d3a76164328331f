//! String key-value storage, the local-storage port behind the draft cache.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::{FactdeskError, Result};

pub trait KeyValueStore {
    fn get_item(&self, key: &str) -> Result<Option<String>>;
    fn set_item(&self, key: &str, value: &str) -> Result<()>;
    fn remove_item(&self, key: &str) -> Result<()>;
}

#[cfg(test)]
pub use memory::MemoryKv;

#[cfg(test)]
mod memory {
    use std::cell::RefCell;
    use std::collections::BTreeMap;

    use super::KeyValueStore;
    use crate::error::Result;

    /// In-process storage for tests.
    #[derive(Default)]
    pub struct MemoryKv {
        items: RefCell<BTreeMap<String, String>>,
    }

    impl MemoryKv {
        pub fn new() -> Self {
            Self::default()
        }
    }

    impl KeyValueStore for MemoryKv {
        fn get_item(&self, key: &str) -> Result<Option<String>> {
            Ok(self.items.borrow().get(key).cloned())
        }

        fn set_item(&self, key: &str, value: &str) -> Result<()> {
            self.items
                .borrow_mut()
                .insert(key.to_string(), value.to_string());
            Ok(())
        }

        fn remove_item(&self, key: &str) -> Result<()> {
            self.items.borrow_mut().remove(key);
            Ok(())
        }
    }
}

/// A JSON object file holding every key. Each call re-reads the file so two
/// processes see each other's writes (last write wins).
pub struct FileKv {
    path: PathBuf,
}

impl FileKv {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Ok(Self {
            path: path.to_path_buf(),
        })
    }

    /// An unreadable file is treated as empty so the next write replaces it.
    fn read_all(&self) -> Result<BTreeMap<String, String>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let content = std::fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        match serde_json::from_str(&content) {
            Ok(items) => Ok(items),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "discarding corrupt local storage");
                Ok(BTreeMap::new())
            }
        }
    }

    /// Write to a sibling temp file, then rename over the target.
    fn write_all(&self, items: &BTreeMap<String, String>) -> Result<()> {
        let json = serde_json::to_string_pretty(items)?;
        let mut temp_path = self.path.clone();
        temp_path.set_extension(format!("json.tmp{}", std::process::id()));
        std::fs::write(&temp_path, format!("{json}\n"))?;
        std::fs::rename(&temp_path, &self.path).map_err(|e| {
            let _ = std::fs::remove_file(&temp_path);
            FactdeskError::Storage(format!("could not replace {}: {e}", self.path.display()))
        })
    }
}

impl KeyValueStore for FileKv {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        Ok(self.read_all()?.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        let mut items = self.read_all()?;
        items.insert(key.to_string(), value.to_string());
        self.write_all(&items)
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        let mut items = self.read_all()?;
        if items.remove(key).is_some() {
            self.write_all(&items)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_kv_set_get_remove() {
        let kv = MemoryKv::new();
        assert_eq!(kv.get_item("a").unwrap(), None);
        kv.set_item("a", "1").unwrap();
        assert_eq!(kv.get_item("a").unwrap().as_deref(), Some("1"));
        kv.remove_item("a").unwrap();
        assert_eq!(kv.get_item("a").unwrap(), None);
    }

    #[test]
    fn test_file_kv_persists_across_handles() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("local_storage.json");
        FileKv::open(&path).unwrap().set_item("draft_u1", "{}").unwrap();
        let reopened = FileKv::open(&path).unwrap();
        assert_eq!(reopened.get_item("draft_u1").unwrap().as_deref(), Some("{}"));
        reopened.remove_item("draft_u1").unwrap();
        assert_eq!(FileKv::open(&path).unwrap().get_item("draft_u1").unwrap(), None);
    }

    #[test]
    fn test_file_kv_recovers_from_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("local_storage.json");
        std::fs::write(&path, r#"{"draft_u1": "{\"value\": {\"ti"#).unwrap();
        let kv = FileKv::open(&path).unwrap();
        assert_eq!(kv.get_item("draft_u1").unwrap(), None);

        kv.set_item("draft_u1", "{}").unwrap();
        assert_eq!(kv.get_item("draft_u1").unwrap().as_deref(), Some("{}"));
        let on_disk: BTreeMap<String, String> =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(on_disk.len(), 1);
    }

    #[test]
    fn test_file_kv_write_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("local_storage.json");
        let kv = FileKv::open(&path).unwrap();
        kv.set_item("a", "1").unwrap();
        kv.set_item("b", "2").unwrap();
        let names: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("local_storage.json")]);
    }
}
