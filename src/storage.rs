//! Client-local key/value storage, the counterpart of a browser's `localStorage`.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::error::{ClientDeskError, Result};

pub trait LocalStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
}

/// JSON map persisted to a single file. Every `set` rewrites the whole file.
pub struct FileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn open_default() -> Self {
        Self::new(crate::runtime_paths::default_storage_path())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_map(&self) -> Result<BTreeMap<String, String>> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(err) => return Err(ClientDeskError::Storage(err.to_string())),
        };
        if raw.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        serde_json::from_str(&raw).map_err(|e| {
            ClientDeskError::Storage(format!("corrupt storage file {}: {e}", self.path.display()))
        })
    }

    fn write_map(&self, map: &BTreeMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ClientDeskError::Storage(e.to_string()))?;
        }
        let body = serde_json::to_string_pretty(map)?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, body).map_err(|e| ClientDeskError::Storage(e.to_string()))?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let _ = std::fs::set_permissions(&tmp, std::fs::Permissions::from_mode(0o600));
        }
        std::fs::rename(&tmp, &self.path).map_err(|e| ClientDeskError::Storage(e.to_string()))
    }
}

impl LocalStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let _guard = self
            .lock
            .lock()
            .map_err(|_| ClientDeskError::Storage("storage lock poisoned".to_string()))?;
        Ok(self.read_map()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let _guard = self
            .lock
            .lock()
            .map_err(|_| ClientDeskError::Storage("storage lock poisoned".to_string()))?;
        let mut map = self.read_map()?;
        map.insert(key.to_string(), value.to_string());
        self.write_map(&map)
    }
}

#[derive(Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, String>>,
    writes: Mutex<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `set` calls so far.
    pub fn write_count(&self) -> usize {
        self.writes.lock().map(|guard| *guard).unwrap_or(0)
    }
}

impl LocalStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let values = self
            .values
            .lock()
            .map_err(|_| ClientDeskError::Storage("storage lock poisoned".to_string()))?;
        Ok(values.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.values
            .lock()
            .map_err(|_| ClientDeskError::Storage("storage lock poisoned".to_string()))?
            .insert(key.to_string(), value.to_string());
        if let Ok(mut writes) = self.writes.lock() {
            *writes += 1;
        }
        Ok(())
    }
}
