//! Durable key/value storage for user preferences (the selected language).

use std::collections::{
    BTreeMap,
    HashMap,
};
use std::fmt::Debug;
use std::path::{
    Path,
    PathBuf,
};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Failed to access preference file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Preference file is not a JSON object of strings: {0}")]
    Json(#[from] serde_json::Error),
}

/// Preference storage surviving across sessions.
pub trait PreferenceStorage: Debug + Send + Sync {
    /// Stored value, `None` when absent or unreadable.
    fn get(&self, key: &str) -> Option<String>;

    /// Stores `value` under `key`.
    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError>;
}

/// Preferences kept in memory only.
#[derive(Debug, Default, Clone)]
pub struct MemoryStorage {
    /// Stored entries.
    entries: HashMap<String, String>,
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Storage pre-populated with one entry.
    #[must_use]
    pub fn with_entry(key: &str, value: &str) -> Self {
        let mut entries = HashMap::new();
        entries.insert(key.to_string(), value.to_string());
        Self { entries }
    }
}

impl PreferenceStorage for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Preferences stored as a flat JSON object in a file.
#[derive(Debug, Clone)]
pub struct FileStorage {
    /// Backing file; created on first write.
    path: PathBuf,
}

impl FileStorage {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_entries(&self) -> Result<BTreeMap<String, String>, StorageError> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let content = std::fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&content)?)
    }
}

impl PreferenceStorage for FileStorage {
    fn get(&self, key: &str) -> Option<String> {
        match self.read_entries() {
            Ok(mut entries) => entries.remove(key),
            Err(error) => {
                tracing::warn!(path = %self.path.display(), %error, "Ignoring unreadable preferences");
                None
            }
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        // A corrupt file is replaced rather than blocking every later write.
        let mut entries = self.read_entries().unwrap_or_default();
        entries.insert(key.to_string(), value.to_string());

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, serde_json::to_string_pretty(&entries)?)?;
        tracing::debug!(path = %self.path.display(), key, "Preference saved");
        Ok(())
    }
}
