use crate::domain::ports::LocalMemory;
use crate::utils::error::{LeadError, Result};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Process-local memory; used by tests and one-shot runs.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    values: Mutex<HashMap<String, String>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LocalMemory for InMemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let values = self.values.lock().map_err(|_| LeadError::MemoryError {
            message: "memory lock poisoned".to_string(),
        })?;
        Ok(values.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut values = self.values.lock().map_err(|_| LeadError::MemoryError {
            message: "memory lock poisoned".to_string(),
        })?;
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Key-value memory persisted as a JSON object in a single file, so it survives restarts
/// the way browser storage survives reloads.
#[derive(Debug, Clone)]
pub struct FileMemory {
    path: PathBuf,
}

impl FileMemory {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<HashMap<String, String>> {
        if !self.path.exists() {
            return Ok(HashMap::new());
        }
        let content = fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(HashMap::new());
        }
        Ok(serde_json::from_str(&content)?)
    }
}

impl LocalMemory for FileMemory {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.load()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        // 壞掉的檔案直接覆寫，否則之後每次記錄都會失敗
        let mut values = match self.load() {
            Ok(values) => values,
            Err(LeadError::SerializationError(e)) => {
                tracing::warn!(
                    "⚠️ Local memory at {} is unreadable, starting over: {}",
                    self.path.display(),
                    e
                );
                HashMap::new()
            }
            Err(e) => return Err(e),
        };
        values.insert(key.to_string(), value.to_string());

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        fs::write(&self.path, serde_json::to_string_pretty(&values)?)?;
        tracing::debug!("Local memory written to {}", self.path.display());
        Ok(())
    }
}
