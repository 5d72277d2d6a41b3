use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;

use async_trait::async_trait;
use tracing::{debug, error};

use shared_models::error::AppError;

/// Async key-value store for session tokens, tenant selection and cached
/// data. String keys and values; callers JSON-encode structured values.
#[async_trait]
pub trait PreferenceStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, AppError>;
    async fn set(&self, key: &str, value: &str) -> Result<(), AppError>;
    async fn remove(&self, key: &str) -> Result<(), AppError>;
    async fn multi_set(&self, pairs: &[(&str, &str)]) -> Result<(), AppError>;
}

/// In-memory store used by tests and as a default collaborator.
#[derive(Default)]
pub struct MemoryPreferenceStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryPreferenceStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PreferenceStore for MemoryPreferenceStore {
    async fn get(&self, key: &str) -> Result<Option<String>, AppError> {
        let values = self.values.lock().map_err(poisoned)?;
        Ok(values.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), AppError> {
        let mut values = self.values.lock().map_err(poisoned)?;
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), AppError> {
        let mut values = self.values.lock().map_err(poisoned)?;
        values.remove(key);
        Ok(())
    }

    async fn multi_set(&self, pairs: &[(&str, &str)]) -> Result<(), AppError> {
        let mut values = self.values.lock().map_err(poisoned)?;
        for (key, value) in pairs {
            values.insert((*key).to_string(), (*value).to_string());
        }
        Ok(())
    }
}

/// File-backed store persisting the whole map as one JSON object per write.
pub struct FilePreferenceStore {
    path: PathBuf,
    values: Mutex<HashMap<String, String>>,
}

impl FilePreferenceStore {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, AppError> {
        let path = path.into();
        let values = match std::fs::read_to_string(&path) {
            Ok(contents) => serde_json::from_str(&contents).map_err(|e| {
                error!("Corrupt preference file {}: {}", path.display(), e);
                AppError::Storage(format!("corrupt preference file: {}", e))
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No preference file at {}, starting empty", path.display());
                HashMap::new()
            }
            Err(e) => {
                return Err(AppError::Storage(format!(
                    "failed to read preference file: {}",
                    e
                )))
            }
        };

        Ok(Self {
            path,
            values: Mutex::new(values),
        })
    }

    fn flush(&self, values: &HashMap<String, String>) -> Result<(), AppError> {
        let contents = serde_json::to_string_pretty(values)
            .map_err(|e| AppError::Storage(format!("failed to encode preferences: {}", e)))?;
        std::fs::write(&self.path, contents).map_err(|e| {
            error!("Failed to write preference file {}: {}", self.path.display(), e);
            AppError::Storage(format!("failed to write preference file: {}", e))
        })
    }
}

#[async_trait]
impl PreferenceStore for FilePreferenceStore {
    async fn get(&self, key: &str) -> Result<Option<String>, AppError> {
        let values = self.values.lock().map_err(poisoned)?;
        Ok(values.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), AppError> {
        let mut values = self.values.lock().map_err(poisoned)?;
        values.insert(key.to_string(), value.to_string());
        self.flush(&values)
    }

    async fn remove(&self, key: &str) -> Result<(), AppError> {
        let mut values = self.values.lock().map_err(poisoned)?;
        values.remove(key);
        self.flush(&values)
    }

    async fn multi_set(&self, pairs: &[(&str, &str)]) -> Result<(), AppError> {
        let mut values = self.values.lock().map_err(poisoned)?;
        for (key, value) in pairs {
            values.insert((*key).to_string(), (*value).to_string());
        }
        // One write for the whole batch so partial session state never lands.
        self.flush(&values)
    }
}

fn poisoned<T>(_: std::sync::PoisonError<T>) -> AppError {
    AppError::Internal("preference store lock poisoned".to_string())
}
