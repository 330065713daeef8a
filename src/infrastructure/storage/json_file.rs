//! JSON file store: one `<key>.json` document per key

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::Value;
use tokio::fs;

use crate::application::ports::{KeyValueStore, StorageError};

/// Overrides the data directory
pub const DATA_DIR_ENV: &str = "CRYSENSE_DATA_DIR";

const APP_DIR: &str = "crysense";

/// Stores each key as a pretty-printed JSON file in one directory
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    /// Store in `$CRYSENSE_DATA_DIR`, else `<data dir>/crysense`
    pub fn new() -> Self {
        Self::with_dir(Self::default_dir())
    }

    pub fn with_dir(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn default_dir() -> PathBuf {
        std::env::var_os(DATA_DIR_ENV)
            .filter(|dir| !dir.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| {
                dirs::data_dir()
                    .unwrap_or_else(|| PathBuf::from(".local/share"))
                    .join(APP_DIR)
            })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File backing `key`. Keys are restricted to a safe file-name alphabet.
    pub fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(StorageError::Io(format!("invalid storage key \"{}\"", key)));
        }
        Ok(self.dir.join(format!("{}.json", key)))
    }
}

impl Default for JsonFileStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl KeyValueStore for JsonFileStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, StorageError> {
        let path = self.path_for(key)?;

        let content = match fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StorageError::Io(format!("{}: {}", path.display(), e))),
        };

        serde_json::from_str(&content)
            .map(Some)
            .map_err(|e| StorageError::Corrupt {
                key: key.to_string(),
                message: e.to_string(),
            })
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), StorageError> {
        let path = self.path_for(key)?;

        fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| StorageError::Io(format!("{}: {}", self.dir.display(), e)))?;

        let content =
            serde_json::to_vec_pretty(&value).map_err(|e| StorageError::Serialize(e.to_string()))?;

        // Write a sibling then rename so readers never see a partial document
        let tmp = path.with_extension(format!("json.tmp-{}", std::process::id()));
        fs::write(&tmp, content)
            .await
            .map_err(|e| StorageError::Io(format!("{}: {}", tmp.display(), e)))?;
        if let Err(e) = fs::rename(&tmp, &path).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(StorageError::Io(format!("{}: {}", path.display(), e)));
        }

        Ok(())
    }
}
