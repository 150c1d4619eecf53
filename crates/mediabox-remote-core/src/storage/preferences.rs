//! File-backed key/value configuration store.
//!
//! All values live in a single `preferences.json`. Writes go to a temporary
//! file that is then renamed over the original.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::Utc;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, info};

use super::default_data_dir;
use crate::error::StorageError;
use crate::types::Device;

/// Key holding the selected device: a network host, or the short-range sentinel
pub const DEVICE_KEY: &str = "device";

/// Display name of the selected device
pub const DEVICE_NAME_KEY: &str = "device.name";

const STORE_FILE: &str = "preferences.json";

/// Valid keys: alphanumeric, dot, dash, underscore
const KEY_PATTERN: &str = r"^[a-zA-Z0-9_.-]+$";

const MAX_KEY_LENGTH: usize = 64;

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct Preferences {
    values: BTreeMap<String, String>,
    updated_at: Option<String>,
}

pub struct ConfigStore {
    path: PathBuf,
    key_regex: Regex,
    // Serializes read-modify-write cycles within this process.
    lock: Mutex<()>,
}

impl ConfigStore {
    /// Create a store in `dir`, creating the directory if needed.
    pub fn new(dir: PathBuf) -> Result<Self, StorageError> {
        std::fs::create_dir_all(&dir).map_err(|e| {
            StorageError::DirectoryAccess(format!("{}: {}", dir.display(), e))
        })?;

        let key_regex =
            Regex::new(KEY_PATTERN).map_err(|e| StorageError::InvalidKey(e.to_string()))?;

        Ok(Self {
            path: dir.join(STORE_FILE),
            key_regex,
            lock: Mutex::new(()),
        })
    }

    /// Store in the platform data directory.
    pub fn open_default() -> Result<Self, StorageError> {
        let dir = default_data_dir().ok_or_else(|| {
            StorageError::DirectoryAccess("no home directory for this user".to_string())
        })?;
        Self::new(dir)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn validate_key(&self, key: &str) -> Result<(), StorageError> {
        if key.is_empty() {
            return Err(StorageError::InvalidKey("key cannot be empty".to_string()));
        }

        if key.len() > MAX_KEY_LENGTH {
            return Err(StorageError::InvalidKey(format!(
                "key exceeds maximum length of {} characters",
                MAX_KEY_LENGTH
            )));
        }

        if !self.key_regex.is_match(key) {
            return Err(StorageError::InvalidKey(format!(
                "'{}' contains invalid characters",
                key
            )));
        }

        Ok(())
    }

    async fn load(&self) -> Result<Preferences, StorageError> {
        match fs::read_to_string(&self.path).await {
            Ok(content) => Ok(serde_json::from_str(&content)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Preferences::default()),
            Err(e) => Err(StorageError::Io(e)),
        }
    }

    async fn persist(&self, mut prefs: Preferences) -> Result<(), StorageError> {
        prefs.updated_at = Some(Utc::now().to_rfc3339());
        let content = serde_json::to_string_pretty(&prefs)?;

        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, content).await?;
        fs::rename(&tmp, &self.path).await?;
        Ok(())
    }

    pub async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.validate_key(key)?;
        let _guard = self.lock.lock().await;
        Ok(self.load().await?.values.remove(key))
    }

    pub async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.validate_key(key)?;
        let _guard = self.lock.lock().await;

        let mut prefs = self.load().await?;
        prefs.values.insert(key.to_string(), value.to_string());
        self.persist(prefs).await?;

        debug!(key, "preference saved");
        Ok(())
    }

    /// Remove `key`. Returns whether it was present.
    pub async fn remove(&self, key: &str) -> Result<bool, StorageError> {
        self.validate_key(key)?;
        let _guard = self.lock.lock().await;

        let mut prefs = self.load().await?;
        if prefs.values.remove(key).is_none() {
            return Ok(false);
        }
        self.persist(prefs).await?;
        Ok(true)
    }

    /// All stored entries, ordered by key.
    pub async fn entries(&self) -> Result<Vec<(String, String)>, StorageError> {
        let _guard = self.lock.lock().await;
        Ok(self.load().await?.values.into_iter().collect())
    }

    /// Make `device` the command channel target.
    ///
    /// Returns `true` if the stored address changed. An unchanged address
    /// still refreshes the display name.
    pub async fn select_device(&self, device: &Device) -> Result<bool, StorageError> {
        let _guard = self.lock.lock().await;

        let mut prefs = self.load().await?;
        let previous = prefs
            .values
            .insert(DEVICE_KEY.to_string(), device.address.clone());
        prefs
            .values
            .insert(DEVICE_NAME_KEY.to_string(), device.name.clone());
        self.persist(prefs).await?;

        let changed = previous.as_deref() != Some(device.address.as_str());
        if changed {
            info!(device = %device.label(), "selected device");
        }
        Ok(changed)
    }

    /// Select the short-range link by storing its sentinel address.
    pub async fn select_short_range(&self, sentinel: &str) -> Result<bool, StorageError> {
        let _guard = self.lock.lock().await;

        let mut prefs = self.load().await?;
        let previous = prefs
            .values
            .insert(DEVICE_KEY.to_string(), sentinel.to_string());
        prefs.values.remove(DEVICE_NAME_KEY);
        self.persist(prefs).await?;

        Ok(previous.as_deref() != Some(sentinel))
    }
}
