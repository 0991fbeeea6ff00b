//! Backing storage for the token map.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::{Arc, RwLock};

use crate::error::Result;

/// Key under which the token blob lives in a key-value store.
pub const STORE_KEY: &str = "ghbot-tokens";

/// Generic get/set-by-key persisted store.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: String);
}

/// Process-wide key-value store that lives as long as the bot does.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, value: String) {
        self.entries
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .insert(key.to_string(), value);
    }
}

/// Where the serialized token map is kept.
pub enum TokenBackend {
    /// Single JSON file, rewritten whole on every update
    File(PathBuf),
    /// Single JSON value in a key-value store
    KeyValue(Arc<dyn KeyValueStore>),
}

impl TokenBackend {
    /// Read the raw blob. `None` means nothing has been stored yet.
    pub(super) async fn read(&self) -> Result<Option<String>> {
        match self {
            TokenBackend::File(path) => match tokio::fs::read_to_string(path).await {
                Ok(blob) => Ok(Some(blob)),
                Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
                Err(e) => Err(e.into()),
            },
            TokenBackend::KeyValue(store) => Ok(store.get(STORE_KEY)),
        }
    }

    pub(super) async fn write(&self, blob: String) -> Result<()> {
        match self {
            TokenBackend::File(path) => tokio::fs::write(path, blob).await?,
            TokenBackend::KeyValue(store) => store.set(STORE_KEY, blob),
        }
        Ok(())
    }

    pub(super) fn describe(&self) -> String {
        match self {
            TokenBackend::File(path) => format!("file {}", path.display()),
            TokenBackend::KeyValue(_) => format!("key-value store entry '{STORE_KEY}'"),
        }
    }
}
