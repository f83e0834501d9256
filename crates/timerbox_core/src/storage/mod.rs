//! Flat string-keyed blob storage and whole-collection persistence on top of it.

mod json_store;

pub use json_store::{FileStore, data_dir};

use crate::error::AppError;
use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::{debug, error, warn};

pub const TIMERS_KEY: &str = "timers";
pub const HISTORY_KEY: &str = "timerHistory";

/// Asynchronous get/set-by-key store holding opaque string blobs.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, AppError>;

    async fn set(&self, key: &str, value: &str) -> Result<(), AppError>;
}

/// In-process store. Contents vanish with the value.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, AppError> {
        let entries = self
            .entries
            .lock()
            .map_err(|err| AppError::io(format!("memory store poisoned: {err}")))?;
        Ok(entries.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), AppError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|err| AppError::io(format!("memory store poisoned: {err}")))?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Reads the whole collection under `key`.
///
/// A missing key, an unreadable blob, and malformed JSON all yield an empty
/// collection; the latter two are logged.
pub async fn load_collection<T: DeserializeOwned>(store: &dyn KeyValueStore, key: &str) -> Vec<T> {
    let content = match store.get(key).await {
        Ok(Some(content)) => content,
        Ok(None) => {
            debug!(key, "nothing stored yet");
            return Vec::new();
        }
        Err(err) => {
            warn!(key, error = %err, "failed to read collection, starting empty");
            return Vec::new();
        }
    };

    match serde_json::from_str::<Vec<T>>(&content) {
        Ok(items) => {
            debug!(key, count = items.len(), "loaded collection");
            items
        }
        Err(err) => {
            warn!(key, error = %err, "stored collection is not valid JSON, starting empty");
            Vec::new()
        }
    }
}

/// Overwrites `key` with the full collection. Failures are logged and
/// reported as `false`; nothing is retried.
pub async fn save_collection<T: Serialize>(
    store: &dyn KeyValueStore,
    key: &str,
    items: &[T],
) -> bool {
    let content = match serde_json::to_string(items) {
        Ok(content) => content,
        Err(err) => {
            error!(key, error = %err, "failed to serialize collection");
            return false;
        }
    };

    match store.set(key, &content).await {
        Ok(()) => true,
        Err(err) => {
            error!(key, error = %err, "failed to save collection");
            false
        }
    }
}
