//! Key/value persistence for board and guestbook collections
//!
//! Every collection is stored whole as one JSON blob under one key, matching
//! the format the static site keeps in browser local storage. There is no
//! partial update: a save rewrites the entire blob.

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};

use crate::error::{AppError, Result};

/// String blobs addressed by key
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;
    async fn set(&self, key: &str, value: &str) -> Result<()>;
}

/// Load a collection, treating a missing or unparsable blob as empty
pub async fn load_collection<T: DeserializeOwned>(
    store: &dyn KeyValueStore,
    key: &str,
) -> Result<Vec<T>> {
    let Some(raw) = store.get(key).await? else {
        return Ok(Vec::new());
    };

    match serde_json::from_str(&raw) {
        Ok(items) => Ok(items),
        Err(e) => {
            tracing::warn!("Discarding unreadable blob '{}': {}", key, e);
            Ok(Vec::new())
        }
    }
}

/// Overwrite a collection blob
pub async fn save_collection<T: Serialize>(
    store: &dyn KeyValueStore,
    key: &str,
    items: &[T],
) -> Result<()> {
    let raw = serde_json::to_string(items).map_err(|e| AppError::Internal(e.into()))?;
    store.set(key, &raw).await
}

/// Keys double as file names, so only a safe alphabet is accepted
pub(crate) fn validate_key(key: &str) -> Result<()> {
    if key.is_empty()
        || !key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return Err(AppError::Validation(format!("Invalid storage key '{}'", key)));
    }
    Ok(())
}
