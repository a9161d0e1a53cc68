use async_trait::async_trait;
use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
};
use tokio::fs;

use super::{validate_key, KeyValueStore};
use crate::error::Result;

/// One `<key>.json` file per key under a data directory
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Open (and create if needed) the data directory
    pub async fn open(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root).await?;
        Ok(Self { root })
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(format!("{}.json", key))
    }
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        validate_key(key)?;
        match fs::read_to_string(self.path_for(key)).await {
            Ok(raw) => Ok(Some(raw)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Write to a sibling temp file, then rename over the blob
    async fn set(&self, key: &str, value: &str) -> Result<()> {
        validate_key(key)?;
        let target = self.path_for(key);
        let tmp = self.root.join(format!(".{}.json.tmp", key));
        fs::write(&tmp, value).await?;
        fs::rename(&tmp, &target).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!(
            "portfolio-boards-{}-{}-{}",
            name,
            std::process::id(),
            chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default()
        ))
    }

    #[tokio::test]
    async fn test_set_overwrites_blob() {
        let dir = scratch_dir("file-store");
        let store = FileStore::open(&dir).await.unwrap();

        assert_eq!(store.get("guestbook_messages").await.unwrap(), None);

        store.set("guestbook_messages", "[]").await.unwrap();
        store.set("guestbook_messages", "[1]").await.unwrap();
        assert_eq!(
            store.get("guestbook_messages").await.unwrap().as_deref(),
            Some("[1]")
        );

        assert!(!dir.join(".guestbook_messages.json.tmp").exists());

        let _ = std::fs::remove_dir_all(dir);
    }

    #[tokio::test]
    async fn test_rejects_path_keys() {
        let dir = scratch_dir("file-store-keys");
        let store = FileStore::open(&dir).await.unwrap();
        assert!(store.set("../escape", "x").await.is_err());
        let _ = std::fs::remove_dir_all(dir);
    }
}
