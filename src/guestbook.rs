//! Guestbook messages persisted as a single JSON blob

use std::sync::Arc;
use tokio::sync::Mutex;

use crate::error::{AppError, Result};
use crate::models::{
    next_id, require_field, validate_message_length, CreateMessageRequest, Message, GUESTBOOK_KEY,
};
use crate::storage::{load_collection, save_collection, KeyValueStore};

#[derive(Clone)]
pub struct GuestbookStore {
    kv: Arc<dyn KeyValueStore>,
    write_lock: Arc<Mutex<()>>,
}

impl GuestbookStore {
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self {
            kv,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Messages, newest first
    pub async fn load(&self) -> Result<Vec<Message>> {
        load_collection(self.kv.as_ref(), GUESTBOOK_KEY).await
    }

    pub async fn save(&self, messages: &[Message]) -> Result<()> {
        save_collection(self.kv.as_ref(), GUESTBOOK_KEY, messages).await
    }

    /// Validate and insert a message at the front
    pub async fn add_message(&self, req: &CreateMessageRequest) -> Result<Message> {
        let author = require_field("author", &req.author)?;
        let text = require_field("message", &req.message)?;
        validate_message_length(&text).map_err(AppError::Validation)?;

        let _guard = self.write_lock.lock().await;
        let mut messages = self.load().await?;

        let message = Message {
            id: next_id(messages.iter().map(|m| m.id)),
            author,
            message: text,
            created_at: chrono::Utc::now(),
        };
        messages.insert(0, message.clone());
        self.save(&messages).await?;

        tracing::info!(message_id = message.id, "Guestbook message added");
        Ok(message)
    }

    /// False when no message has this id
    pub async fn delete_message(&self, message_id: i64) -> Result<bool> {
        let _guard = self.write_lock.lock().await;
        let mut messages = self.load().await?;

        let before = messages.len();
        messages.retain(|m| m.id != message_id);
        if messages.len() == before {
            return Ok(false);
        }

        self.save(&messages).await?;
        tracing::info!(message_id, "Guestbook message deleted");
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MAX_MESSAGE_CHARS;
    use crate::storage::MemoryStore;

    fn req(author: &str, message: &str) -> CreateMessageRequest {
        CreateMessageRequest {
            author: author.into(),
            message: message.into(),
        }
    }

    #[tokio::test]
    async fn test_newest_first() {
        let book = GuestbookStore::new(Arc::new(MemoryStore::new()));
        let first = book.add_message(&req("A", "hello")).await.unwrap();
        let second = book.add_message(&req("B", "hi again")).await.unwrap();

        let messages = book.load().await.unwrap();
        assert_eq!(messages, vec![second, first]);
    }

    #[tokio::test]
    async fn test_rejections_do_not_mutate() {
        let book = GuestbookStore::new(Arc::new(MemoryStore::new()));
        let too_long = "x".repeat(MAX_MESSAGE_CHARS + 1);

        for bad in [req("", "hello"), req("A", "   "), req("A", &too_long)] {
            let err = book.add_message(&bad).await.unwrap_err();
            assert!(matches!(err, AppError::Validation(_)));
        }
        assert!(book.load().await.unwrap().is_empty());

        // Exactly at the limit is fine
        let at_limit = "x".repeat(MAX_MESSAGE_CHARS);
        assert!(book.add_message(&req("A", &at_limit)).await.is_ok());
    }

    #[tokio::test]
    async fn test_length_checked_after_trim() {
        let book = GuestbookStore::new(Arc::new(MemoryStore::new()));
        let padded = format!("   {}   ", "x".repeat(MAX_MESSAGE_CHARS));
        let saved = book.add_message(&req("A", &padded)).await.unwrap();
        assert_eq!(saved.message.len(), MAX_MESSAGE_CHARS);
    }

    #[tokio::test]
    async fn test_delete_message() {
        let book = GuestbookStore::new(Arc::new(MemoryStore::new()));
        let msg = book.add_message(&req("A", "hello")).await.unwrap();
        assert!(book.delete_message(msg.id).await.unwrap());
        assert!(!book.delete_message(msg.id).await.unwrap());
        assert!(book.load().await.unwrap().is_empty());
    }
}
