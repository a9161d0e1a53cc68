//! Board variant whose posts live on the issue tracker

use std::{
    collections::{HashMap, HashSet},
    sync::{Arc, Mutex as StdMutex},
};
use tokio::sync::RwLock;

use crate::error::{AppError, Result};
use crate::github::IssueTracker;
use crate::models::{
    board_label, compose_issue_body, is_blank_rich_text, require_field, CreatePostRequest,
    NewIssue, RemotePost,
};

#[derive(Clone)]
pub struct RemoteBoard {
    tracker: Arc<dyn IssueTracker>,
    /// Last successfully loaded list per board
    cache: Arc<RwLock<HashMap<String, Vec<RemotePost>>>>,
    /// Boards with a create request currently in flight
    in_flight: Arc<StdMutex<HashSet<String>>>,
}

/// Clears the in-flight mark for a board when dropped
struct InFlight {
    set: Arc<StdMutex<HashSet<String>>>,
    board: String,
}

impl Drop for InFlight {
    fn drop(&mut self) {
        if let Ok(mut set) = self.set.lock() {
            set.remove(&self.board);
        }
    }
}

impl RemoteBoard {
    pub fn new(tracker: Arc<dyn IssueTracker>) -> Self {
        Self {
            tracker,
            cache: Arc::new(RwLock::new(HashMap::new())),
            in_flight: Arc::new(StdMutex::new(HashSet::new())),
        }
    }

    /// Fetch the board's posts and refresh the cache.
    ///
    /// On failure the cached list is left as it was.
    pub async fn load(&self, board: &str) -> Result<Vec<RemotePost>> {
        let issues = self.tracker.list_issues(&board_label(board)).await?;
        let posts: Vec<RemotePost> = issues.into_iter().map(RemotePost::from).collect();

        tracing::info!(board, count = posts.len(), "Remote posts loaded");
        self.cache
            .write()
            .await
            .insert(board.to_string(), posts.clone());
        Ok(posts)
    }

    /// Posts from the last successful load
    pub async fn cached(&self, board: &str) -> Vec<RemotePost> {
        self.cache.read().await.get(board).cloned().unwrap_or_default()
    }

    /// Open an issue for a new post, then reload the board
    pub async fn create_post(
        &self,
        board: &str,
        token: &str,
        req: &CreatePostRequest,
    ) -> Result<RemotePost> {
        let title = require_field("title", &req.title)?;
        let author = require_field("author", &req.author)?;
        if is_blank_rich_text(&req.content) {
            return Err(AppError::Validation("content is required".to_string()));
        }

        let _in_flight = self.begin_submission(board)?;

        let issue = NewIssue {
            title,
            body: compose_issue_body(&author, chrono::Utc::now(), req.content.trim()),
            labels: vec![board_label(board)],
        };
        let created = self.tracker.create_issue(token, &issue).await?;
        tracing::info!(board, issue = created.number, "Remote post created");

        let post = RemotePost::from(created);
        if let Err(e) = self.load(board).await {
            tracing::warn!("Reload after create failed for board {}: {}", board, e);
        }
        Ok(post)
    }

    /// Close the issue behind a post, then reload the board
    pub async fn delete_post(&self, board: &str, token: &str, number: i64) -> Result<()> {
        self.tracker.close_issue(token, number).await?;
        tracing::info!(board, issue = number, "Remote post closed");

        if let Err(e) = self.load(board).await {
            tracing::warn!("Reload after delete failed for board {}: {}", board, e);
        }
        Ok(())
    }

    pub async fn verify_token(&self, token: &str) -> Result<()> {
        self.tracker.verify_token(token).await
    }

    fn begin_submission(&self, board: &str) -> Result<InFlight> {
        let mut set = self
            .in_flight
            .lock()
            .map_err(|_| AppError::Internal(anyhow::anyhow!("in-flight set poisoned")))?;
        if !set.insert(board.to_string()) {
            return Err(AppError::Conflict(
                "A post is already being submitted to this board".to_string(),
            ));
        }
        Ok(InFlight {
            set: self.in_flight.clone(),
            board: board.to_string(),
        })
    }
}
