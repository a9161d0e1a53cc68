//! Post boards persisted as one JSON blob per board

use std::sync::Arc;
use tokio::sync::Mutex;

use crate::error::{AppError, Result};
use crate::models::{
    next_id, posts_key, require_field, Comment, CreateCommentRequest, CreatePostRequest, Post,
};
use crate::storage::{load_collection, save_collection, KeyValueStore};

/// Board persistence over a key/value store
#[derive(Clone)]
pub struct BoardStore {
    kv: Arc<dyn KeyValueStore>,
    /// Serializes load-modify-save cycles
    write_lock: Arc<Mutex<()>>,
}

impl BoardStore {
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self {
            kv,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    /// All posts of a board in stored (creation) order
    pub async fn load(&self, board: &str) -> Result<Vec<Post>> {
        load_collection(self.kv.as_ref(), &posts_key(board)).await
    }

    /// Overwrite a board's posts
    pub async fn save(&self, board: &str, posts: &[Post]) -> Result<()> {
        save_collection(self.kv.as_ref(), &posts_key(board), posts).await
    }

    pub async fn get_post(&self, board: &str, post_id: i64) -> Result<Post> {
        self.load(board)
            .await?
            .into_iter()
            .find(|p| p.id == post_id)
            .ok_or_else(|| AppError::NotFound(format!("Post {} not found", post_id)))
    }

    /// Posts matching a free-text query
    pub async fn search(&self, board: &str, query: &str) -> Result<Vec<Post>> {
        let query = query.trim();
        let posts = self.load(board).await?;
        if query.is_empty() {
            return Ok(posts);
        }
        Ok(posts.into_iter().filter(|p| p.matches(query)).collect())
    }

    /// Validate and append a new post
    pub async fn add_post(&self, board: &str, req: &CreatePostRequest) -> Result<Post> {
        let title = require_field("title", &req.title)?;
        let author = require_field("author", &req.author)?;
        let content = require_field("content", &req.content)?;

        let _guard = self.write_lock.lock().await;
        let mut posts = self.load(board).await?;

        let post = Post {
            id: next_id(posts.iter().map(|p| p.id)),
            title,
            author,
            content,
            created_at: chrono::Utc::now(),
            comments: Vec::new(),
        };
        posts.push(post.clone());
        self.save(board, &posts).await?;

        tracing::info!(board, post_id = post.id, "Post created");
        Ok(post)
    }

    /// Append a comment to a post.
    ///
    /// Returns `Ok(None)` and leaves storage untouched when the post is gone.
    pub async fn add_comment(
        &self,
        board: &str,
        post_id: i64,
        req: &CreateCommentRequest,
    ) -> Result<Option<Comment>> {
        let author = require_field("author", &req.author)?;
        let content = require_field("content", &req.content)?;

        let _guard = self.write_lock.lock().await;
        let mut posts = self.load(board).await?;

        let Some(post) = posts.iter_mut().find(|p| p.id == post_id) else {
            return Ok(None);
        };

        let comment = Comment {
            id: next_id(post.comments.iter().map(|c| c.id)),
            author,
            content,
            created_at: chrono::Utc::now(),
        };
        post.comments.push(comment.clone());
        self.save(board, &posts).await?;

        tracing::info!(board, post_id, comment_id = comment.id, "Comment added");
        Ok(Some(comment))
    }

    /// Remove a post with its comments; false when no such post exists
    pub async fn delete_post(&self, board: &str, post_id: i64) -> Result<bool> {
        let _guard = self.write_lock.lock().await;
        let mut posts = self.load(board).await?;

        let before = posts.len();
        posts.retain(|p| p.id != post_id);
        if posts.len() == before {
            return Ok(false);
        }

        self.save(board, &posts).await?;
        tracing::info!(board, post_id, "Post deleted");
        Ok(true)
    }

    /// Remove one comment; false when the post or comment does not exist
    pub async fn delete_comment(&self, board: &str, post_id: i64, comment_id: i64) -> Result<bool> {
        let _guard = self.write_lock.lock().await;
        let mut posts = self.load(board).await?;

        let Some(post) = posts.iter_mut().find(|p| p.id == post_id) else {
            return Ok(false);
        };
        let before = post.comments.len();
        post.comments.retain(|c| c.id != comment_id);
        if post.comments.len() == before {
            return Ok(false);
        }

        self.save(board, &posts).await?;
        tracing::info!(board, post_id, comment_id, "Comment deleted");
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    fn store() -> BoardStore {
        BoardStore::new(Arc::new(MemoryStore::new()))
    }

    fn post_req(title: &str, author: &str, content: &str) -> CreatePostRequest {
        CreatePostRequest {
            title: title.into(),
            author: author.into(),
            content: content.into(),
        }
    }

    fn comment_req(author: &str, content: &str) -> CreateCommentRequest {
        CreateCommentRequest {
            author: author.into(),
            content: content.into(),
        }
    }

    #[tokio::test]
    async fn test_create_then_reload() {
        let boards = store();
        boards.add_post("cs", &post_req("Hi", "A", "Body")).await.unwrap();

        let posts = boards.load("cs").await.unwrap();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].title, "Hi");
        assert_eq!(posts[0].author, "A");
        assert_eq!(posts[0].content, "Body");
        assert!(posts[0].comments.is_empty());
    }

    #[tokio::test]
    async fn test_boards_are_isolated() {
        let boards = store();
        boards.add_post("cs", &post_req("Hi", "A", "Body")).await.unwrap();
        assert!(boards.load("algorithm").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_blank_fields_do_not_mutate() {
        let boards = store();
        for req in [
            post_req("  ", "A", "Body"),
            post_req("Hi", "", "Body"),
            post_req("Hi", "A", "\n\t"),
        ] {
            let err = boards.add_post("cs", &req).await.unwrap_err();
            assert!(matches!(err, AppError::Validation(_)));
        }
        assert!(boards.load("cs").await.unwrap().is_empty());

        let post = boards.add_post("cs", &post_req("Hi", "A", "Body")).await.unwrap();
        let err = boards
            .add_comment("cs", post.id, &comment_req("B", " "))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert!(boards.get_post("cs", post.id).await.unwrap().comments.is_empty());
    }

    #[tokio::test]
    async fn test_comment_touches_only_its_post() {
        let boards = store();
        let first = boards.add_post("cs", &post_req("One", "A", "1")).await.unwrap();
        let second = boards.add_post("cs", &post_req("Two", "A", "2")).await.unwrap();
        assert_ne!(first.id, second.id);

        let comment = boards
            .add_comment("cs", first.id, &comment_req("B", "  Nice  "))
            .await
            .unwrap()
            .expect("post exists");
        assert_eq!(comment.content, "Nice");

        let posts = boards.load("cs").await.unwrap();
        assert_eq!(posts[0].comments.len(), 1);
        assert_eq!(posts[1], second);
    }

    #[tokio::test]
    async fn test_comment_on_missing_post_is_noop() {
        let boards = store();
        boards.add_post("cs", &post_req("One", "A", "1")).await.unwrap();
        let before = boards.load("cs").await.unwrap();

        let result = boards.add_comment("cs", 12345, &comment_req("B", "x")).await.unwrap();
        assert!(result.is_none());
        assert_eq!(boards.load("cs").await.unwrap(), before);
    }

    #[tokio::test]
    async fn test_delete_post_and_comment() {
        let boards = store();
        let post = boards.add_post("cs", &post_req("One", "A", "1")).await.unwrap();
        let keep = boards.add_post("cs", &post_req("Two", "A", "2")).await.unwrap();
        let c1 = boards.add_comment("cs", keep.id, &comment_req("B", "x")).await.unwrap().unwrap();
        let c2 = boards.add_comment("cs", keep.id, &comment_req("C", "y")).await.unwrap().unwrap();

        assert!(boards.delete_comment("cs", keep.id, c1.id).await.unwrap());
        assert!(!boards.delete_comment("cs", keep.id, c1.id).await.unwrap());
        assert_eq!(boards.get_post("cs", keep.id).await.unwrap().comments, vec![c2]);

        assert!(boards.delete_post("cs", post.id).await.unwrap());
        assert!(!boards.delete_post("cs", post.id).await.unwrap());
        let posts = boards.load("cs").await.unwrap();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].id, keep.id);
    }

    #[tokio::test]
    async fn test_search() {
        let boards = store();
        boards.add_post("algorithm", &post_req("BFS", "Yang", "queue")).await.unwrap();
        boards.add_post("algorithm", &post_req("DP", "Kim", "memo")).await.unwrap();

        let hits = boards.search("algorithm", "kim").await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].title, "DP");
        assert_eq!(boards.search("algorithm", "  ").await.unwrap().len(), 2);
    }
}
