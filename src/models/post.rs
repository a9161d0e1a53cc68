use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A post on a board, stored as part of the board's JSON blob
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    /// Creation timestamp in milliseconds, unique within the board
    pub id: i64,
    pub title: String,
    pub author: String,
    /// Post body (plain text)
    pub content: String,
    pub created_at: DateTime<Utc>,
    /// Comments in the order they were written
    #[serde(default)]
    pub comments: Vec<Comment>,
}

/// A comment owned by a post
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: i64,
    pub author: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// Request to write a new post
#[derive(Debug, Clone, Deserialize)]
pub struct CreatePostRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub content: String,
}

/// Request to comment on a post
#[derive(Debug, Clone, Deserialize)]
pub struct CreateCommentRequest {
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub content: String,
}

impl Post {
    /// Case-insensitive match against title, content and author
    pub fn matches(&self, query: &str) -> bool {
        let query = query.to_lowercase();
        self.title.to_lowercase().contains(&query)
            || self.content.to_lowercase().contains(&query)
            || self.author.to_lowercase().contains(&query)
    }

    pub fn comment_count(&self) -> usize {
        self.comments.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post(title: &str, author: &str, content: &str) -> Post {
        Post {
            id: 1,
            title: title.to_string(),
            author: author.to_string(),
            content: content.to_string(),
            created_at: Utc::now(),
            comments: vec![],
        }
    }

    #[test]
    fn test_matches_any_field() {
        let p = post("Dijkstra notes", "Yang", "Shortest paths with a heap");
        assert!(p.matches("dijkstra"));
        assert!(p.matches("HEAP"));
        assert!(p.matches("yang"));
        assert!(!p.matches("segment tree"));
    }

    #[test]
    fn test_blob_without_comments_loads() {
        let json = r#"{"id":5,"title":"t","author":"a","content":"c","createdAt":"2024-03-01T10:00:00Z"}"#;
        let p: Post = serde_json::from_str(json).unwrap();
        assert_eq!(p.id, 5);
        assert!(p.comments.is_empty());
    }

    #[test]
    fn test_camel_case_field_names() {
        let value = serde_json::to_value(post("t", "a", "c")).unwrap();
        assert!(value.get("createdAt").is_some());
        assert!(value.get("created_at").is_none());
    }
}
