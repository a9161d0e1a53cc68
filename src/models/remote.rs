use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Author shown when an issue body carries no author line
pub const ANONYMOUS: &str = "Anonymous";

const AUTHOR_PREFIX: &str = "Author:";

/// An issue as returned by the tracker's REST API (only the fields we read)
#[derive(Debug, Clone, Deserialize)]
pub struct Issue {
    pub number: i64,
    pub title: String,
    pub body: Option<String>,
    pub created_at: DateTime<Utc>,
    /// Number of comments on the issue
    #[serde(default)]
    pub comments: u64,
    pub html_url: String,
    /// Present when the "issue" is actually a pull request
    #[serde(default)]
    pub pull_request: Option<serde_json::Value>,
}

/// Payload for creating an issue
#[derive(Debug, Clone, Serialize)]
pub struct NewIssue {
    pub title: String,
    pub body: String,
    pub labels: Vec<String>,
}

/// A post on the issue-backed board
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RemotePost {
    /// Issue number
    pub id: i64,
    pub title: String,
    /// Issue body (rich HTML written by the admin)
    pub content: String,
    pub author: String,
    pub created_at: DateTime<Utc>,
    /// Comment count on the tracker
    pub comments: u64,
    /// Link to the issue page, where readers can comment
    pub url: String,
}

impl From<Issue> for RemotePost {
    fn from(issue: Issue) -> Self {
        let content = issue.body.unwrap_or_default();
        let author = extract_author(&content);
        RemotePost {
            id: issue.number,
            title: issue.title,
            content,
            author,
            created_at: issue.created_at,
            comments: issue.comments,
            url: issue.html_url,
        }
    }
}

/// Find the `Author: name` line in an issue body
pub fn extract_author(body: &str) -> String {
    body.lines()
        .find_map(|line| line.trim_start().strip_prefix(AUTHOR_PREFIX))
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .unwrap_or(ANONYMOUS)
        .to_string()
}

/// Build the issue body for a new remote post
pub fn compose_issue_body(author: &str, created_at: DateTime<Utc>, content: &str) -> String {
    format!(
        "{} {}\nDate: {}\n\n{}",
        AUTHOR_PREFIX,
        author,
        created_at.to_rfc3339(),
        content
    )
}

/// True when rich-text content has no visible text (e.g. an untouched editor)
pub fn is_blank_rich_text(content: &str) -> bool {
    let trimmed = content.trim();
    trimmed.is_empty() || trimmed == "<p><br></p>"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_author() {
        assert_eq!(extract_author("Author: Yang\nDate: today\n\nbody"), "Yang");
        assert_eq!(extract_author("  Author:   Kim  \n"), "Kim");
        assert_eq!(extract_author("no header here"), ANONYMOUS);
        assert_eq!(extract_author("Author:\n"), ANONYMOUS);
        assert_eq!(extract_author(""), ANONYMOUS);
    }

    #[test]
    fn test_body_round_trips_author() {
        let body = compose_issue_body("Yang", Utc::now(), "<p>Hello</p>");
        assert!(body.starts_with("Author: Yang\nDate: "));
        assert!(body.ends_with("\n\n<p>Hello</p>"));
        assert_eq!(extract_author(&body), "Yang");
    }

    #[test]
    fn test_issue_to_post() {
        let json = r#"{
            "number": 42,
            "title": "Segment trees",
            "body": null,
            "created_at": "2024-05-01T09:30:00Z",
            "comments": 3,
            "html_url": "https://github.com/o/r/issues/42"
        }"#;
        let issue: Issue = serde_json::from_str(json).unwrap();
        let post = RemotePost::from(issue);
        assert_eq!(post.id, 42);
        assert_eq!(post.content, "");
        assert_eq!(post.author, ANONYMOUS);
        assert_eq!(post.comments, 3);
    }

    #[test]
    fn test_blank_rich_text() {
        assert!(is_blank_rich_text("<p><br></p>"));
        assert!(is_blank_rich_text("   "));
        assert!(!is_blank_rich_text("<p>hi</p>"));
    }
}
