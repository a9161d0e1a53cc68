//! GitHub Issues as the content store for the remote board
//!
//! Each post is an open issue labelled `board:<name>`:
//! 1. List: GET /repos/{owner}/{repo}/issues?labels=board:{name}
//! 2. Create: POST /repos/{owner}/{repo}/issues (authenticated)
//! 3. Delete: PATCH /repos/{owner}/{repo}/issues/{number} with state=closed
//!
//! The operator's personal access token is only ever sent as a bearer token
//! and never persisted by this module.

use async_trait::async_trait;
use reqwest::{header, Client, RequestBuilder, Response, StatusCode};
use serde_json::json;

use crate::config::GitHubConfig;
use crate::error::{AppError, Result};
use crate::models::{Issue, NewIssue};

const ACCEPT_V3: &str = "application/vnd.github.v3+json";

/// Issue tracker operations used by the remote board
#[async_trait]
pub trait IssueTracker: Send + Sync {
    /// Open issues carrying `label`, newest first
    async fn list_issues(&self, label: &str) -> Result<Vec<Issue>>;
    async fn create_issue(&self, token: &str, issue: &NewIssue) -> Result<Issue>;
    async fn close_issue(&self, token: &str, number: i64) -> Result<()>;
    /// Check that `token` can access the configured repository.
    ///
    /// A refused token is `Unauthorized`; an unreachable tracker is `Remote`.
    async fn verify_token(&self, token: &str) -> Result<()>;
}

/// REST client for one repository
#[derive(Debug, Clone)]
pub struct GitHubClient {
    http: Client,
    config: GitHubConfig,
}

impl GitHubClient {
    pub fn new(config: GitHubConfig) -> Result<Self> {
        let http = Client::builder()
            .user_agent(config.user_agent.clone())
            .build()?;
        Ok(Self { http, config })
    }

    fn repo_url(&self) -> String {
        format!(
            "{}/repos/{}/{}",
            self.config.api_base.trim_end_matches('/'),
            self.config.owner,
            self.config.repo
        )
    }

    fn issues_url(&self) -> String {
        format!("{}/issues", self.repo_url())
    }

    fn request(&self, builder: RequestBuilder, token: Option<&str>) -> RequestBuilder {
        let builder = builder.header(header::ACCEPT, ACCEPT_V3);
        match token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }
}

/// Turn a non-success response into a remote error carrying the API message
async fn check_status(response: Response, action: &str) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<serde_json::Value>(&body)
        .ok()
        .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_string))
        .unwrap_or(body);

    Err(AppError::Remote(format!(
        "{} failed: {} - {}",
        action,
        status.as_u16(),
        message
    )))
}

fn is_token_rejection(status: StatusCode) -> bool {
    status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN
}

#[async_trait]
impl IssueTracker for GitHubClient {
    async fn list_issues(&self, label: &str) -> Result<Vec<Issue>> {
        let url = format!(
            "{}?labels={}&state=open&sort=created&direction=desc",
            self.issues_url(),
            urlencoding::encode(label)
        );

        let response = self.request(self.http.get(&url), None).send().await?;
        let response = check_status(response, "Listing issues").await?;
        let issues: Vec<Issue> = response.json().await?;

        // The issues endpoint also returns pull requests
        Ok(issues
            .into_iter()
            .filter(|issue| issue.pull_request.is_none())
            .collect())
    }

    async fn create_issue(&self, token: &str, issue: &NewIssue) -> Result<Issue> {
        let response = self
            .request(self.http.post(self.issues_url()), Some(token))
            .json(issue)
            .send()
            .await?;
        let response = check_status(response, "Creating issue").await?;
        Ok(response.json().await?)
    }

    async fn close_issue(&self, token: &str, number: i64) -> Result<()> {
        let url = format!("{}/{}", self.issues_url(), number);
        let response = self
            .request(self.http.patch(&url), Some(token))
            .json(&json!({ "state": "closed" }))
            .send()
            .await?;
        check_status(response, "Closing issue").await?;
        Ok(())
    }

    async fn verify_token(&self, token: &str) -> Result<()> {
        let response = self
            .request(self.http.get(self.repo_url()), Some(token))
            .send()
            .await?;
        if is_token_rejection(response.status()) {
            return Err(AppError::Unauthorized(
                "Issue tracker rejected the token".to_string(),
            ));
        }
        check_status(response, "Verifying token").await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(api_base: &str) -> GitHubClient {
        GitHubClient::new(GitHubConfig {
            api_base: api_base.to_string(),
            owner: "someone".to_string(),
            repo: "someone.github.io".to_string(),
            user_agent: "test".to_string(),
        })
        .unwrap()
    }

    #[test]
    fn test_urls() {
        let c = client("https://api.github.com/");
        assert_eq!(c.repo_url(), "https://api.github.com/repos/someone/someone.github.io");
        assert_eq!(
            c.issues_url(),
            "https://api.github.com/repos/someone/someone.github.io/issues"
        );
    }

    #[tokio::test]
    async fn test_unreachable_tracker_is_remote_error() {
        // Nothing listens on port 9 locally; the connection is refused
        let c = client("http://127.0.0.1:9");
        let err = c.list_issues("board:cs").await.unwrap_err();
        assert!(matches!(err, AppError::Remote(_)));

        let err = c.verify_token("ghp_any").await.unwrap_err();
        assert!(matches!(err, AppError::Remote(_)));
    }

    #[test]
    fn test_token_rejection_statuses() {
        assert!(is_token_rejection(StatusCode::UNAUTHORIZED));
        assert!(is_token_rejection(StatusCode::FORBIDDEN));
        assert!(!is_token_rejection(StatusCode::SERVICE_UNAVAILABLE));
        assert!(!is_token_rejection(StatusCode::OK));
    }
}
