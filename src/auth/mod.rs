use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts},
};
use chrono::{DateTime, Duration, Utc};
use sha2::{Digest, Sha256};
use std::{collections::HashMap, convert::Infallible, fmt, sync::Arc};
use tokio::sync::RwLock;

use crate::error::AppError;

const TOKEN_PREFIX: &str = "pb_";

/// Area an admin session unlocks
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Scope {
    /// One local board
    Board(String),
    Guestbook,
    /// The issue-backed board (all of its boards)
    Remote,
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::Board(name) => write!(f, "board:{}", name),
            Scope::Guestbook => f.write_str("guestbook"),
            Scope::Remote => f.write_str("remote"),
        }
    }
}

/// Server-side record of a login
#[derive(Debug, Clone)]
pub struct Session {
    pub scope: Scope,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    /// Issue tracker token supplied at remote login
    pub tracker_token: Option<String>,
}

/// Longest session lifetime accepted from configuration (one year)
pub const MAX_SESSION_TTL_SECS: u64 = 365 * 24 * 60 * 60;

/// Live sessions keyed by the SHA-256 of their bearer token
#[derive(Clone)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<String, Session>>>,
    ttl_secs: u64,
}

impl SessionStore {
    pub fn new(ttl_secs: u64) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            ttl_secs,
        }
    }

    /// Expiry of a session started at `now`; fails when the lifetime does not fit a timestamp
    fn expiry_from(&self, now: DateTime<Utc>) -> Result<DateTime<Utc>, AppError> {
        i64::try_from(self.ttl_secs)
            .ok()
            .and_then(Duration::try_seconds)
            .and_then(|ttl| now.checked_add_signed(ttl))
            .ok_or_else(|| {
                AppError::Internal(anyhow::anyhow!(
                    "session lifetime of {}s is out of range",
                    self.ttl_secs
                ))
            })
    }

    /// Start a session and return its bearer token (shown once)
    pub async fn create(
        &self,
        scope: Scope,
        tracker_token: Option<String>,
    ) -> Result<String, AppError> {
        let now = Utc::now();
        let session = Session {
            scope,
            created_at: now,
            expires_at: self.expiry_from(now)?,
            tracker_token,
        };

        let token = generate_session_token();
        tracing::info!(scope = %session.scope, "Admin session started");
        self.sessions
            .write()
            .await
            .insert(hash_session_token(&token), session);
        Ok(token)
    }

    /// Look up an unexpired session
    pub async fn get(&self, token: &str) -> Option<Session> {
        let sessions = self.sessions.read().await;
        sessions
            .get(&hash_session_token(token))
            .filter(|s| s.expires_at > Utc::now())
            .cloned()
    }

    /// End a session; false when it did not exist
    pub async fn revoke(&self, token: &str) -> bool {
        let removed = self
            .sessions
            .write()
            .await
            .remove(&hash_session_token(token));
        if let Some(session) = &removed {
            tracing::info!(scope = %session.scope, "Admin session ended");
        }
        removed.is_some()
    }

    /// Drop expired sessions, returning how many were removed
    pub async fn purge_expired(&self) -> usize {
        let now = Utc::now();
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, s| s.expires_at > now);
        before - sessions.len()
    }
}

/// Admin password check against a stored Argon2 hash
#[derive(Clone)]
pub struct AdminCredentials {
    password_hash: String,
}

impl AdminCredentials {
    pub fn new(password_hash: impl Into<String>) -> Self {
        Self {
            password_hash: password_hash.into(),
        }
    }

    pub fn verify(&self, password: &str) -> bool {
        let parsed_hash = match PasswordHash::new(&self.password_hash) {
            Ok(p) => p,
            Err(e) => {
                tracing::error!("Configured admin password hash is invalid: {}", e);
                return false;
            }
        };
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok()
    }

    /// Verify on the blocking pool so Argon2 does not stall the async workers
    pub async fn check(&self, password: &str) -> Result<bool, AppError> {
        let credentials = self.clone();
        let password = password.to_string();
        tokio::task::spawn_blocking(move || credentials.verify(&password))
            .await
            .map_err(|e| AppError::Internal(anyhow::anyhow!("password check task failed: {}", e)))
    }
}

/// Hash a password into an Argon2 PHC string
pub fn hash_password(password: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("argon2: {}", e))?;
    Ok(hash.to_string())
}

/// Authenticated admin extracted from the `Authorization: Bearer` header
#[derive(Debug, Clone)]
pub struct AdminSession {
    pub token: String,
    pub session: Session,
}

impl AdminSession {
    /// Require the session to cover a scope or return an error
    pub fn require_scope(&self, scope: &Scope) -> Result<(), AppError> {
        if &self.session.scope == scope {
            Ok(())
        } else {
            Err(AppError::Forbidden(format!(
                "Session does not cover {}",
                scope
            )))
        }
    }

    pub fn covers(&self, scope: &Scope) -> bool {
        &self.session.scope == scope
    }

    /// Tracker token of a remote session
    pub fn tracker_token(&self) -> Result<&str, AppError> {
        self.session
            .tracker_token
            .as_deref()
            .ok_or_else(|| AppError::Unauthorized("Issue tracker token required".to_string()))
    }
}

impl std::ops::Deref for AdminSession {
    type Target = Session;

    fn deref(&self) -> &Self::Target {
        &self.session
    }
}

impl<S> FromRequestParts<S> for AdminSession
where
    SessionStore: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let sessions = SessionStore::from_ref(state);

        let auth_header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| AppError::Unauthorized("Missing Authorization header".to_string()))?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or_else(|| AppError::Unauthorized("Invalid Authorization header format".to_string()))?;

        if !token.starts_with(TOKEN_PREFIX) {
            return Err(AppError::Unauthorized("Invalid session token format".to_string()));
        }

        let session = sessions
            .get(token)
            .await
            .ok_or_else(|| AppError::Unauthorized("Session expired or unknown".to_string()))?;

        Ok(AdminSession {
            token: token.to_string(),
            session,
        })
    }
}

/// Optional admin session for read-only views; never rejects
#[derive(Debug, Clone)]
pub struct MaybeAdmin(pub Option<AdminSession>);

impl MaybeAdmin {
    pub fn covers(&self, scope: &Scope) -> bool {
        self.0.as_ref().is_some_and(|s| s.covers(scope))
    }
}

impl<S> FromRequestParts<S> for MaybeAdmin
where
    SessionStore: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        Ok(MaybeAdmin(
            AdminSession::from_request_parts(parts, state).await.ok(),
        ))
    }
}

/// Hash a session token for storage/lookup
pub fn hash_session_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

/// Generate a new random session token
pub fn generate_session_token() -> String {
    use rand::Rng;
    let mut rng = rand::thread_rng();
    let bytes: [u8; 32] = rng.gen();
    format!("{}{}", TOKEN_PREFIX, hex::encode(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use argon2::{Algorithm, Params, Version};

    /// Cheap Argon2 hash so tests stay fast
    fn test_password_hash(password: &str) -> String {
        let params = Params::new(1024, 1, 1, None).unwrap();
        let argon = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);
        let salt = SaltString::generate(&mut OsRng);
        argon
            .hash_password(password.as_bytes(), &salt)
            .unwrap()
            .to_string()
    }

    #[test]
    fn test_verify_password() {
        let creds = AdminCredentials::new(test_password_hash("swimming"));
        assert!(creds.verify("swimming"));
        assert!(!creds.verify("Swimming"));
        assert!(!creds.verify(""));
    }

    #[test]
    fn test_invalid_hash_never_verifies() {
        let creds = AdminCredentials::new("plaintext-is-not-a-hash");
        assert!(!creds.verify("plaintext-is-not-a-hash"));
    }

    #[test]
    fn test_token_format() {
        let token = generate_session_token();
        assert!(token.starts_with(TOKEN_PREFIX));
        assert_eq!(token.len(), TOKEN_PREFIX.len() + 64);
        assert_ne!(token, generate_session_token());
        assert_eq!(hash_session_token(&token).len(), 64);
    }

    #[tokio::test]
    async fn test_session_lifecycle() {
        let store = SessionStore::new(60);
        let token = store.create(Scope::Board("cs".into()), None).await.unwrap();

        let session = store.get(&token).await.expect("session is live");
        assert_eq!(session.scope, Scope::Board("cs".into()));

        assert!(store.revoke(&token).await);
        assert!(store.get(&token).await.is_none());
        assert!(!store.revoke(&token).await);
    }

    #[tokio::test]
    async fn test_expired_sessions_are_rejected_and_purged() {
        let store = SessionStore::new(0);
        let token = store.create(Scope::Guestbook, None).await.unwrap();
        assert!(store.get(&token).await.is_none());
        assert_eq!(store.purge_expired().await, 1);
    }

    #[tokio::test]
    async fn test_oversized_ttl_is_an_error_not_a_panic() {
        for ttl in [10_000_000_000_000, u64::MAX] {
            let store = SessionStore::new(ttl);
            let err = store.create(Scope::Guestbook, None).await.unwrap_err();
            assert!(matches!(err, AppError::Internal(_)));
            assert_eq!(store.purge_expired().await, 0);
        }
    }

    #[tokio::test]
    async fn test_longest_configurable_ttl_works() {
        let store = SessionStore::new(MAX_SESSION_TTL_SECS);
        let token = store.create(Scope::Remote, Some("ghp_x".into())).await.unwrap();
        let session = store.get(&token).await.expect("session is live");
        assert!(session.expires_at > session.created_at);
    }

    #[tokio::test]
    async fn test_check_runs_off_the_runtime() {
        let creds = AdminCredentials::new(test_password_hash("swimming"));
        assert!(creds.check("swimming").await.unwrap());
        assert!(!creds.check("running").await.unwrap());
    }

    #[test]
    fn test_scope_display() {
        assert_eq!(Scope::Board("coding-test".into()).to_string(), "board:coding-test");
        assert_eq!(Scope::Guestbook.to_string(), "guestbook");
        assert_eq!(Scope::Remote.to_string(), "remote");
    }
}
