use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    auth::{AdminSession, Scope},
    error::{AppError, Result},
    AppState,
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    #[serde(default)]
    pub password: String,
    /// Issue tracker token, required for the remote board
    #[serde(default)]
    pub tracker_token: Option<String>,
}

/// Returned once on login; the token is not stored in plain form
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub token: String,
    pub scope: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

async fn check_password(state: &AppState, password: &str, scope: &Scope) -> Result<()> {
    if state.admin.check(password).await? {
        Ok(())
    } else {
        tracing::warn!(%scope, "Rejected admin login");
        Err(AppError::Unauthorized("Invalid password".to_string()))
    }
}

async fn start_session(
    state: &AppState,
    scope: Scope,
    tracker_token: Option<String>,
) -> Result<Json<SessionResponse>> {
    let token = state.sessions.create(scope.clone(), tracker_token).await?;
    let session = state
        .sessions
        .get(&token)
        .await
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("session vanished after creation")))?;

    Ok(Json(SessionResponse {
        token,
        scope: scope.to_string(),
        issued_at: session.created_at,
        expires_at: session.expires_at,
    }))
}

async fn end_session(state: &AppState, auth: AdminSession, scope: Scope) -> Result<StatusCode> {
    auth.require_scope(&scope)?;
    state.sessions.revoke(&auth.token).await;
    Ok(StatusCode::NO_CONTENT)
}

/// Log in to manage one board
pub async fn board_login(
    State(state): State<AppState>,
    Path(board): Path<String>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<SessionResponse>> {
    state.require_board(&board)?;
    let scope = Scope::Board(board);
    check_password(&state, &req.password, &scope).await?;
    start_session(&state, scope, None).await
}

pub async fn board_logout(
    State(state): State<AppState>,
    auth: AdminSession,
    Path(board): Path<String>,
) -> Result<StatusCode> {
    end_session(&state, auth, Scope::Board(board)).await
}

pub async fn guestbook_login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<SessionResponse>> {
    check_password(&state, &req.password, &Scope::Guestbook).await?;
    start_session(&state, Scope::Guestbook, None).await
}

pub async fn guestbook_logout(
    State(state): State<AppState>,
    auth: AdminSession,
) -> Result<StatusCode> {
    end_session(&state, auth, Scope::Guestbook).await
}

/// Log in to the remote board; the tracker token is checked against the
/// repository before a session is issued. A token the tracker refuses is a
/// 401, an unreachable tracker a 502.
pub async fn remote_login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<SessionResponse>> {
    let tracker_token = req
        .tracker_token
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::Validation("trackerToken is required".to_string()))?;

    check_password(&state, &req.password, &Scope::Remote).await?;

    state.remote.verify_token(&tracker_token).await?;

    start_session(&state, Scope::Remote, Some(tracker_token)).await
}

pub async fn remote_logout(
    State(state): State<AppState>,
    auth: AdminSession,
) -> Result<StatusCode> {
    end_session(&state, auth, Scope::Remote).await
}
