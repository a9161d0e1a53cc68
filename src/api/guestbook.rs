use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Html,
    Json,
};

use crate::{
    auth::{AdminSession, MaybeAdmin, Scope},
    error::{AppError, Result},
    models::{CreateMessageRequest, Message},
    render, AppState,
};

/// Messages, newest first
pub async fn list_messages(State(state): State<AppState>) -> Result<Json<Vec<Message>>> {
    Ok(Json(state.guestbook.load().await?))
}

pub async fn create_message(
    State(state): State<AppState>,
    Json(req): Json<CreateMessageRequest>,
) -> Result<(StatusCode, Json<Message>)> {
    let message = state.guestbook.add_message(&req).await?;
    Ok((StatusCode::CREATED, Json(message)))
}

pub async fn delete_message(
    State(state): State<AppState>,
    auth: AdminSession,
    Path(message_id): Path<i64>,
) -> Result<StatusCode> {
    auth.require_scope(&Scope::Guestbook)?;

    if !state.guestbook.delete_message(message_id).await? {
        return Err(AppError::NotFound(format!("Message {} not found", message_id)));
    }
    Ok(StatusCode::NO_CONTENT)
}

pub async fn guestbook_view(
    State(state): State<AppState>,
    viewer: MaybeAdmin,
) -> Result<Html<String>> {
    let messages = state.guestbook.load().await?;
    Ok(Html(render::render_guestbook(
        &messages,
        viewer.covers(&Scope::Guestbook),
        chrono::Utc::now(),
    )))
}
