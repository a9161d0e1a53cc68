use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Html,
    Json,
};

use crate::{
    auth::{AdminSession, MaybeAdmin, Scope},
    error::{AppError, Result},
    models::{CreatePostRequest, RemotePost},
    render, AppState,
};

/// Fresh list from the tracker; a failed fetch is a 502
pub async fn list_posts(
    State(state): State<AppState>,
    Path(board): Path<String>,
) -> Result<Json<Vec<RemotePost>>> {
    state.require_board(&board)?;
    Ok(Json(state.remote.load(&board).await?))
}

pub async fn create_post(
    State(state): State<AppState>,
    auth: AdminSession,
    Path(board): Path<String>,
    Json(req): Json<CreatePostRequest>,
) -> Result<(StatusCode, Json<RemotePost>)> {
    state.require_board(&board)?;
    auth.require_scope(&Scope::Remote)?;
    let token = auth.tracker_token()?;

    let post = state.remote.create_post(&board, token, &req).await?;
    Ok((StatusCode::CREATED, Json(post)))
}

pub async fn delete_post(
    State(state): State<AppState>,
    auth: AdminSession,
    Path((board, number)): Path<(String, i64)>,
) -> Result<StatusCode> {
    state.require_board(&board)?;
    auth.require_scope(&Scope::Remote)?;
    let token = auth.tracker_token()?;

    state.remote.delete_post(&board, token, number).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Posts for a view: fresh when the tracker answers, otherwise the last good list
async fn posts_for_view(state: &AppState, board: &str) -> Vec<RemotePost> {
    match state.remote.load(board).await {
        Ok(posts) => posts,
        Err(e) => {
            tracing::warn!("Showing cached remote posts for {}: {}", board, e);
            state.remote.cached(board).await
        }
    }
}

pub async fn board_view(
    State(state): State<AppState>,
    viewer: MaybeAdmin,
    Path(board): Path<String>,
) -> Result<Html<String>> {
    state.require_board(&board)?;
    let posts = posts_for_view(&state, &board).await;
    Ok(Html(render::render_remote_board(
        &board,
        &posts,
        viewer.covers(&Scope::Remote),
        chrono::Utc::now(),
    )))
}

pub async fn post_view(
    State(state): State<AppState>,
    viewer: MaybeAdmin,
    Path((board, number)): Path<(String, i64)>,
) -> Result<Html<String>> {
    state.require_board(&board)?;
    let post = posts_for_view(&state, &board)
        .await
        .into_iter()
        .find(|p| p.id == number)
        .ok_or_else(|| AppError::NotFound(format!("Post {} not found", number)))?;

    Ok(Html(render::render_remote_post(
        &post,
        viewer.covers(&Scope::Remote),
        chrono::Utc::now(),
    )))
}
