use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Html,
    Json,
};
use serde::Deserialize;

use crate::{
    auth::{AdminSession, MaybeAdmin, Scope},
    error::{AppError, Result},
    models::{BoardSummary, Comment, CreateCommentRequest, CreatePostRequest, Post},
    render, AppState,
};

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

/// List configured boards with their post counts
pub async fn list_boards(State(state): State<AppState>) -> Result<Json<Vec<BoardSummary>>> {
    let mut summaries = Vec::with_capacity(state.config.boards.names.len());
    for name in &state.config.boards.names {
        let posts = state.boards.load(name).await?;
        summaries.push(BoardSummary {
            name: name.clone(),
            post_count: posts.len(),
        });
    }
    Ok(Json(summaries))
}

/// Posts of a board, newest first, optionally filtered by `q`
pub async fn list_posts(
    State(state): State<AppState>,
    Path(board): Path<String>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<Post>>> {
    state.require_board(&board)?;
    let mut posts = state.boards.search(&board, &query.q).await?;
    posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(Json(posts))
}

pub async fn create_post(
    State(state): State<AppState>,
    auth: AdminSession,
    Path(board): Path<String>,
    Json(req): Json<CreatePostRequest>,
) -> Result<(StatusCode, Json<Post>)> {
    state.require_board(&board)?;
    auth.require_scope(&Scope::Board(board.clone()))?;

    let post = state.boards.add_post(&board, &req).await?;
    Ok((StatusCode::CREATED, Json(post)))
}

pub async fn get_post(
    State(state): State<AppState>,
    Path((board, post_id)): Path<(String, i64)>,
) -> Result<Json<Post>> {
    state.require_board(&board)?;
    Ok(Json(state.boards.get_post(&board, post_id).await?))
}

pub async fn delete_post(
    State(state): State<AppState>,
    auth: AdminSession,
    Path((board, post_id)): Path<(String, i64)>,
) -> Result<StatusCode> {
    state.require_board(&board)?;
    auth.require_scope(&Scope::Board(board.clone()))?;

    if !state.boards.delete_post(&board, post_id).await? {
        return Err(AppError::NotFound(format!("Post {} not found", post_id)));
    }
    Ok(StatusCode::NO_CONTENT)
}

/// Comment on a post (open to anyone)
pub async fn create_comment(
    State(state): State<AppState>,
    Path((board, post_id)): Path<(String, i64)>,
    Json(req): Json<CreateCommentRequest>,
) -> Result<(StatusCode, Json<Comment>)> {
    state.require_board(&board)?;

    let comment = state
        .boards
        .add_comment(&board, post_id, &req)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Post {} not found", post_id)))?;
    Ok((StatusCode::CREATED, Json(comment)))
}

pub async fn delete_comment(
    State(state): State<AppState>,
    auth: AdminSession,
    Path((board, post_id, comment_id)): Path<(String, i64, i64)>,
) -> Result<StatusCode> {
    state.require_board(&board)?;
    auth.require_scope(&Scope::Board(board.clone()))?;

    if !state.boards.delete_comment(&board, post_id, comment_id).await? {
        return Err(AppError::NotFound(format!(
            "Comment {} on post {} not found",
            comment_id, post_id
        )));
    }
    Ok(StatusCode::NO_CONTENT)
}

/// Rendered post list
pub async fn board_view(
    State(state): State<AppState>,
    viewer: MaybeAdmin,
    Path(board): Path<String>,
) -> Result<Html<String>> {
    state.require_board(&board)?;
    let is_admin = viewer.covers(&Scope::Board(board.clone()));
    let posts = state.boards.load(&board).await?;
    Ok(Html(render::render_board(
        &board,
        &posts,
        is_admin,
        chrono::Utc::now(),
    )))
}

/// Rendered post with comments
pub async fn post_view(
    State(state): State<AppState>,
    viewer: MaybeAdmin,
    Path((board, post_id)): Path<(String, i64)>,
) -> Result<Html<String>> {
    state.require_board(&board)?;
    let is_admin = viewer.covers(&Scope::Board(board.clone()));
    let post = state.boards.get_post(&board, post_id).await?;
    Ok(Html(render::render_post_detail(
        &post,
        is_admin,
        chrono::Utc::now(),
    )))
}
