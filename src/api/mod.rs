mod boards;
mod guestbook;
mod remote;
pub mod session;

use axum::{routing::{get, post, delete}, Router};

use crate::AppState;

/// Build the API router
pub fn router() -> Router<AppState> {
    Router::new()
        // Local boards
        .route("/boards", get(boards::list_boards))
        .route("/boards/{board}/posts", get(boards::list_posts))
        .route("/boards/{board}/posts", post(boards::create_post))
        .route("/boards/{board}/posts/{id}", get(boards::get_post))
        .route("/boards/{board}/posts/{id}", delete(boards::delete_post))
        .route("/boards/{board}/posts/{id}/comments", post(boards::create_comment))
        .route(
            "/boards/{board}/posts/{id}/comments/{comment_id}",
            delete(boards::delete_comment),
        )
        .route("/boards/{board}/session", post(session::board_login))
        .route("/boards/{board}/session", delete(session::board_logout))
        .route("/boards/{board}/view", get(boards::board_view))
        .route("/boards/{board}/posts/{id}/view", get(boards::post_view))
        // Guestbook
        .route("/guestbook/messages", get(guestbook::list_messages))
        .route("/guestbook/messages", post(guestbook::create_message))
        .route("/guestbook/messages/{id}", delete(guestbook::delete_message))
        .route("/guestbook/session", post(session::guestbook_login))
        .route("/guestbook/session", delete(session::guestbook_logout))
        .route("/guestbook/view", get(guestbook::guestbook_view))
        // Issue-backed boards
        .route("/remote/session", post(session::remote_login))
        .route("/remote/session", delete(session::remote_logout))
        .route("/remote/{board}/posts", get(remote::list_posts))
        .route("/remote/{board}/posts", post(remote::create_post))
        .route("/remote/{board}/posts/{number}", delete(remote::delete_post))
        .route("/remote/{board}/view", get(remote::board_view))
        .route("/remote/{board}/posts/{number}/view", get(remote::post_view))
}
