pub mod api;
pub mod auth;
pub mod boards;
pub mod cleanup;
pub mod config;
pub mod error;
pub mod github;
pub mod guestbook;
pub mod models;
pub mod ratelimit;
pub mod remote;
pub mod render;
pub mod storage;

use anyhow::Result;
use axum::{
    extract::{DefaultBodyLimit, FromRef},
    http::{header, HeaderValue},
    middleware,
    routing::get,
    Router,
};
use std::{net::SocketAddr, sync::Arc};
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    set_header::SetResponseHeaderLayer,
    trace::TraceLayer,
};

use crate::auth::{AdminCredentials, SessionStore};
use crate::boards::BoardStore;
use crate::cleanup::start_cleanup_tasks;
use crate::config::Config;
use crate::error::AppError;
use crate::github::{GitHubClient, IssueTracker};
use crate::guestbook::GuestbookStore;
use crate::ratelimit::{rate_limit_middleware, RateLimiter};
use crate::remote::RemoteBoard;
use crate::storage::{FileStore, KeyValueStore};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub boards: BoardStore,
    pub guestbook: GuestbookStore,
    pub remote: RemoteBoard,
    pub sessions: SessionStore,
    pub admin: AdminCredentials,
}

impl AppState {
    pub fn new(
        config: Config,
        kv: Arc<dyn KeyValueStore>,
        tracker: Arc<dyn IssueTracker>,
    ) -> Self {
        Self {
            boards: BoardStore::new(kv.clone()),
            guestbook: GuestbookStore::new(kv),
            remote: RemoteBoard::new(tracker),
            sessions: SessionStore::new(config.admin.session_ttl_secs),
            admin: AdminCredentials::new(config.admin.password_hash.clone()),
            config: Arc::new(config),
        }
    }

    /// Reject board names that are not configured
    pub fn require_board(&self, board: &str) -> error::Result<()> {
        if self.config.boards.contains(board) {
            Ok(())
        } else {
            Err(AppError::NotFound(format!("Board '{}' not found", board)))
        }
    }
}

impl FromRef<AppState> for SessionStore {
    fn from_ref(state: &AppState) -> Self {
        state.sessions.clone()
    }
}

/// Build the application router (without the per-IP write throttle,
/// which needs connection info and is added in [`run`])
pub fn app(state: AppState) -> Router {
    let config = state.config.clone();
    let cors = build_cors_layer(&config.security.cors_origins);

    Router::new()
        .route("/health", get(health_check))
        .nest("/api/v1", api::router())
        // Everything else is the static site
        .fallback_service(ServeDir::new(&config.server.static_dir))
        // Middleware layers (order matters - applied bottom to top)
        .layer(DefaultBodyLimit::max(config.server.max_body_size))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        // Security headers
        .layer(SetResponseHeaderLayer::overriding(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::CONTENT_SECURITY_POLICY,
            HeaderValue::from_static("default-src 'self'; script-src 'self' 'unsafe-inline'; style-src 'self' 'unsafe-inline'; img-src 'self' data: https:; connect-src 'self' https://api.github.com"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::REFERRER_POLICY,
            HeaderValue::from_static("strict-origin-when-cross-origin"),
        ))
        .with_state(state)
}

/// Run the server
pub async fn run(config: Config) -> Result<()> {
    let kv = FileStore::open(&config.storage.data_dir).await?;
    tracing::info!("Data directory: {}", config.storage.data_dir);

    if config.github.is_configured() {
        tracing::info!(
            "Remote boards backed by {}/{}",
            config.github.owner,
            config.github.repo
        );
    } else {
        tracing::warn!("GITHUB_OWNER/GITHUB_REPO not set - remote boards will report errors");
    }
    let tracker = GitHubClient::new(config.github.clone())?;

    let state = AppState::new(config, Arc::new(kv), Arc::new(tracker));
    let config = state.config.clone();

    let rate_limiter = RateLimiter::new(
        config.security.write_rate_limit_rpm,
        config.security.write_rate_limit_enabled,
    )
    .trust_forwarded_for(config.security.trust_proxy_headers);
    if config.security.write_rate_limit_enabled {
        tracing::info!(
            "Write rate limiting enabled: {} requests/minute per IP",
            config.security.write_rate_limit_rpm
        );
    }
    if config.security.trust_proxy_headers {
        tracing::info!("Write rate limiting keys on X-Forwarded-For");
    }

    start_cleanup_tasks(
        state.sessions.clone(),
        rate_limiter.clone(),
        config.security.cleanup_interval_secs,
    );
    tracing::info!(
        "Cleanup tasks started (interval: {}s)",
        config.security.cleanup_interval_secs
    );

    let app = app(state).layer(middleware::from_fn_with_state(
        rate_limiter,
        rate_limit_middleware,
    ));

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!("portfolio-boards listening on {}", addr);
    tracing::info!(
        "Boards: {}, static site: {}",
        config.boards.names.join(", "),
        config.server.static_dir
    );

    // Use into_make_service_with_connect_info to get client IP
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("Server shut down gracefully");
    Ok(())
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "ok"
}

/// Build CORS layer from configuration
fn build_cors_layer(origins: &str) -> CorsLayer {
    if origins == "*" {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        use tower_http::cors::AllowOrigin;

        let origins: Vec<_> = origins
            .split(',')
            .filter_map(|s| s.trim().parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(Any)
            .allow_headers(Any)
    }
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, shutting down...");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, shutting down...");
        }
    }
}
