use crate::{handlers, AppState};
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

/// Creates the Axum router and associates routes with handlers.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/home", get(handlers::home))
        .route("/api/explore", get(handlers::explore))
        .route("/api/leaderboard", get(handlers::leaderboard))
        .route("/api/memes/{id}", get(handlers::meme_detail))
        .route("/api/memes/{id}/like", post(handlers::toggle_like))
        .route(
            "/api/memes/{id}/comments",
            get(handlers::list_comments).post(handlers::add_comment),
        )
        .route("/api/upload", post(handlers::upload_meme))
        .route("/api/profile", get(handlers::get_profile).put(handlers::update_profile))
        .route("/api/theme", get(handlers::get_theme).put(handlers::set_theme))
        .fallback(handlers::not_found)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .layer(DefaultBodyLimit::max(10 * 1024 * 1024))
        .with_state(state)
}
