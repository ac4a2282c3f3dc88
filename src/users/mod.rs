use axum::extract::DefaultBodyLimit;
use axum::routing::{get, patch, post};
use axum::Router;

use crate::state::AppState;

pub mod dto;
pub mod handlers;
pub mod repo;
pub mod services;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(handlers::register))
        .route("/current-user", get(handlers::current_user))
        .route("/update-account", patch(handlers::update_account))
        .route("/update-avatar", patch(handlers::update_avatar))
        .route("/update-cover", patch(handlers::update_cover))
        .route("/channel/:username", get(handlers::channel_profile))
        .route("/watch-history", get(handlers::watch_history))
        .layer(DefaultBodyLimit::max(20 * 1024 * 1024))
}
