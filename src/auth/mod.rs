use axum::routing::{get, post};
use axum::Router;

use crate::state::AppState;

pub mod cookies;
mod dto;
pub mod extractors;
pub mod handlers;
pub mod jwt;
mod password;
pub mod sessions;

pub use password::{hash_password, verify_password};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/login", post(handlers::login))
        .route("/logout", get(handlers::logout))
        .route("/refresh-token", get(handlers::refresh_token))
        .route("/change-password", post(handlers::change_password))
}
