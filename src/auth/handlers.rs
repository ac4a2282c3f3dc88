use axum::{
    extract::{FromRef, State},
    http::{header, HeaderMap},
    response::{AppendHeaders, IntoResponse},
    Json,
};
use tracing::{info, instrument, warn};

use super::cookies::{clear_cookie, cookie_value, token_cookie, ACCESS_COOKIE, REFRESH_COOKIE};
use super::dto::{ChangePasswordRequest, LoginData, LoginRequest, RefreshRequest, TokenPairBody};
use super::extractors::CurrentUser;
use super::jwt::JwtKeys;
use super::sessions::{issue_token_pair, revoke_session};
use super::{hash_password, verify_password};
use crate::error::{ApiError, ApiResult};
use crate::response::ApiResponse;
use crate::state::AppState;
use crate::users::dto::PublicUser;
use crate::users::repo::User;

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> ApiResult<impl IntoResponse> {
    let username = payload.username.trim().to_lowercase();
    let email = payload.email.trim().to_lowercase();

    if username.is_empty() || email.is_empty() || payload.password.trim().is_empty() {
        return Err(ApiError::BadRequest("All fields are required".into()));
    }

    let user = User::find_by_identity(&state.db, &username, &email)
        .await
        .map_err(ApiError::Internal)?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;

    let ok = verify_password(&payload.password, &user.password_hash)
        .map_err(ApiError::Internal)?;
    if !ok {
        warn!(user_id = %user.id, "login with incorrect password");
        return Err(ApiError::BadRequest("Incorrect password".into()));
    }

    let keys = JwtKeys::from_ref(&state);
    let pair = issue_token_pair(&state.db, &keys, &user)
        .await
        .map_err(ApiError::Internal)?;

    info!(user_id = %user.id, username = %user.username, "user logged in");

    let cookies = AppendHeaders([
        (
            header::SET_COOKIE,
            token_cookie(ACCESS_COOKIE, &pair.access_token, keys.access_ttl),
        ),
        (
            header::SET_COOKIE,
            token_cookie(REFRESH_COOKIE, &pair.refresh_token, keys.refresh_ttl),
        ),
    ]);

    Ok((
        cookies,
        ApiResponse::ok(
            "Login successful",
            LoginData {
                user: PublicUser::from(user),
                access_token: pair.access_token,
                refresh_token: pair.refresh_token,
            },
        ),
    ))
}

/// Rotation endpoint: a presented refresh token is good for exactly one
/// refresh. The equality check against the stored value catches replays
/// of rotated-out tokens.
#[instrument(skip(state, headers, body))]
pub async fn refresh_token(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Option<Json<RefreshRequest>>,
) -> ApiResult<impl IntoResponse> {
    let presented = cookie_value(&headers, REFRESH_COOKIE)
        .or_else(|| {
            body.and_then(|Json(b)| {
                (!b.refresh_token.is_empty()).then_some(b.refresh_token)
            })
        })
        .ok_or_else(|| ApiError::Unauthorized("Unauthorized request".into()))?;

    let keys = JwtKeys::from_ref(&state);
    let claims = keys.verify_refresh(&presented).map_err(|e| {
        warn!(error = %e, "refresh token rejected");
        ApiError::Unauthorized("Unauthorized request".into())
    })?;

    let user = User::find_by_id(&state.db, claims.sub)
        .await
        .map_err(ApiError::Internal)?
        .ok_or_else(|| ApiError::Unauthorized("Invalid refresh token".into()))?;

    if user.refresh_token.as_deref() != Some(presented.as_str()) {
        warn!(user_id = %user.id, "rotated-out refresh token presented");
        return Err(ApiError::Unauthorized(
            "Refresh token is expired or used".into(),
        ));
    }

    let pair = issue_token_pair(&state.db, &keys, &user)
        .await
        .map_err(ApiError::Internal)?;

    let cookies = AppendHeaders([
        (
            header::SET_COOKIE,
            token_cookie(ACCESS_COOKIE, &pair.access_token, keys.access_ttl),
        ),
        (
            header::SET_COOKIE,
            token_cookie(REFRESH_COOKIE, &pair.refresh_token, keys.refresh_ttl),
        ),
    ]);

    Ok((
        cookies,
        ApiResponse::ok(
            "Access token refreshed successfully",
            TokenPairBody {
                access_token: pair.access_token,
                refresh_token: pair.refresh_token,
            },
        ),
    ))
}

#[instrument(skip(state, user))]
pub async fn logout(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<impl IntoResponse> {
    revoke_session(&state.db, user.id)
        .await
        .map_err(ApiError::Internal)?;

    info!(user_id = %user.id, "user logged out");

    let cookies = AppendHeaders([
        (header::SET_COOKIE, clear_cookie(ACCESS_COOKIE)),
        (header::SET_COOKIE, clear_cookie(REFRESH_COOKIE)),
    ]);

    Ok((
        cookies,
        ApiResponse::ok("Logout successful", serde_json::json!({})),
    ))
}

#[instrument(skip(state, user, payload))]
pub async fn change_password(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<ChangePasswordRequest>,
) -> ApiResult<impl IntoResponse> {
    if payload.old_password.trim().is_empty() || payload.new_password.trim().is_empty() {
        return Err(ApiError::BadRequest("All fields are required".into()));
    }

    let ok = verify_password(&payload.old_password, &user.password_hash)
        .map_err(ApiError::Internal)?;
    if !ok {
        return Err(ApiError::BadRequest("Incorrect old password".into()));
    }

    let hash = hash_password(payload.new_password.trim()).map_err(ApiError::Internal)?;
    User::update_password(&state.db, user.id, &hash)
        .await
        .map_err(ApiError::Internal)?;

    info!(user_id = %user.id, "password changed");
    Ok(ApiResponse::ok(
        "Password changed successfully",
        serde_json::json!({}),
    ))
}
