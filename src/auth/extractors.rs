use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use tracing::warn;

use super::cookies::{cookie_value, ACCESS_COOKIE};
use super::jwt::JwtKeys;
use crate::error::ApiError;
use crate::state::AppState;
use crate::users::repo::User;

/// Guard for protected routes: pulls the access token from the cookie
/// or the Authorization header, verifies it, and loads the referenced
/// user for the handler. Credential fields never leave the handler
/// because responses are built from `PublicUser`.
pub struct CurrentUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let bearer = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer ").or_else(|| v.strip_prefix("bearer ")))
            .map(str::to_string);

        let token = cookie_value(&parts.headers, ACCESS_COOKIE)
            .or(bearer)
            .ok_or_else(|| ApiError::Unauthorized("Unauthorized request".into()))?;

        let keys = JwtKeys::from_ref(state);
        let claims = keys.verify_access(&token).map_err(|e| {
            warn!(error = %e, "access token rejected");
            ApiError::Unauthorized("Invalid access token".into())
        })?;

        let user = User::find_by_id(&state.db, claims.sub)
            .await
            .map_err(ApiError::Internal)?
            .ok_or_else(|| ApiError::Unauthorized("Invalid access token".into()))?;

        Ok(CurrentUser(user))
    }
}
