use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use tracing::instrument;

use super::dto::{ChannelProfile, PublicUser, UpdateAccountRequest, WatchHistoryVideo};
use super::repo::{self, User};
use super::services::{self, is_valid_email, RegistrationForm};
use crate::auth::extractors::CurrentUser;
use crate::error::{ApiError, ApiResult};
use crate::media::{remove_local_files, spool_upload};
use crate::response::ApiResponse;
use crate::state::AppState;

fn bad_multipart(e: axum::extract::multipart::MultipartError) -> ApiError {
    ApiError::BadRequest(format!("Invalid multipart body: {}", e))
}

async fn read_registration(
    state: &AppState,
    mp: &mut Multipart,
    form: &mut RegistrationForm,
) -> Result<(), ApiError> {
    while let Ok(Some(field)) = mp.next_field().await {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("fullName") => form.full_name = field.text().await.map_err(bad_multipart)?,
            Some("username") => form.username = field.text().await.map_err(bad_multipart)?,
            Some("email") => form.email = field.text().await.map_err(bad_multipart)?,
            Some("password") => form.password = field.text().await.map_err(bad_multipart)?,
            Some("avatar") => {
                let file_name = field.file_name().map(str::to_string);
                let data = field.bytes().await.map_err(bad_multipart)?;
                form.avatar_path =
                    spool_upload(&state.config.media.upload_dir, file_name.as_deref(), data)
                        .await
                        .map_err(ApiError::Internal)?;
            }
            Some("coverImage") => {
                let file_name = field.file_name().map(str::to_string);
                let data = field.bytes().await.map_err(bad_multipart)?;
                form.cover_path =
                    spool_upload(&state.config.media.upload_dir, file_name.as_deref(), data)
                        .await
                        .map_err(ApiError::Internal)?;
            }
            _ => {}
        }
    }
    Ok(())
}

/// POST /register — multipart form: text fields fullName, username,
/// email, password; file fields avatar (required) and coverImage.
#[instrument(skip(state, mp))]
pub async fn register(
    State(state): State<AppState>,
    mut mp: Multipart,
) -> ApiResult<impl IntoResponse> {
    let mut form = RegistrationForm::default();

    if let Err(e) = read_registration(&state, &mut mp, &mut form).await {
        // anything already spooled must not outlive the failed request
        remove_local_files(&[form.avatar_path.clone(), form.cover_path.clone()]).await;
        return Err(e);
    }

    let user = services::register_user(&state, form).await?;
    Ok((
        StatusCode::CREATED,
        ApiResponse::ok("User created successfully", user),
    ))
}

#[instrument(skip(user))]
pub async fn current_user(CurrentUser(user): CurrentUser) -> impl IntoResponse {
    ApiResponse::ok("Current user", PublicUser::from(user))
}

#[instrument(skip(state, user, payload))]
pub async fn update_account(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<UpdateAccountRequest>,
) -> ApiResult<impl IntoResponse> {
    let full_name = payload.full_name.trim().to_string();
    let email = payload.email.trim().to_lowercase();

    if full_name.is_empty() || email.is_empty() {
        return Err(ApiError::BadRequest("All fields are required".into()));
    }
    if !is_valid_email(&email) {
        return Err(ApiError::BadRequest("Invalid email".into()));
    }

    let updated = User::update_account(&state.db, user.id, &full_name, &email)
        .await
        .map_err(ApiError::Internal)?;

    Ok(ApiResponse::ok(
        "Account details updated successfully",
        PublicUser::from(updated),
    ))
}

/// Pull the single expected file field out of a multipart body and
/// spool it. Empty string when the field never arrived.
async fn spool_single_file(
    state: &AppState,
    mp: &mut Multipart,
    field_name: &str,
) -> Result<String, ApiError> {
    while let Ok(Some(field)) = mp.next_field().await {
        let name = field.name().map(str::to_string);
        if name.as_deref() == Some(field_name) {
            let file_name = field.file_name().map(str::to_string);
            let data = field.bytes().await.map_err(bad_multipart)?;
            return spool_upload(&state.config.media.upload_dir, file_name.as_deref(), data)
                .await
                .map_err(ApiError::Internal);
        }
    }
    Ok(String::new())
}

#[instrument(skip(state, user, mp))]
pub async fn update_avatar(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    mut mp: Multipart,
) -> ApiResult<impl IntoResponse> {
    let local_path = spool_single_file(&state, &mut mp, "avatar").await?;
    let updated = services::replace_avatar(&state, user.id, local_path).await?;
    Ok(ApiResponse::ok("Avatar updated successfully", updated))
}

#[instrument(skip(state, user, mp))]
pub async fn update_cover(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    mut mp: Multipart,
) -> ApiResult<impl IntoResponse> {
    let local_path = spool_single_file(&state, &mut mp, "coverImage").await?;
    let updated = services::replace_cover(&state, user.id, local_path).await?;
    Ok(ApiResponse::ok("Cover image updated successfully", updated))
}

#[instrument(skip(state, viewer))]
pub async fn channel_profile(
    State(state): State<AppState>,
    CurrentUser(viewer): CurrentUser,
    Path(username): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let username = username.trim().to_lowercase();
    if username.is_empty() {
        return Err(ApiError::BadRequest("Username is required".into()));
    }

    let profile = repo::channel_profile(&state.db, &username, viewer.id)
        .await
        .map_err(ApiError::Internal)?
        .ok_or_else(|| ApiError::NotFound("Channel does not exist".into()))?;

    Ok(ApiResponse::ok(
        "User channel fetched successfully",
        ChannelProfile::from(profile),
    ))
}

#[instrument(skip(state, user))]
pub async fn watch_history(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<impl IntoResponse> {
    let rows = repo::watch_history(&state.db, user.id)
        .await
        .map_err(ApiError::Internal)?;
    let videos: Vec<WatchHistoryVideo> = rows.into_iter().map(WatchHistoryVideo::from).collect();

    Ok(ApiResponse::ok("Watch history fetched successfully", videos))
}
