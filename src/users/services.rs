use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, warn};
use uuid::Uuid;

use super::dto::PublicUser;
use super::repo::{NewUser, User};
use crate::auth::hash_password;
use crate::error::ApiError;
use crate::media::remove_local_files;
use crate::state::AppState;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// Registration input after multipart parsing: text fields plus the
/// spool paths of any received files (empty when the slot was absent).
#[derive(Debug, Default)]
pub struct RegistrationForm {
    pub full_name: String,
    pub username: String,
    pub email: String,
    pub password: String,
    pub avatar_path: String,
    pub cover_path: String,
}

/// Create an account. Every early exit removes whatever spool files
/// were already received; the upload gateway owns cleanup once a file
/// is handed to it.
pub async fn register_user(
    state: &AppState,
    form: RegistrationForm,
) -> Result<PublicUser, ApiError> {
    let spooled = [form.avatar_path.clone(), form.cover_path.clone()];

    let full_name = form.full_name.trim().to_string();
    let username = form.username.trim().to_lowercase();
    let email = form.email.trim().to_lowercase();
    let password = form.password.trim().to_string();

    if full_name.is_empty() || username.is_empty() || email.is_empty() || password.is_empty() {
        remove_local_files(&spooled).await;
        return Err(ApiError::BadRequest("All fields are required".into()));
    }
    if !is_valid_email(&email) {
        remove_local_files(&spooled).await;
        return Err(ApiError::BadRequest("Invalid email".into()));
    }

    match User::find_by_identity(&state.db, &username, &email).await {
        Ok(Some(_)) => {
            warn!(username = %username, "registration with taken identity");
            remove_local_files(&spooled).await;
            return Err(ApiError::Conflict("User already exists".into()));
        }
        Ok(None) => {}
        Err(e) => {
            remove_local_files(&spooled).await;
            return Err(ApiError::Internal(e));
        }
    }

    if form.avatar_path.is_empty() {
        remove_local_files(std::slice::from_ref(&form.cover_path)).await;
        return Err(ApiError::BadRequest("Avatar is required".into()));
    }

    // Avatar and cover go to the asset store concurrently; a failed
    // cover upload is tolerated because the cover is optional.
    let (avatar, cover) = tokio::join!(
        state.media.upload(&form.avatar_path),
        state.media.upload(&form.cover_path)
    );
    let Some(avatar) = avatar else {
        return Err(ApiError::BadRequest("Error uploading avatar".into()));
    };

    let password_hash = hash_password(&password).map_err(ApiError::Internal)?;

    let user = User::create(
        &state.db,
        NewUser {
            username: &username,
            email: &email,
            full_name: &full_name,
            password_hash: &password_hash,
            avatar: &avatar,
            cover: cover.as_ref(),
        },
    )
    .await
    .map_err(ApiError::Internal)?;

    info!(user_id = %user.id, username = %user.username, "user registered");
    Ok(PublicUser::from(user))
}

/// Replace the avatar: upload new, delete old, then persist the new
/// reference. The old asset is deleted before the row update, so a
/// failure between the two leaves the row pointing at a gone asset;
/// same-account concurrent replaces can also interleave here. Single
/// writer per account is assumed.
pub async fn replace_avatar(
    state: &AppState,
    user_id: Uuid,
    local_path: String,
) -> Result<PublicUser, ApiError> {
    if local_path.is_empty() {
        return Err(ApiError::BadRequest("Avatar is required".into()));
    }

    let Some(asset) = state.media.upload(&local_path).await else {
        return Err(ApiError::BadRequest("Unable to upload avatar".into()));
    };

    let current = User::find_by_id(&state.db, user_id)
        .await
        .map_err(ApiError::Internal)?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;

    if !state.media.delete(&current.avatar_asset_id).await {
        return Err(ApiError::BadRequest("Unable to delete old avatar".into()));
    }

    let updated = User::update_avatar(&state.db, user_id, &asset)
        .await
        .map_err(ApiError::Internal)?;

    info!(user_id = %user_id, asset_id = %asset.asset_id, "avatar replaced");
    Ok(PublicUser::from(updated))
}

pub async fn replace_cover(
    state: &AppState,
    user_id: Uuid,
    local_path: String,
) -> Result<PublicUser, ApiError> {
    if local_path.is_empty() {
        return Err(ApiError::BadRequest("Cover image is required".into()));
    }

    let Some(asset) = state.media.upload(&local_path).await else {
        return Err(ApiError::BadRequest("Unable to upload cover image".into()));
    };

    let current = User::find_by_id(&state.db, user_id)
        .await
        .map_err(ApiError::Internal)?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;

    // No previous cover means nothing to delete.
    if !current.cover_asset_id.is_empty() && !state.media.delete(&current.cover_asset_id).await {
        return Err(ApiError::BadRequest("Unable to delete old cover image".into()));
    }

    let updated = User::update_cover(&state.db, user_id, &asset)
        .await
        .map_err(ApiError::Internal)?;

    info!(user_id = %user_id, asset_id = %asset.asset_id, "cover image replaced");
    Ok(PublicUser::from(updated))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn email_validation_accepts_plain_addresses() {
        assert!(is_valid_email("a@x.com"));
        assert!(is_valid_email("alice.a+tag@sub.example.org"));
        assert!(!is_valid_email("not-an-email"));
        assert!(!is_valid_email("a@b"));
        assert!(!is_valid_email("a b@x.com"));
    }

    async fn spooled(dir: &tempfile::TempDir, name: &str) -> String {
        let path = dir.path().join(name).to_string_lossy().into_owned();
        tokio::fs::write(&path, b"bytes").await.unwrap();
        path
    }

    #[tokio::test]
    async fn blank_field_rejects_and_removes_spooled_files() {
        let state = AppState::fake();
        let dir = tempfile::tempdir().unwrap();
        let avatar = spooled(&dir, "avatar.png").await;
        let cover = spooled(&dir, "cover.png").await;

        let form = RegistrationForm {
            full_name: "Alice A".into(),
            username: "alice".into(),
            email: "a@x.com".into(),
            password: "   ".into(),
            avatar_path: avatar.clone(),
            cover_path: cover.clone(),
        };

        let err = register_user(&state, form).await.unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));
        assert!(!Path::new(&avatar).exists());
        assert!(!Path::new(&cover).exists());
    }

    #[tokio::test]
    async fn invalid_email_rejects_and_removes_spooled_files() {
        let state = AppState::fake();
        let dir = tempfile::tempdir().unwrap();
        let avatar = spooled(&dir, "avatar.png").await;

        let form = RegistrationForm {
            full_name: "Alice A".into(),
            username: "alice".into(),
            email: "nope".into(),
            password: "secret123".into(),
            avatar_path: avatar.clone(),
            cover_path: String::new(),
        };

        let err = register_user(&state, form).await.unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));
        assert!(!Path::new(&avatar).exists());
    }

    #[tokio::test]
    async fn replace_avatar_without_file_is_bad_request() {
        let state = AppState::fake();
        let err = replace_avatar(&state, Uuid::new_v4(), String::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));
    }
}
