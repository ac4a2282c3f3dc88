use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::media::MediaAsset;

/// User record in the database. Never serialized directly; responses go
/// through `PublicUser` so credential fields cannot leak.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub password_hash: String,
    pub avatar_asset_id: String,
    pub avatar_url: String,
    pub cover_asset_id: String,
    pub cover_url: String,
    pub refresh_token: Option<String>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

pub struct NewUser<'a> {
    pub username: &'a str,
    pub email: &'a str,
    pub full_name: &'a str,
    pub password_hash: &'a str,
    pub avatar: &'a MediaAsset,
    pub cover: Option<&'a MediaAsset>,
}

const USER_COLUMNS: &str = "id, username, email, full_name, password_hash, \
     avatar_asset_id, avatar_url, cover_asset_id, cover_url, refresh_token, \
     created_at, updated_at";

impl User {
    pub async fn find_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    /// Find a user holding either of the presented identifiers.
    pub async fn find_by_identity(
        db: &PgPool,
        username: &str,
        email: &str,
    ) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE username = $1 OR email = $2"
        ))
        .bind(username)
        .bind(email)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    pub async fn create(db: &PgPool, new: NewUser<'_>) -> anyhow::Result<User> {
        let (cover_asset_id, cover_url) = new
            .cover
            .map(|c| (c.asset_id.as_str(), c.url.as_str()))
            .unwrap_or(("", ""));
        let user = sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users \
                 (username, email, full_name, password_hash, \
                  avatar_asset_id, avatar_url, cover_asset_id, cover_url) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             RETURNING {USER_COLUMNS}"
        ))
        .bind(new.username)
        .bind(new.email)
        .bind(new.full_name)
        .bind(new.password_hash)
        .bind(&new.avatar.asset_id)
        .bind(&new.avatar.url)
        .bind(cover_asset_id)
        .bind(cover_url)
        .fetch_one(db)
        .await?;
        Ok(user)
    }

    /// Set or clear the single active refresh token. Setting a new value
    /// is the rotation point: whatever token was stored before can no
    /// longer pass the equality check at refresh time.
    pub async fn set_refresh_token(
        db: &PgPool,
        id: Uuid,
        refresh_token: Option<&str>,
    ) -> anyhow::Result<()> {
        sqlx::query("UPDATE users SET refresh_token = $2, updated_at = now() WHERE id = $1")
            .bind(id)
            .bind(refresh_token)
            .execute(db)
            .await?;
        Ok(())
    }

    pub async fn update_password(db: &PgPool, id: Uuid, password_hash: &str) -> anyhow::Result<()> {
        sqlx::query("UPDATE users SET password_hash = $2, updated_at = now() WHERE id = $1")
            .bind(id)
            .bind(password_hash)
            .execute(db)
            .await?;
        Ok(())
    }

    pub async fn update_account(
        db: &PgPool,
        id: Uuid,
        full_name: &str,
        email: &str,
    ) -> anyhow::Result<User> {
        let user = sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET full_name = $2, email = $3, updated_at = now() \
             WHERE id = $1 RETURNING {USER_COLUMNS}"
        ))
        .bind(id)
        .bind(full_name)
        .bind(email)
        .fetch_one(db)
        .await?;
        Ok(user)
    }

    pub async fn update_avatar(
        db: &PgPool,
        id: Uuid,
        asset: &MediaAsset,
    ) -> anyhow::Result<User> {
        let user = sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET avatar_asset_id = $2, avatar_url = $3, updated_at = now() \
             WHERE id = $1 RETURNING {USER_COLUMNS}"
        ))
        .bind(id)
        .bind(&asset.asset_id)
        .bind(&asset.url)
        .fetch_one(db)
        .await?;
        Ok(user)
    }

    pub async fn update_cover(db: &PgPool, id: Uuid, asset: &MediaAsset) -> anyhow::Result<User> {
        let user = sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET cover_asset_id = $2, cover_url = $3, updated_at = now() \
             WHERE id = $1 RETURNING {USER_COLUMNS}"
        ))
        .bind(id)
        .bind(&asset.asset_id)
        .bind(&asset.url)
        .fetch_one(db)
        .await?;
        Ok(user)
    }
}

/// Channel page aggregation row: one user joined with subscription
/// counts and the viewer's own subscription state, computed per request.
#[derive(Debug, Clone, FromRow)]
pub struct ChannelProfileRow {
    pub id: Uuid,
    pub username: String,
    pub full_name: String,
    pub avatar_url: String,
    pub cover_url: String,
    pub subscriber_count: i64,
    pub subscribed_to_count: i64,
    pub is_subscribed: bool,
}

pub async fn channel_profile(
    db: &PgPool,
    username: &str,
    viewer_id: Uuid,
) -> anyhow::Result<Option<ChannelProfileRow>> {
    let row = sqlx::query_as::<_, ChannelProfileRow>(
        r#"
        SELECT u.id,
               u.username,
               u.full_name,
               u.avatar_url,
               u.cover_url,
               (SELECT COUNT(*) FROM subscriptions s WHERE s.channel_id = u.id)
                   AS subscriber_count,
               (SELECT COUNT(*) FROM subscriptions s WHERE s.subscriber_id = u.id)
                   AS subscribed_to_count,
               EXISTS(SELECT 1 FROM subscriptions s
                       WHERE s.channel_id = u.id AND s.subscriber_id = $2)
                   AS is_subscribed
        FROM users u
        WHERE u.username = $1
        "#,
    )
    .bind(username)
    .bind(viewer_id)
    .fetch_optional(db)
    .await?;
    Ok(row)
}

/// One watched video joined with its owner's summary.
#[derive(Debug, Clone, FromRow)]
pub struct WatchHistoryRow {
    pub video_id: Uuid,
    pub title: String,
    pub thumbnail_url: String,
    pub duration_secs: i32,
    pub views: i64,
    pub created_at: OffsetDateTime,
    pub owner_id: Uuid,
    pub owner_username: String,
    pub owner_full_name: String,
    pub owner_avatar_url: String,
}

pub async fn watch_history(db: &PgPool, user_id: Uuid) -> anyhow::Result<Vec<WatchHistoryRow>> {
    let rows = sqlx::query_as::<_, WatchHistoryRow>(
        r#"
        SELECT v.id            AS video_id,
               v.title,
               v.thumbnail_url,
               v.duration_secs,
               v.views,
               v.created_at,
               o.id            AS owner_id,
               o.username      AS owner_username,
               o.full_name     AS owner_full_name,
               o.avatar_url    AS owner_avatar_url
        FROM watch_history wh
        JOIN videos v ON v.id = wh.video_id
        JOIN users o ON o.id = v.owner_id
        WHERE wh.user_id = $1
        ORDER BY wh.watched_at DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(db)
    .await?;
    Ok(rows)
}
