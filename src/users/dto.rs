use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use super::repo::{ChannelProfileRow, User, WatchHistoryRow};

/// Asset reference as exposed to clients. An absent cover image is an
/// empty reference, not a missing field.
#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaRef {
    pub asset_id: String,
    pub url: String,
}

/// Sanitized user: everything except credential fields.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub avatar: MediaRef,
    pub cover_image: MediaRef,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl From<User> for PublicUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            full_name: user.full_name,
            avatar: MediaRef {
                asset_id: user.avatar_asset_id,
                url: user.avatar_url,
            },
            cover_image: MediaRef {
                asset_id: user.cover_asset_id,
                url: user.cover_url,
            },
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAccountRequest {
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub email: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelProfile {
    pub id: Uuid,
    pub username: String,
    pub full_name: String,
    pub avatar_url: String,
    pub cover_url: String,
    pub subscriber_count: i64,
    pub subscribed_to_count: i64,
    pub is_subscribed: bool,
}

impl From<ChannelProfileRow> for ChannelProfile {
    fn from(row: ChannelProfileRow) -> Self {
        Self {
            id: row.id,
            username: row.username,
            full_name: row.full_name,
            avatar_url: row.avatar_url,
            cover_url: row.cover_url,
            subscriber_count: row.subscriber_count,
            subscribed_to_count: row.subscribed_to_count,
            is_subscribed: row.is_subscribed,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoOwner {
    pub id: Uuid,
    pub username: String,
    pub full_name: String,
    pub avatar_url: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchHistoryVideo {
    pub id: Uuid,
    pub title: String,
    pub thumbnail_url: String,
    pub duration_secs: i32,
    pub views: i64,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    pub owner: VideoOwner,
}

impl From<WatchHistoryRow> for WatchHistoryVideo {
    fn from(row: WatchHistoryRow) -> Self {
        Self {
            id: row.video_id,
            title: row.title,
            thumbnail_url: row.thumbnail_url,
            duration_secs: row.duration_secs,
            views: row.views,
            created_at: row.created_at,
            owner: VideoOwner {
                id: row.owner_id,
                username: row.owner_username,
                full_name: row.owner_full_name,
                avatar_url: row.owner_avatar_url,
            },
        }
    }
}
