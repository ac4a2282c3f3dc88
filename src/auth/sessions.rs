use sqlx::PgPool;
use tracing::debug;

use super::jwt::JwtKeys;
use crate::users::repo::User;

pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Mint a fresh access+refresh pair and persist the refresh token on the
/// user row. Overwriting the stored value is what invalidates every
/// previously issued refresh token: the equality check at refresh time
/// no longer matches them. One field update per transition.
pub async fn issue_token_pair(db: &PgPool, keys: &JwtKeys, user: &User) -> anyhow::Result<TokenPair> {
    let access_token = keys.sign_access(user)?;
    let refresh_token = keys.sign_refresh(user.id)?;

    User::set_refresh_token(db, user.id, Some(&refresh_token)).await?;
    debug!(user_id = %user.id, "refresh token rotated");

    Ok(TokenPair {
        access_token,
        refresh_token,
    })
}

/// Drop the stored refresh token. Idempotent: clearing an already clear
/// field is a no-op.
pub async fn revoke_session(db: &PgPool, user_id: uuid::Uuid) -> anyhow::Result<()> {
    User::set_refresh_token(db, user_id, None).await
}
