use std::time::Duration;

use axum::extract::FromRef;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::debug;
use uuid::Uuid;

use crate::config::JwtConfig;
use crate::state::AppState;
use crate::users::repo::User;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

/// JWT payload. Access tokens carry the identity claims; refresh tokens
/// carry the subject only. `jti` makes every minted token unique, so two
/// pairs issued within the same second still rotate cleanly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub jti: Uuid,
    pub exp: usize,
    pub iat: usize,
    pub iss: String,
    pub aud: String,
    pub kind: TokenKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
}

/// Signing and verification material for both token classes. Access and
/// refresh use distinct secrets, so a token of one class never verifies
/// under the other's key.
#[derive(Clone)]
pub struct JwtKeys {
    access_encoding: EncodingKey,
    access_decoding: DecodingKey,
    refresh_encoding: EncodingKey,
    refresh_decoding: DecodingKey,
    issuer: String,
    audience: String,
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
}

impl JwtKeys {
    pub fn new(cfg: &JwtConfig) -> Self {
        Self {
            access_encoding: EncodingKey::from_secret(cfg.access.secret.as_bytes()),
            access_decoding: DecodingKey::from_secret(cfg.access.secret.as_bytes()),
            refresh_encoding: EncodingKey::from_secret(cfg.refresh.secret.as_bytes()),
            refresh_decoding: DecodingKey::from_secret(cfg.refresh.secret.as_bytes()),
            issuer: cfg.issuer.clone(),
            audience: cfg.audience.clone(),
            access_ttl: Duration::from_secs((cfg.access.ttl_minutes as u64) * 60),
            refresh_ttl: Duration::from_secs((cfg.refresh.ttl_minutes as u64) * 60),
        }
    }

    fn base_claims(&self, user_id: Uuid, kind: TokenKind) -> Claims {
        let now = OffsetDateTime::now_utc();
        let ttl = match kind {
            TokenKind::Access => self.access_ttl,
            TokenKind::Refresh => self.refresh_ttl,
        };
        let exp = now + TimeDuration::seconds(ttl.as_secs() as i64);
        Claims {
            sub: user_id,
            jti: Uuid::new_v4(),
            iat: now.unix_timestamp() as usize,
            exp: exp.unix_timestamp() as usize,
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
            kind,
            username: None,
            email: None,
            full_name: None,
        }
    }

    pub fn sign_access(&self, user: &User) -> anyhow::Result<String> {
        let mut claims = self.base_claims(user.id, TokenKind::Access);
        claims.username = Some(user.username.clone());
        claims.email = Some(user.email.clone());
        claims.full_name = Some(user.full_name.clone());
        let token = encode(&Header::default(), &claims, &self.access_encoding)?;
        debug!(user_id = %user.id, "access token signed");
        Ok(token)
    }

    pub fn sign_refresh(&self, user_id: Uuid) -> anyhow::Result<String> {
        let claims = self.base_claims(user_id, TokenKind::Refresh);
        let token = encode(&Header::default(), &claims, &self.refresh_encoding)?;
        debug!(user_id = %user_id, "refresh token signed");
        Ok(token)
    }

    fn verify(&self, token: &str, decoding: &DecodingKey, kind: TokenKind) -> anyhow::Result<Claims> {
        let mut validation = Validation::default();
        validation.set_audience(std::slice::from_ref(&self.audience));
        validation.set_issuer(std::slice::from_ref(&self.issuer));
        let data = decode::<Claims>(token, decoding, &validation)?;
        if data.claims.kind != kind {
            anyhow::bail!("wrong token kind");
        }
        debug!(user_id = %data.claims.sub, kind = ?kind, "token verified");
        Ok(data.claims)
    }

    pub fn verify_access(&self, token: &str) -> anyhow::Result<Claims> {
        self.verify(token, &self.access_decoding, TokenKind::Access)
    }

    pub fn verify_refresh(&self, token: &str) -> anyhow::Result<Claims> {
        self.verify(token, &self.refresh_decoding, TokenKind::Refresh)
    }
}

impl FromRef<AppState> for JwtKeys {
    fn from_ref(state: &AppState) -> Self {
        JwtKeys::new(&state.config.jwt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::OffsetDateTime;

    fn make_keys() -> JwtKeys {
        let state = AppState::fake();
        JwtKeys::from_ref(&state)
    }

    fn make_user() -> User {
        User {
            id: Uuid::new_v4(),
            username: "alice".into(),
            email: "a@x.com".into(),
            full_name: "Alice A".into(),
            password_hash: "hash".into(),
            avatar_asset_id: "cliptube/a.png".into(),
            avatar_url: "http://assets.local/a.png".into(),
            cover_asset_id: String::new(),
            cover_url: String::new(),
            refresh_token: None,
            created_at: OffsetDateTime::now_utc(),
            updated_at: OffsetDateTime::now_utc(),
        }
    }

    #[tokio::test]
    async fn access_token_carries_identity_claims() {
        let keys = make_keys();
        let user = make_user();
        let token = keys.sign_access(&user).expect("sign access");
        let claims = keys.verify_access(&token).expect("verify access");
        assert_eq!(claims.sub, user.id);
        assert_eq!(claims.kind, TokenKind::Access);
        assert_eq!(claims.username.as_deref(), Some("alice"));
        assert_eq!(claims.email.as_deref(), Some("a@x.com"));
        assert_eq!(claims.full_name.as_deref(), Some("Alice A"));
        assert_eq!(claims.iss, "test-issuer");
        assert_eq!(claims.aud, "test-aud");
    }

    #[tokio::test]
    async fn refresh_token_carries_subject_only() {
        let keys = make_keys();
        let user_id = Uuid::new_v4();
        let token = keys.sign_refresh(user_id).expect("sign refresh");
        let claims = keys.verify_refresh(&token).expect("verify refresh");
        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.kind, TokenKind::Refresh);
        assert!(claims.username.is_none());
        assert!(claims.email.is_none());
    }

    #[tokio::test]
    async fn consecutive_refresh_tokens_differ() {
        let keys = make_keys();
        let user_id = Uuid::new_v4();
        let a = keys.sign_refresh(user_id).expect("sign refresh");
        let b = keys.sign_refresh(user_id).expect("sign refresh");
        // same subject, same second: jti still makes them distinct
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn access_token_does_not_verify_as_refresh() {
        let keys = make_keys();
        let token = keys.sign_access(&make_user()).expect("sign access");
        // distinct secret: signature check fails before the kind check
        assert!(keys.verify_refresh(&token).is_err());
    }

    #[tokio::test]
    async fn refresh_token_does_not_verify_as_access() {
        let keys = make_keys();
        let token = keys.sign_refresh(Uuid::new_v4()).expect("sign refresh");
        assert!(keys.verify_access(&token).is_err());
    }

    #[tokio::test]
    async fn garbage_token_is_rejected() {
        let keys = make_keys();
        assert!(keys.verify_access("not.a.jwt").is_err());
        assert!(keys.verify_refresh("").is_err());
    }
}
