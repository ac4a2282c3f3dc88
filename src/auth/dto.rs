use serde::{Deserialize, Serialize};

use crate::users::dto::PublicUser;

/// Login contract: username, email and password all required, none
/// blank. Missing fields default to empty and are caught by validation
/// so the client gets the envelope instead of a deserialization error.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    #[serde(default)]
    pub old_password: String,
    #[serde(default)]
    pub new_password: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    #[serde(default)]
    pub refresh_token: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPairBody {
    pub access_token: String,
    pub refresh_token: String,
}

/// Body returned by login: the sanitized user plus both tokens (the
/// same tokens also travel as cookies).
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginData {
    pub user: PublicUser,
    pub access_token: String,
    pub refresh_token: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_request_defaults_missing_fields() {
        let req: LoginRequest = serde_json::from_str(r#"{"username":"alice"}"#).unwrap();
        assert_eq!(req.username, "alice");
        assert!(req.email.is_empty());
        assert!(req.password.is_empty());
    }

    #[test]
    fn change_password_uses_camel_case_field_names() {
        let req: ChangePasswordRequest =
            serde_json::from_str(r#"{"oldPassword":"a","newPassword":"b"}"#).unwrap();
        assert_eq!(req.old_password, "a");
        assert_eq!(req.new_password, "b");
    }

    #[test]
    fn token_pair_serializes_camel_case() {
        let body = TokenPairBody {
            access_token: "at".into(),
            refresh_token: "rt".into(),
        };
        let json = serde_json::to_string(&body).unwrap();
        assert!(json.contains("\"accessToken\":\"at\""));
        assert!(json.contains("\"refreshToken\":\"rt\""));
    }
}
