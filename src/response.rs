use axum::Json;
use serde::Serialize;

/// Success envelope: `{message, data}`.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub message: String,
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(message: impl Into<String>, data: T) -> Json<Self> {
        Json(Self {
            message: message.into(),
            data,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_has_message_and_data() {
        let Json(body) = ApiResponse::ok("Login successful", serde_json::json!({"ok": true}));
        let json = serde_json::to_string(&body).unwrap();
        assert!(json.contains("\"message\":\"Login successful\""));
        assert!(json.contains("\"data\""));
    }
}
