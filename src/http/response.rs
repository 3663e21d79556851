// Response mapping - converts core failures into JSON error payloads.
//
// Everything that leaves the API boundary as a failure goes through
// ApiError, so clients always see `{"error": ...}` with a meaningful
// status code and server-side detail stays in the logs.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::core::auth::AuthError;
use crate::core::comments::CommentError;

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    /// The persistence backend is not provisioned or failed to start.
    pub fn store_unavailable() -> Self {
        Self::new(
            StatusCode::SERVICE_UNAVAILABLE,
            "Comment storage is not configured",
        )
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!("CODE: {}, MESSAGE: {}", self.status.as_u16(), self.message);
        }
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

impl From<CommentError> for ApiError {
    fn from(err: CommentError) -> Self {
        match err {
            CommentError::MissingField(_)
            | CommentError::FieldTooLong { .. }
            | CommentError::InvalidEmail
            | CommentError::ParentNotFound => Self::new(StatusCode::BAD_REQUEST, err.to_string()),
            CommentError::RateLimited => {
                Self::new(StatusCode::TOO_MANY_REQUESTS, err.to_string())
            }
            CommentError::NotFound => Self::new(StatusCode::NOT_FOUND, err.to_string()),
            // Detail goes to the log, the client gets a generic message.
            CommentError::Storage(detail) => {
                tracing::error!("comment store failure: {detail}");
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        let status = match &err {
            AuthError::MissingCredential | AuthError::InvalidCredential => {
                StatusCode::UNAUTHORIZED
            }
            AuthError::NotAuthorized(_) => StatusCode::FORBIDDEN,
            AuthError::ProviderUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        };
        Self::new(status, err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn comment_errors_map_to_expected_statuses() {
        let cases = [
            (CommentError::MissingField("post"), StatusCode::BAD_REQUEST),
            (
                CommentError::FieldTooLong {
                    field: "name",
                    max: 100,
                },
                StatusCode::BAD_REQUEST,
            ),
            (CommentError::InvalidEmail, StatusCode::BAD_REQUEST),
            (CommentError::ParentNotFound, StatusCode::BAD_REQUEST),
            (CommentError::RateLimited, StatusCode::TOO_MANY_REQUESTS),
            (CommentError::NotFound, StatusCode::NOT_FOUND),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status, status);
        }
    }

    #[test]
    fn storage_detail_is_not_echoed_to_clients() {
        let err = ApiError::from(CommentError::Storage("secret path".into()));
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!err.message.contains("secret path"));
    }

    #[test]
    fn auth_errors_distinguish_401_403_503() {
        assert_eq!(
            ApiError::from(AuthError::MissingCredential).status,
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::from(AuthError::InvalidCredential).status,
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::from(AuthError::NotAuthorized("x".into())).status,
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            ApiError::from(AuthError::ProviderUnavailable("down".into())).status,
            StatusCode::SERVICE_UNAVAILABLE
        );
    }
}
