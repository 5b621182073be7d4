use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use closet_shared::error::SessionError;
use closet_store::StoreError;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Unauthorized")]
    Unauthorized,

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("User already exists")]
    Duplicate,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Image too large: {size} bytes (max {max})")]
    ImageTooLarge { size: usize, max: usize },

    #[error("Too many requests")]
    TooManyRequests,

    #[error("Upstream failure: {0}")]
    Upstream(String),

    #[error("Server misconfiguration: {0}")]
    Misconfigured(String),

    #[error("Image storage error: {0}")]
    ImageStorage(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<StoreError> for ServerError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound => ServerError::NotFound("Not found".into()),
            StoreError::Duplicate => ServerError::Duplicate,
            StoreError::InvalidCredentials => ServerError::Unauthorized,
            StoreError::UnknownUser => ServerError::Unauthorized,
            StoreError::InvalidInput(msg) => ServerError::BadRequest(msg),
            other => ServerError::Internal(other.to_string()),
        }
    }
}

impl From<SessionError> for ServerError {
    fn from(e: SessionError) -> Self {
        tracing::debug!(error = %e, "Session rejected");
        ServerError::Unauthorized
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ServerError::Unauthorized => (StatusCode::UNAUTHORIZED, self.to_string()),
            ServerError::NotFound(_) => (StatusCode::NOT_FOUND, self.to_string()),
            ServerError::BadRequest(_) | ServerError::Duplicate => {
                (StatusCode::BAD_REQUEST, self.to_string())
            }
            ServerError::Forbidden(_) => (StatusCode::FORBIDDEN, self.to_string()),
            ServerError::ImageTooLarge { .. } => (StatusCode::PAYLOAD_TOO_LARGE, self.to_string()),
            ServerError::TooManyRequests => (StatusCode::TOO_MANY_REQUESTS, self.to_string()),
            ServerError::Upstream(detail) => {
                tracing::error!(detail = %detail, "Recommendation upstream failed");
                (
                    StatusCode::BAD_GATEWAY,
                    "Failed to generate recommendation".to_string(),
                )
            }
            ServerError::Misconfigured(_) => {
                tracing::error!(error = %self, "Refusing request");
                (StatusCode::INTERNAL_SERVER_ERROR, self.to_string())
            }
            ServerError::ImageStorage(detail) => {
                tracing::error!(detail = %detail, "Image storage failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Image storage error".to_string(),
                )
            }
            ServerError::Internal(detail) => {
                tracing::error!(detail = %detail, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        let body = serde_json::json!({
            "error": message,
        });

        (status, axum::Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_errors_map_to_taxonomy() {
        let cases = [
            (StoreError::NotFound, StatusCode::NOT_FOUND),
            (StoreError::Duplicate, StatusCode::BAD_REQUEST),
            (StoreError::InvalidCredentials, StatusCode::UNAUTHORIZED),
            (StoreError::UnknownUser, StatusCode::UNAUTHORIZED),
            (StoreError::InvalidInput("x".into()), StatusCode::BAD_REQUEST),
            (StoreError::Migration("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(ServerError::from(err).into_response().status(), status);
        }
    }

    #[test]
    fn misconfiguration_message_is_exposed() {
        let err = ServerError::Misconfigured("missing API key".into());
        assert_eq!(err.to_string(), "Server misconfiguration: missing API key");
        assert_eq!(
            err.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
