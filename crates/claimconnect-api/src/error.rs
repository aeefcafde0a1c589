use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;

/// Every handler failure is converted into one of these before it leaves the
/// request. Clients always see a `{"message": "..."}` body; storage failures
/// keep their cause in the server log only.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Uploaded file is too large")]
    PayloadTooLarge,

    #[error("Database error")]
    Database(#[from] anyhow::Error),

    #[error("Server error")]
    Internal,
}

impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::Validation(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        ApiError::Conflict(message.into())
    }

    /// For `spawn_blocking` handles: a lost worker is a server bug, not a
    /// client error.
    pub fn join_error(e: tokio::task::JoinError) -> Self {
        error!("spawn_blocking join error: {}", e);
        ApiError::Internal
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::Database(cause) => {
                error!("Database failure: {:#}", cause);
                StatusCode::INTERNAL_SERVER_ERROR
            }
            ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(serde_json::json!({ "message": self.to_string() }));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credential_errors_are_indistinguishable() {
        // unknown email and wrong password share one variant, so the body
        // cannot leak which field was wrong
        assert_eq!(
            ApiError::InvalidCredentials.to_string(),
            "Invalid email or password"
        );
    }

    #[test]
    fn test_database_error_hides_cause() {
        let err = ApiError::Database(anyhow::anyhow!("UNIQUE constraint failed: users.email"));
        assert_eq!(err.to_string(), "Database error");
    }
}
