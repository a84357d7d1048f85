use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

/// Error taxonomy shared by every service in the workspace.
///
/// Validation and lookup failures carry their message through to the client;
/// everything in the 500 class is logged server-side and replaced by a
/// generic message in the response body.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation failed: {0}")]
    Validation(anyhow::Error),

    #[error("Duplicate key: {0}")]
    DuplicateKey(anyhow::Error),

    #[error("Not found: {0}")]
    NotFound(anyhow::Error),

    #[error("Unauthenticated: {0}")]
    Unauthenticated(anyhow::Error),

    #[error("Invalid token: {0}")]
    InvalidToken(anyhow::Error),

    #[error("Token expired")]
    TokenExpired,

    #[error("Query failed: {0}")]
    QueryFailed(anyhow::Error),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),

    #[error("Configuration error: {0}")]
    Config(anyhow::Error),
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Config(anyhow::Error::new(err))
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Internal(anyhow::Error::new(err))
    }
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::DuplicateKey(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Unauthenticated(_) | AppError::InvalidToken(_) | AppError::TokenExpired => {
                StatusCode::UNAUTHORIZED
            }
            AppError::QueryFailed(_) | AppError::Internal(_) | AppError::Config(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        #[derive(Serialize)]
        struct ErrorResponse {
            error: String,
        }

        let status = self.status_code();

        let error = match self {
            AppError::Validation(err) | AppError::DuplicateKey(err) => err.to_string(),
            AppError::NotFound(err) => err.to_string(),
            AppError::Unauthenticated(err) | AppError::InvalidToken(err) => err.to_string(),
            AppError::TokenExpired => "Token expired".to_string(),
            AppError::QueryFailed(err) => {
                tracing::error!(error = %err, "Store query failed");
                "Something went wrong!".to_string()
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "Unhandled internal error");
                "Something went wrong!".to_string()
            }
            AppError::Config(err) => {
                tracing::error!(error = %err, "Configuration error surfaced at request time");
                "Something went wrong!".to_string()
            }
        };

        (status, Json(ErrorResponse { error })).into_response()
    }
}
