use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde_json::json;
use thiserror::Error;

use crate::constants::*;
use crate::store::StoreError;

/// Application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Task join error: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("User not found")]
    UserNotFound,

    #[error("User not found and no email to create one")]
    UnknownUserWithoutEmail,

    #[error("Saved post not found")]
    SavedPostNotFound,

    #[error("Post already saved")]
    AlreadySaved,

    /// Both storage tiers failed
    #[error("Server error: {0}")]
    ServerError(String),
}

impl AppError {
    /// Whether the storage tier itself broke, as opposed to a domain outcome.
    /// Only these trigger failover.
    pub fn is_backend_failure(&self) -> bool {
        matches!(self, AppError::Store(_) | AppError::TaskJoin(_))
    }
}

/// Implement IntoResponse to convert AppError into HTTP responses
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            AppError::Store(ref e) => {
                tracing::error!("Store error: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, CODE_SERVER_ERROR, "Server error")
            }
            AppError::TaskJoin(ref e) => {
                tracing::error!("Task join error: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, CODE_SERVER_ERROR, "Server error")
            }
            AppError::ServerError(ref e) => {
                tracing::error!("All storage tiers failed: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    CODE_SERVER_ERROR,
                    "Something went wrong",
                )
            }
            AppError::InvalidInput(ref msg) => {
                (StatusCode::BAD_REQUEST, CODE_INVALID_INPUT, msg.as_str())
            }
            AppError::UserNotFound => {
                (StatusCode::NOT_FOUND, CODE_USER_NOT_FOUND, ERR_USER_NOT_FOUND)
            }
            AppError::UnknownUserWithoutEmail => (
                StatusCode::NOT_FOUND,
                CODE_USER_NOT_FOUND,
                ERR_USER_NOT_FOUND_NO_EMAIL,
            ),
            AppError::SavedPostNotFound => (
                StatusCode::NOT_FOUND,
                CODE_SAVED_POST_NOT_FOUND,
                ERR_SAVED_POST_NOT_FOUND,
            ),
            // Duplicate saves answer 400, as existing clients expect
            AppError::AlreadySaved => {
                (StatusCode::BAD_REQUEST, CODE_ALREADY_SAVED, ERR_ALREADY_SAVED)
            }
        };

        let body = Json(json!({
            "success": false,
            "message": message,
            "code": code,
            "timestamp": Utc::now().to_rfc3339(),
        }));

        (status, body).into_response()
    }
}

/// Result type alias for application results
pub type Result<T> = std::result::Result<T, AppError>;
