use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Application error types.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The price provider answered, but not with the data we asked for.
    #[error("Price provider error: {0}")]
    Provider(String),

    #[error("Not enough data: {available} samples available, {required} required")]
    InsufficientData { available: usize, required: usize },

    #[error("Internal error: {0}")]
    Internal(String),

    #[error(transparent)]
    Reqwest(#[from] reqwest::Error),
}

impl AppError {
    /// Whether the error should be shown as a "not enough data" label instead of a failure.
    pub fn is_insufficient_data(&self) -> bool {
        matches!(self, AppError::InsufficientData { .. })
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::InvalidConfig(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::Provider(msg) => (StatusCode::BAD_GATEWAY, msg.clone()),
            AppError::InsufficientData { .. } => {
                (StatusCode::UNPROCESSABLE_ENTITY, self.to_string())
            }
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
            AppError::Reqwest(e) => (StatusCode::BAD_GATEWAY, e.to_string()),
        };

        let body = Json(json!({
            "error": message,
            "status": status.as_u16(),
        }));

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
