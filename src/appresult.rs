use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::model::InvalidTelegramId;

pub type AppResult<T> = Result<T, AppError>;

/// Error returned by every handler. Client errors carry their message to the
/// caller; server errors are logged and answered with a generic body.
#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub error: anyhow::Error,
}

impl AppError {
    pub fn new(status: StatusCode, error: impl Into<anyhow::Error>) -> Self {
        Self { status, error: error.into() }
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, anyhow::Error::msg(msg.into()))
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, anyhow::Error::msg(msg.into()))
    }

    pub fn method_not_allowed() -> Self {
        Self::new(StatusCode::METHOD_NOT_ALLOWED, anyhow::Error::msg("Method Not Allowed"))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let message = if self.status.is_server_error() {
            tracing::error!(status = %self.status, error = ?self.error, "request failed");
            "Internal Server Error".to_owned()
        } else {
            tracing::debug!(status = %self.status, error = %self.error, "request rejected");
            self.error.to_string()
        };

        (self.status, Json(json!({ "error": message }))).into_response()
    }
}

impl From<String> for AppError {
    fn from(err: String) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, anyhow::Error::msg(err))
    }
}

impl From<&str> for AppError {
    fn from(err: &str) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, anyhow::Error::msg(err.to_owned()))
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, err)
    }
}

macro_rules! apperr_impl {
    ($E:ty) => {
        impl From<$E> for AppError {
            fn from(err: $E) -> Self {
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, err)
            }
        }
    };
}

apperr_impl!(serde_json::Error);
apperr_impl!(sqlx::Error);
apperr_impl!(reqwest::Error);

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::bad_request(format!("Invalid data: {}", rejection.body_text()))
    }
}

impl From<InvalidTelegramId> for AppError {
    fn from(err: InvalidTelegramId) -> Self {
        Self::bad_request(err.to_string())
    }
}
