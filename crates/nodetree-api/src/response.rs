//! Response envelope and error mapping

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

/// API response wrapper
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            count: None,
            data: Some(data),
            message: None,
        }
    }

    pub fn counted(data: T, count: usize) -> Self {
        Self {
            count: Some(count),
            ..Self::ok(data)
        }
    }
}

impl ApiResponse<()> {
    pub fn message(success: bool, message: impl Into<String>) -> Self {
        Self {
            success,
            count: None,
            data: None,
            message: Some(message.into()),
        }
    }
}

/// Errors a handler can return
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Core(#[from] nodetree_core::Error),

    /// Path id that is not a positive integer
    #[error("{0}")]
    InvalidPathId(&'static str),

    #[error("{0}")]
    NotFound(&'static str),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Core(e) => {
                StatusCode::from_u16(e.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
            }
            ApiError::InvalidPathId(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // Server-side failures are logged in full and never shown to the client
        let message = if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
            "Internal Server Error".to_string()
        } else {
            self.to_string()
        };

        (status, Json(ApiResponse::message(false, message))).into_response()
    }
}
