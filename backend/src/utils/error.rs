use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rust_i18n::t;
use serde::Serialize;
use thiserror::Error;

use super::i18n::get_locale;

/// API error with rich context and automatic error trait implementations.
#[derive(Error, Debug)]
pub enum ApiError {
    // Resource errors 3xxx
    #[error("Unknown panel action: {0}")]
    ActionNotFound(String),

    // Validation errors 4xxx
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    // System errors 5xxx
    #[error("Internal error: {0}")]
    InternalError(String),

    // Generic wrapper for other errors - auto-convert from anyhow::Error
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ApiError {
    pub fn action_not_found(action: impl Into<String>) -> Self {
        Self::ActionNotFound(action.into())
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::InternalError(message.into())
    }

    /// Stable numeric code consumed by the frontend.
    pub fn error_code(&self) -> i32 {
        match self {
            Self::ActionNotFound(_) => 3001,
            Self::InvalidInput(_) => 4001,
            Self::InternalError(_) => 5001,
            Self::Other(_) => 5001,
        }
    }

    /// Localized error message based on the current request locale.
    pub fn localized_message(&self) -> String {
        let locale = get_locale();
        match self {
            Self::ActionNotFound(action) => {
                t!("error.action_not_found", locale = &locale, action = action).to_string()
            }
            Self::InvalidInput(msg) => msg.clone(),
            Self::InternalError(msg) => {
                t!("error.internal", locale = &locale, message = msg).to_string()
            }
            Self::Other(err) => {
                t!("error.internal", locale = &locale, message = err.to_string()).to_string()
            }
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ApiErrorResponse {
    pub code: i32,
    pub message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let code = self.error_code();
        let message = self.localized_message();

        let status = match code {
            3000..=3999 => StatusCode::NOT_FOUND,
            4001..=4999 => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let response = ApiErrorResponse { code, message };

        (status, Json(response)).into_response()
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::internal_error(format!("JSON serialization error: {}", err))
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
