//! HTTP error bodies.
//!
//! Every failure leaves the service as `{"error": "<message>"}`. The status
//! code depends on where the failure happened and on [`ErrorStatusPolicy`].

use crate::config::ErrorStatusPolicy;
use crate::error::{ErrorKind, ExtractError};
use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

/// Wire shape of every error response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// An error on its way out of a handler.
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

    /// The request carried no `file` part.
    pub fn missing_file() -> Self {
        Self::new(
            StatusCode::UNPROCESSABLE_ENTITY,
            "Missing multipart field 'file'",
        )
    }

    /// The multipart body itself was unreadable or too large.
    pub fn multipart(err: MultipartError) -> Self {
        Self::new(err.status(), err.body_text())
    }

    /// Map an extraction failure according to `policy`.
    pub fn from_extraction(err: &ExtractError, policy: ErrorStatusPolicy) -> Self {
        let status = match (policy, err.kind()) {
            (ErrorStatusPolicy::Strict, ErrorKind::InputRejected) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self::new(status, err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorResponse {
                error: self.message,
            }),
        )
            .into_response()
    }
}
