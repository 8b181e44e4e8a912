//! Application error type.
//!
//! Every failure leaving a handler is an [`AppError`]: an HTTP status plus an
//! [`anyhow::Error`]. The client only ever sees the outermost message of the
//! error, wrapped in the [`ErrorResponse`] envelope:
//!
//! ```json
//! { "status": 404, "timestamp": "2026-01-01T00:00:00.000Z", "message": "User not found" }
//! ```
//!
//! For server errors the full cause chain is logged, so callers attach the
//! public message as `anyhow` context over the provider error:
//!
//! ```ignore
//! store.update(&path, fields)
//!     .await
//!     .context("Error updating user")
//!     .map_err(AppError::internal)?;
//! ```

use anyhow::Error;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Message returned whenever required input is absent.
pub const INVALID_INPUT: &str = "Invalid input data";

/// JSON body of every error response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// HTTP status code, repeated in the body
    pub status: u16,
    /// RFC 3339 UTC timestamp with millisecond precision
    pub timestamp: String,
    pub message: String,
}

/// Current time formatted the way error envelopes carry it.
pub fn timestamp_now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub error: Error,
}

impl AppError {
    pub fn new<E>(status: StatusCode, err: E) -> Self
    where
        E: Into<Error>,
    {
        Self {
            status,
            error: err.into(),
        }
    }

    pub fn message(status: StatusCode, message: impl Into<String>) -> Self {
        Self::new(status, Error::msg(message.into()))
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::message(StatusCode::BAD_REQUEST, message)
    }

    /// Shorthand for the 400 returned when a required field is absent.
    pub fn invalid_input() -> Self {
        Self::bad_request(INVALID_INPUT)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::message(StatusCode::UNAUTHORIZED, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::message(StatusCode::FORBIDDEN, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::message(StatusCode::NOT_FOUND, message)
    }

    pub fn internal<E>(err: E) -> Self
    where
        E: Into<Error>,
    {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, err)
    }

    /// The message sent to the client: the outermost context only.
    pub fn public_message(&self) -> String {
        self.error.to_string()
    }

    pub fn to_response_body(&self) -> ErrorResponse {
        ErrorResponse {
            status: self.status.as_u16(),
            timestamp: timestamp_now(),
            message: self.public_message(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(status = %self.status.as_u16(), error = %format!("{:#}", self.error), "Request failed");
        }

        (self.status, Json(self.to_response_body())).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<Error>,
{
    fn from(err: E) -> Self {
        AppError::internal(err)
    }
}
