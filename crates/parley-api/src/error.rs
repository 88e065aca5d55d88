use std::fmt;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// What went wrong; decides the HTTP status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    BadRequest,
    Unauthorized,
    Forbidden,
    NotFound,
    RateLimit,
    Offline,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::BadRequest => "bad_request",
            ErrorKind::Unauthorized => "unauthorized",
            ErrorKind::Forbidden => "forbidden",
            ErrorKind::NotFound => "not_found",
            ErrorKind::RateLimit => "rate_limit",
            ErrorKind::Offline => "offline",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ErrorKind::BadRequest => StatusCode::BAD_REQUEST,
            ErrorKind::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorKind::Forbidden => StatusCode::FORBIDDEN,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::RateLimit => StatusCode::TOO_MANY_REQUESTS,
            ErrorKind::Offline => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which part of the API the error belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Surface {
    Chat,
    Api,
    Stream,
    Database,
}

impl Surface {
    pub fn as_str(&self) -> &'static str {
        match self {
            Surface::Chat => "chat",
            Surface::Api => "api",
            Surface::Stream => "stream",
            Surface::Database => "database",
        }
    }
}

impl fmt::Display for Surface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

const GENERIC_MESSAGE: &str = "Something went wrong. Please try again later.";

#[derive(Debug, Error)]
#[error("{kind}:{surface}")]
pub struct ApiError {
    pub kind: ErrorKind,
    pub surface: Surface,
    pub cause: Option<String>,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    code: String,
    message: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    cause: Option<String>,
}

impl ApiError {
    pub fn new(kind: ErrorKind, surface: Surface) -> Self {
        Self { kind, surface, cause: None }
    }

    pub fn with_cause(mut self, cause: impl Into<String>) -> Self {
        self.cause = Some(cause.into());
        self
    }

    pub fn bad_request(surface: Surface) -> Self {
        Self::new(ErrorKind::BadRequest, surface)
    }

    pub fn unauthorized(surface: Surface) -> Self {
        Self::new(ErrorKind::Unauthorized, surface)
    }

    pub fn forbidden(surface: Surface) -> Self {
        Self::new(ErrorKind::Forbidden, surface)
    }

    pub fn not_found(surface: Surface) -> Self {
        Self::new(ErrorKind::NotFound, surface)
    }

    /// `kind:surface`, e.g. `forbidden:chat`
    pub fn code(&self) -> String {
        format!("{}:{}", self.kind, self.surface)
    }

    pub fn status(&self) -> StatusCode {
        self.kind.status()
    }

    /// User-facing text for this error code
    pub fn message(&self) -> &'static str {
        if self.surface == Surface::Database {
            return GENERIC_MESSAGE;
        }

        match (self.kind, self.surface) {
            (ErrorKind::BadRequest, Surface::Api) => {
                "The request couldn't be processed. Please check your input and try again."
            }
            (ErrorKind::RateLimit, Surface::Chat) => {
                "You have exceeded your maximum number of messages for the day. Please try again later."
            }
            (ErrorKind::NotFound, Surface::Chat) => {
                "The requested chat was not found. Please check the chat ID and try again."
            }
            (ErrorKind::Forbidden, Surface::Chat) => {
                "This chat belongs to another user. Please check the chat ID and try again."
            }
            (ErrorKind::Unauthorized, Surface::Chat) => {
                "You need to sign in to view this chat. Please sign in and try again."
            }
            (ErrorKind::Offline, Surface::Chat) => {
                "We're having trouble sending your message. Please check your internet connection and try again."
            }
            (ErrorKind::NotFound, Surface::Stream) => "The requested stream was not found.",
            _ => GENERIC_MESSAGE,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Database details stay in the logs
        let body = if self.surface == Surface::Database {
            tracing::error!(code = %self.code(), cause = ?self.cause, "Database error");
            ErrorBody {
                code: String::new(),
                message: GENERIC_MESSAGE,
                cause: None,
            }
        } else {
            if self.kind == ErrorKind::Offline {
                tracing::error!(code = %self.code(), cause = ?self.cause, "Request failed");
            } else {
                tracing::debug!(code = %self.code(), cause = ?self.cause, "Request rejected");
            }
            ErrorBody {
                code: self.code(),
                message: self.message(),
                cause: self.cause,
            }
        };

        (status, Json(body)).into_response()
    }
}

impl From<parley_persist::PersistError> for ApiError {
    fn from(err: parley_persist::PersistError) -> Self {
        ApiError::bad_request(Surface::Database).with_cause(err.to_string())
    }
}

/// Anything not already classified ends up as `offline:chat`
impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError::new(ErrorKind::Offline, Surface::Chat).with_cause(err.to_string())
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(ApiError::bad_request(Surface::Api).status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::unauthorized(Surface::Chat).status(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::forbidden(Surface::Chat).status(), StatusCode::FORBIDDEN);
        assert_eq!(ApiError::not_found(Surface::Stream).status(), StatusCode::NOT_FOUND);
        assert_eq!(
            ApiError::new(ErrorKind::RateLimit, Surface::Chat).status(),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            ApiError::new(ErrorKind::Offline, Surface::Chat).status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn test_code_format() {
        assert_eq!(ApiError::forbidden(Surface::Chat).code(), "forbidden:chat");
        assert_eq!(ApiError::bad_request(Surface::Api).to_string(), "bad_request:api");
    }

    #[test]
    fn test_catch_all_is_offline_chat() {
        let err: ApiError = anyhow::anyhow!("stream registry unavailable").into();
        assert_eq!(err.code(), "offline:chat");
        assert_eq!(err.cause.as_deref(), Some("stream registry unavailable"));
    }

    #[test]
    fn test_persist_error_hides_details() {
        let err: ApiError = parley_persist::PersistError::Connection("refused".to_string()).into();
        assert_eq!(err.code(), "bad_request:database");
        assert_eq!(err.message(), GENERIC_MESSAGE);
    }
}
