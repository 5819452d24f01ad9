//! Error taxonomy for calls made through the request pipeline.

use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

use quizhub_core::DomainError;

use crate::store::StoreError;
use crate::transport::{HttpResponse, TransportError};

/// Error payload as sent by the server (the envelope minus `data`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    #[serde(default)]
    pub message: Option<String>,
    /// Field errors: either `{field: message}` or a list of messages.
    #[serde(default)]
    pub errors: Option<serde_json::Value>,
    #[serde(default)]
    pub path: Option<String>,
}

impl ErrorBody {
    /// Best-effort parse; a non-JSON body becomes the message verbatim.
    pub fn parse(raw: &[u8]) -> Self {
        if raw.is_empty() {
            return Self::default();
        }
        serde_json::from_slice(raw).unwrap_or_else(|_| Self {
            message: Some(String::from_utf8_lossy(raw).into_owned()),
            ..Self::default()
        })
    }
}

/// Why a credential renewal failed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RenewalError {
    #[error("renewal rejected with status {status}")]
    Rejected { status: u16, message: Option<String> },

    #[error("renewal response carried no credential")]
    MissingCredential,

    #[error("renewal transport failure: {0}")]
    Transport(#[from] TransportError),

    #[error("failed to persist renewed credential: {0}")]
    Store(String),

    #[error("renewal was aborted before it settled")]
    Aborted,
}

#[derive(Debug, Error)]
pub enum ApiError {
    /// No response was received (includes timeouts). Never retried here.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// 401 that is not recoverable: the login call, or a call that was
    /// already replayed once.
    #[error("unauthorized")]
    Unauthorized(ErrorBody),

    #[error("forbidden")]
    Forbidden(ErrorBody),

    #[error("not found")]
    NotFound(ErrorBody),

    /// 400: field-level validation feedback for the caller.
    #[error("validation failed")]
    Validation(ErrorBody),

    #[error("conflict")]
    Conflict(ErrorBody),

    #[error("server error ({status})")]
    Server { status: StatusCode, body: ErrorBody },

    #[error("unexpected status {status}")]
    Status { status: StatusCode, body: ErrorBody },

    /// The credential expired and could not be renewed.
    #[error(transparent)]
    Renewal(#[from] RenewalError),

    /// Rejected locally before any network call.
    #[error(transparent)]
    InvalidInput(#[from] DomainError),

    #[error("invalid response: {0}")]
    Decode(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ApiError {
    /// Classify a non-success response.
    pub fn from_response(response: &HttpResponse) -> Self {
        let body = ErrorBody::parse(&response.body);
        match response.status {
            StatusCode::UNAUTHORIZED => ApiError::Unauthorized(body),
            StatusCode::FORBIDDEN => ApiError::Forbidden(body),
            StatusCode::NOT_FOUND => ApiError::NotFound(body),
            StatusCode::BAD_REQUEST => ApiError::Validation(body),
            StatusCode::CONFLICT => ApiError::Conflict(body),
            status if status.is_server_error() => ApiError::Server { status, body },
            status => ApiError::Status { status, body },
        }
    }

    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ApiError::Unauthorized(_) => Some(StatusCode::UNAUTHORIZED),
            ApiError::Forbidden(_) => Some(StatusCode::FORBIDDEN),
            ApiError::NotFound(_) => Some(StatusCode::NOT_FOUND),
            ApiError::Validation(_) => Some(StatusCode::BAD_REQUEST),
            ApiError::Conflict(_) => Some(StatusCode::CONFLICT),
            ApiError::Server { status, .. } | ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn body(&self) -> Option<&ErrorBody> {
        match self {
            ApiError::Unauthorized(body)
            | ApiError::Forbidden(body)
            | ApiError::NotFound(body)
            | ApiError::Validation(body)
            | ApiError::Conflict(body)
            | ApiError::Server { body, .. }
            | ApiError::Status { body, .. } => Some(body),
            _ => None,
        }
    }

    /// Message the server attached to the error, if any.
    pub fn server_message(&self) -> Option<&str> {
        self.body()?.message.as_deref().filter(|m| !m.trim().is_empty())
    }

    /// What to show the user: the server's message, else this error's text.
    pub fn user_message(&self) -> String {
        self.server_message()
            .map(str::to_string)
            .unwrap_or_else(|| self.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(status: u16, body: &str) -> HttpResponse {
        HttpResponse::new(StatusCode::from_u16(status).unwrap(), body.as_bytes().to_vec())
    }

    #[test]
    fn classifies_statuses() {
        assert!(matches!(ApiError::from_response(&response(401, "")), ApiError::Unauthorized(_)));
        assert!(matches!(ApiError::from_response(&response(403, "")), ApiError::Forbidden(_)));
        assert!(matches!(ApiError::from_response(&response(404, "")), ApiError::NotFound(_)));
        assert!(matches!(ApiError::from_response(&response(400, "")), ApiError::Validation(_)));
        assert!(matches!(ApiError::from_response(&response(409, "")), ApiError::Conflict(_)));
        assert!(matches!(ApiError::from_response(&response(503, "")), ApiError::Server { .. }));
        assert!(matches!(ApiError::from_response(&response(418, "")), ApiError::Status { .. }));
    }

    #[test]
    fn keeps_field_errors_verbatim() {
        let err = ApiError::from_response(&response(
            400,
            r#"{"status":400,"message":"Validation failed","errors":{"email":"already used"}}"#,
        ));
        let body = err.body().unwrap();
        assert_eq!(body.errors.as_ref().unwrap()["email"], "already used");
        assert_eq!(err.user_message(), "Validation failed");
    }

    #[test]
    fn plain_text_body_becomes_message() {
        let err = ApiError::from_response(&response(500, "upstream exploded"));
        assert_eq!(err.server_message(), Some("upstream exploded"));
        assert_eq!(err.status(), Some(StatusCode::INTERNAL_SERVER_ERROR));
    }

    #[test]
    fn user_message_falls_back_to_display() {
        let err = ApiError::Transport(TransportError::Timeout);
        assert_eq!(err.user_message(), "request timed out");
        assert_eq!(err.status(), None);
    }
}
