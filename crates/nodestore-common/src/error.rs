//! Centralized error type for nodestore HTTP handlers.
//!
//! Every failure a client can see is a [`StoreError`]; its [`IntoResponse`]
//! implementation renders the `{"error": "<message>"}` body used by all routes.

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::file_id::FileIdError;

/// Application error returned by request handlers.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    // === Client errors ===
    #[error("{0}")]
    BadRequest(String),

    #[error("not authorized")]
    Unauthorized { domain: String },

    // === Storage errors ===
    #[error("not found")]
    NotFound,

    #[error("internal server error with storage request: {0}")]
    Storage(String),

    // === Routing ===
    #[error("resource unknown")]
    UnknownResource,

    /// Status-only error with an empty JSON body.
    #[error("")]
    Status(StatusCode),
}

/// JSON error response body sent to clients. Serializes to `{}` when the
/// message is empty.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub error: String,
}

impl StoreError {
    /// Map error to HTTP status code.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            Self::NotFound | Self::UnknownResource => StatusCode::NOT_FOUND,
            Self::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Status(status) => *status,
        }
    }

    pub fn body(&self) -> ErrorBody {
        ErrorBody {
            error: self.to_string(),
        }
    }
}

impl From<FileIdError> for StoreError {
    fn from(e: FileIdError) -> Self {
        Self::BadRequest(e.to_string())
    }
}

impl IntoResponse for StoreError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        match &self {
            Self::Storage(e) => tracing::error!(status = %status, "Storage error: {e}"),
            other => tracing::debug!(status = %status, "Reply to client: {other}"),
        }

        let mut response = (status, axum::Json(self.body())).into_response();

        if let Self::Unauthorized { domain } = &self {
            if let Ok(challenge) = HeaderValue::from_str(&format!("Basic domain={domain}")) {
                response
                    .headers_mut()
                    .insert(header::WWW_AUTHENTICATE, challenge);
            }
        }

        response
    }
}

/// Convenience type alias for Results using StoreError.
pub type StoreResult<T> = Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes() {
        assert_eq!(
            StoreError::BadRequest("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            StoreError::Unauthorized { domain: "d".into() }.status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(StoreError::NotFound.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            StoreError::Storage("boom".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn body_serialization() {
        let body = serde_json::to_string(&StoreError::NotFound.body()).unwrap();
        assert_eq!(body, r#"{"error":"not found"}"#);

        let body =
            serde_json::to_string(&StoreError::Status(StatusCode::BAD_GATEWAY).body()).unwrap();
        assert_eq!(body, "{}");
    }

    #[test]
    fn unauthorized_sets_challenge() {
        let resp = StoreError::Unauthorized {
            domain: "storage.example.org".into(),
        }
        .into_response();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            resp.headers().get(header::WWW_AUTHENTICATE).unwrap(),
            "Basic domain=storage.example.org"
        );
    }

    #[test]
    fn parse_errors_are_bad_requests() {
        let err: StoreError = FileIdError::MissingTimestampSeparator.into();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert!(err.to_string().contains("missing dash separator"));
    }
}
