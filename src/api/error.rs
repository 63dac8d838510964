//! API error types for the Jira client.

use std::fmt;

use thiserror::Error;

use super::auth::SecretError;

/// Coarse failure classes used for retry decisions and user messaging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Timeouts, connection drops, 429 and 5xx responses. Retried, then surfaced.
    Transient,
    /// 4xx responses other than authentication failures. Never retried.
    ClientError,
    /// Rejected credentials. Never retried.
    AuthError,
    /// An external secret command failed while building credentials.
    SecretResolution,
    /// Input rejected locally before any request was made.
    LocalValidation,
}

impl ErrorKind {
    /// Short label used in status lines and telemetry.
    pub fn label(&self) -> &'static str {
        match self {
            ErrorKind::Transient => "transient",
            ErrorKind::ClientError => "client",
            ErrorKind::AuthError => "auth",
            ErrorKind::SecretResolution => "secret",
            ErrorKind::LocalValidation => "validation",
        }
    }
}

/// Errors that can occur when interacting with the Jira API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request was malformed or rejected by validation on the server.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Authentication failed.
    #[error("Authentication failed: check your user and password/token")]
    Unauthorized,

    /// The user lacks access to the resource.
    #[error("Permission denied: {0}")]
    Forbidden(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The resource changed underneath the request.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Any other 4xx response.
    #[error("Request rejected (HTTP {status}): {message}")]
    Rejected { status: u16, message: String },

    /// Rate limited by the server.
    #[error("Rate limited: please wait before retrying")]
    RateLimited,

    /// Jira server error.
    #[error("Jira server error: {0}")]
    ServerError(String),

    /// Network or HTTP transport error.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The client configuration cannot be used to build requests.
    #[error("Client configuration error: {0}")]
    Configuration(String),

    /// Credential secret could not be resolved.
    #[error(transparent)]
    Secret(#[from] SecretError),

    /// Response body could not be decoded.
    #[error("Invalid API response: {0}")]
    InvalidResponse(String),
}

/// Result type for API operations.
pub type Result<T> = std::result::Result<T, ApiError>;

impl ApiError {
    /// Create an error from an HTTP status code and a server-provided message.
    pub fn from_status(status: reqwest::StatusCode, context: &str) -> Self {
        match status.as_u16() {
            400 => ApiError::BadRequest(context.to_string()),
            401 => ApiError::Unauthorized,
            403 => ApiError::Forbidden(context.to_string()),
            404 => ApiError::NotFound(context.to_string()),
            409 => ApiError::Conflict(context.to_string()),
            429 => ApiError::RateLimited,
            code @ 400..=499 => ApiError::Rejected {
                status: code,
                message: context.to_string(),
            },
            500..=599 => ApiError::ServerError(format!("HTTP {}: {}", status, context)),
            _ => ApiError::InvalidResponse(format!("unexpected HTTP {}: {}", status, context)),
        }
    }

    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ApiError::RateLimited | ApiError::ServerError(_) | ApiError::Network(_) => {
                ErrorKind::Transient
            }
            ApiError::Unauthorized => ErrorKind::AuthError,
            ApiError::Secret(_) => ErrorKind::SecretResolution,
            ApiError::Configuration(_) => ErrorKind::LocalValidation,
            ApiError::BadRequest(_)
            | ApiError::Forbidden(_)
            | ApiError::NotFound(_)
            | ApiError::Conflict(_)
            | ApiError::Rejected { .. }
            | ApiError::InvalidResponse(_) => ErrorKind::ClientError,
        }
    }

    /// Whether the retry loop may try this request again.
    pub fn is_retryable(&self) -> bool {
        self.kind() == ErrorKind::Transient
    }
}

/// A cloneable, display-ready summary of a failed request.
///
/// Worker tasks send this across the result channel and the cache stores
/// its message; the kind picks the banner wording.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestError {
    pub kind: ErrorKind,
    pub message: String,
}

impl RequestError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// An error raised before any request was sent.
    pub fn local(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::LocalValidation, message)
    }

    /// Message with a hint on how to recover, as shown in panes.
    pub fn banner(&self) -> String {
        match self.kind {
            ErrorKind::AuthError => format!("{} (fix credentials and restart)", self.message),
            ErrorKind::LocalValidation => self.message.clone(),
            _ => format!("{} (re-select or press r to retry)", self.message),
        }
    }
}

impl fmt::Display for RequestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl From<&ApiError> for RequestError {
    fn from(error: &ApiError) -> Self {
        RequestError::new(error.kind(), error.to_string())
    }
}

impl From<ApiError> for RequestError {
    fn from(error: ApiError) -> Self {
        RequestError::from(&error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn test_error_from_status_400() {
        let err = ApiError::from_status(StatusCode::BAD_REQUEST, "JQL is invalid");
        match err {
            ApiError::BadRequest(msg) => assert_eq!(msg, "JQL is invalid"),
            other => panic!("Expected BadRequest, got {:?}", other),
        }
    }

    #[test]
    fn test_error_from_status_401_is_auth() {
        let err = ApiError::from_status(StatusCode::UNAUTHORIZED, "test");
        assert!(matches!(err, ApiError::Unauthorized));
        assert_eq!(err.kind(), ErrorKind::AuthError);
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_error_from_status_404_is_client_error() {
        let err = ApiError::from_status(StatusCode::NOT_FOUND, "issue JAY-1");
        assert_eq!(err.kind(), ErrorKind::ClientError);
        assert_eq!(err.to_string(), "Not found: issue JAY-1");
    }

    #[test]
    fn test_error_from_status_other_4xx() {
        let err = ApiError::from_status(StatusCode::UNPROCESSABLE_ENTITY, "nope");
        assert!(matches!(err, ApiError::Rejected { status: 422, .. }));
        assert_eq!(err.kind(), ErrorKind::ClientError);
    }

    #[test]
    fn test_transient_statuses_are_retryable() {
        assert!(ApiError::from_status(StatusCode::TOO_MANY_REQUESTS, "x").is_retryable());
        assert!(ApiError::from_status(StatusCode::SERVICE_UNAVAILABLE, "x").is_retryable());
        assert!(ApiError::from_status(StatusCode::BAD_GATEWAY, "x").is_retryable());
        assert!(!ApiError::from_status(StatusCode::FORBIDDEN, "x").is_retryable());
        assert!(!ApiError::from_status(StatusCode::CONFLICT, "x").is_retryable());
    }

    #[test]
    fn test_request_error_keeps_kind_and_message() {
        let err = RequestError::from(ApiError::NotFound("issue JAY-9".to_string()));
        assert_eq!(err.kind, ErrorKind::ClientError);
        assert_eq!(err.to_string(), "Not found: issue JAY-9");
        assert!(err.banner().contains("press r"));
    }

    #[test]
    fn test_auth_banner_does_not_suggest_retry() {
        let err = RequestError::from(ApiError::Unauthorized);
        assert!(!err.banner().contains("press r"));
        assert!(err.banner().contains("credentials"));
    }
}
