use shared_http::normalize::normalize_error;
use shared_http::{FailureKind, NormalizedError};
use thiserror::Error;

/// Failure below HTTP: the request never produced a status line.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    #[error("connection failed: {0}")]
    Connect(String),

    #[error("request timed out")]
    Timeout,

    #[error("request cancelled")]
    Cancelled,

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("transport error: {0}")]
    Other(String),
}

impl From<TransportError> for FailureKind {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Connect(reason) => FailureKind::NetworkUnreachable(reason),
            TransportError::Timeout => FailureKind::Timeout,
            TransportError::Cancelled => FailureKind::Cancelled,
            TransportError::InvalidRequest(reason) | TransportError::Other(reason) => {
                FailureKind::Unknown(reason)
            }
        }
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            TransportError::Timeout
        } else if err.is_connect() {
            TransportError::Connect(err.to_string())
        } else if err.is_builder() {
            TransportError::InvalidRequest(err.to_string())
        } else {
            TransportError::Other(err.to_string())
        }
    }
}

/// Error every client call fails with: the classified cause plus the
/// normalized form meant for display.
#[derive(Debug, Clone, Error)]
#[error("{}", .normalized.message)]
pub struct ApiError {
    pub kind: FailureKind,
    pub normalized: NormalizedError,
}

impl ApiError {
    pub fn new(kind: FailureKind, path: &str) -> Self {
        let normalized = normalize_error(&kind, path);
        Self { kind, normalized }
    }

    pub fn status(&self) -> Option<u16> {
        self.kind.status()
    }

    pub fn is_unauthorized(&self) -> bool {
        self.kind.is_unauthorized()
    }
}

pub type Result<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use shared_http::api::status_message;

    #[test]
    fn test_transport_errors_map_to_failure_kinds() {
        assert_eq!(FailureKind::from(TransportError::Timeout), FailureKind::Timeout);
        assert_eq!(FailureKind::from(TransportError::Cancelled), FailureKind::Cancelled);
        assert!(matches!(
            FailureKind::from(TransportError::Connect("refused".into())),
            FailureKind::NetworkUnreachable(_)
        ));
    }

    #[test]
    fn test_api_error_displays_table_message() {
        let err = ApiError::new(
            FailureKind::Http {
                status: 409,
                body: Some(json!({"message": "duplicate key value violates unique constraint"})),
            },
            "/api/heritage-sites",
        );
        assert_eq!(err.to_string(), status_message(409));
        assert_eq!(err.status(), Some(409));
        assert_eq!(err.normalized.path, "/api/heritage-sites");
    }
}
