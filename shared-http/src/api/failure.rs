use serde_json::Value;

/// Classified cause of a failed request.
#[derive(Debug, Clone, PartialEq)]
pub enum FailureKind {
    /// The server could not be reached at all.
    NetworkUnreachable(String),
    Timeout,
    /// The server answered with a non-2xx status. `body` is the parsed JSON
    /// error body when there was one.
    Http { status: u16, body: Option<Value> },
    Cancelled,
    /// A 2xx response whose body could not be decoded.
    Decode(String),
    Unknown(String),
}

impl FailureKind {
    pub fn status(&self) -> Option<u16> {
        match self {
            FailureKind::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// 401, 403 and cancellation never succeed on a plain retry.
    pub fn is_retryable(&self) -> bool {
        !matches!(
            self,
            FailureKind::Http {
                status: 401 | 403,
                ..
            } | FailureKind::Cancelled
        )
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(401)
    }

    /// Stable machine-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            FailureKind::NetworkUnreachable(_) => "NETWORK_ERROR",
            FailureKind::Timeout => "TIMEOUT",
            FailureKind::Http { .. } => "HTTP_ERROR",
            FailureKind::Cancelled => "CANCELLED",
            FailureKind::Decode(_) => "DECODE_ERROR",
            FailureKind::Unknown(_) => "UNKNOWN_ERROR",
        }
    }

    pub fn body(&self) -> Option<&Value> {
        match self {
            FailureKind::Http { body, .. } => body.as_ref(),
            _ => None,
        }
    }
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailureKind::NetworkUnreachable(reason) => write!(f, "network unreachable: {}", reason),
            FailureKind::Timeout => write!(f, "request timed out"),
            FailureKind::Http { status, .. } => write!(f, "http status {}", status),
            FailureKind::Cancelled => write!(f, "request cancelled"),
            FailureKind::Decode(reason) => write!(f, "decode error: {}", reason),
            FailureKind::Unknown(reason) => write!(f, "unknown error: {}", reason),
        }
    }
}
