use super::FailureKind;

const NETWORK_MESSAGE: &str = "Unable to reach the server. Check your connection and try again.";
const TIMEOUT_MESSAGE: &str = "The server took too long to respond. Please try again.";
const CANCELLED_MESSAGE: &str = "The request was cancelled.";
const DECODE_MESSAGE: &str = "The server sent a response that could not be read.";
const UNKNOWN_MESSAGE: &str = "An unexpected error occurred. Please try again.";

/// Human-readable message for an HTTP status. Never includes backend text.
pub fn status_message(status: u16) -> &'static str {
    match status {
        400 => "The request contains invalid data. Please review it and try again.",
        401 => "Your session has expired. Please sign in again.",
        403 => "You do not have permission to perform this action.",
        404 => "The requested resource was not found.",
        409 => "The operation conflicts with the current state of the record.",
        422 => "Some fields failed validation. Please correct them and try again.",
        429 => "Too many requests. Please wait a moment and try again.",
        500 | 502 => "The server encountered an error. Please try again later.",
        503 | 504 => "The service is temporarily unavailable. Please try again later.",
        400..=499 => "The request could not be completed.",
        500..=599 => "The server encountered an error. Please try again later.",
        _ => UNKNOWN_MESSAGE,
    }
}

pub fn user_message(kind: &FailureKind) -> &'static str {
    match kind {
        FailureKind::NetworkUnreachable(_) => NETWORK_MESSAGE,
        FailureKind::Timeout => TIMEOUT_MESSAGE,
        FailureKind::Http { status, .. } => status_message(*status),
        FailureKind::Cancelled => CANCELLED_MESSAGE,
        FailureKind::Decode(_) => DECODE_MESSAGE,
        FailureKind::Unknown(_) => UNKNOWN_MESSAGE,
    }
}

/// Canonical reason phrase, used when an error body carries no `error` field.
pub fn reason_phrase(status: u16) -> &'static str {
    match status {
        400 => "Bad Request",
        401 => "Unauthorized",
        403 => "Forbidden",
        404 => "Not Found",
        405 => "Method Not Allowed",
        408 => "Request Timeout",
        409 => "Conflict",
        413 => "Payload Too Large",
        415 => "Unsupported Media Type",
        422 => "Unprocessable Entity",
        429 => "Too Many Requests",
        500 => "Internal Server Error",
        502 => "Bad Gateway",
        503 => "Service Unavailable",
        504 => "Gateway Timeout",
        400..=499 => "Client Error",
        500..=599 => "Server Error",
        _ => "Unknown",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_classified_status_has_a_message() {
        for status in [400, 401, 403, 404, 409, 422, 429, 500, 502, 503, 504] {
            let message = status_message(status);
            assert!(!message.is_empty());
            assert_ne!(message, UNKNOWN_MESSAGE, "status {} fell through", status);
        }
    }

    #[test]
    fn test_unlisted_statuses_use_range_fallback() {
        assert_eq!(status_message(418), "The request could not be completed.");
        assert_eq!(status_message(507), status_message(500));
        assert_eq!(status_message(0), UNKNOWN_MESSAGE);
    }
}
