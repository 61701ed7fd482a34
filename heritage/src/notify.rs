use crate::error::ApiError;
use crate::ports::Notifier;
use shared_http::FailureKind;
use std::time::Duration;
use tracing::{error, warn};

const WARNING_DURATION: Duration = Duration::from_secs(4);
const ERROR_DURATION: Duration = Duration::from_secs(6);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Warning,
    Error,
}

/// A transient message for the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub message: String,
    pub severity: Severity,
    pub duration: Duration,
}

impl Notification {
    /// Notification for a failed call. `None` for 401, which the sign-in
    /// redirect handles on its own.
    pub fn for_failure(err: &ApiError) -> Option<Self> {
        if err.is_unauthorized() {
            return None;
        }
        let severity = match &err.kind {
            FailureKind::Http { status, .. } if (400..500).contains(status) => Severity::Warning,
            FailureKind::Cancelled => Severity::Warning,
            _ => Severity::Error,
        };
        let duration = match severity {
            Severity::Warning => WARNING_DURATION,
            Severity::Error => ERROR_DURATION,
        };
        Some(Self {
            message: err.normalized.message.clone(),
            severity,
            duration,
        })
    }
}

/// Writes notifications to the log; the default sink when no UI is attached
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notification: Notification) {
        match notification.severity {
            Severity::Warning => warn!("{}", notification.message),
            Severity::Error => error!("{}", notification.message),
        }
    }
}
