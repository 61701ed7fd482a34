#![deny(clippy::all)]

use crate::domain::{ApiRequest, RawResponse};
use crate::error::TransportError;
use crate::notify::Notification;
use async_trait::async_trait;

// Ports are the pluggable edges of the data-access layer: the wire, the
// stored credential and the user-facing message sink.

/// Port for putting a resolved request on the wire
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    async fn send(&self, request: ApiRequest) -> Result<RawResponse, TransportError>;
}

/// Port for reading the bearer token of the signed-in user
pub trait CredentialStore: Send + Sync + 'static {
    fn token(&self) -> Option<String>;
}

/// Port for surfacing failures to the user (toast, banner, log line)
pub trait Notifier: Send + Sync + 'static {
    fn notify(&self, notification: Notification);
}
