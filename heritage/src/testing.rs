//! In-memory ports for unit tests.

use crate::domain::{ApiRequest, RawResponse};
use crate::error::TransportError;
use crate::notify::Notification;
use crate::ports::{Notifier, Transport};
use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::VecDeque;
use std::time::Duration;

type Scripted = Result<RawResponse, TransportError>;

/// Answers requests from a queue; once the queue is empty the fallback
/// answer (if any) repeats.
#[derive(Default)]
pub struct ScriptedTransport {
    responses: Mutex<VecDeque<Scripted>>,
    fallback: Mutex<Option<Scripted>>,
    requests: Mutex<Vec<ApiRequest>>,
    delay: Duration,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay,
            ..Self::default()
        }
    }

    pub fn push_json(&self, status: u16, body: Value) {
        self.responses
            .lock()
            .push_back(Ok(RawResponse::json(status, &body)));
    }

    pub fn push_raw(&self, response: RawResponse) {
        self.responses.lock().push_back(Ok(response));
    }

    pub fn push_error(&self, err: TransportError) {
        self.responses.lock().push_back(Err(err));
    }

    pub fn always_json(&self, status: u16, body: Value) {
        *self.fallback.lock() = Some(Ok(RawResponse::json(status, &body)));
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().len()
    }

    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, request: ApiRequest) -> Result<RawResponse, TransportError> {
        self.requests.lock().push(request);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        let next = self.responses.lock().pop_front();
        match next {
            Some(response) => response,
            None => self
                .fallback
                .lock()
                .clone()
                .unwrap_or_else(|| Err(TransportError::Other("no scripted response".into()))),
        }
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    seen: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn notifications(&self) -> Vec<Notification> {
        self.seen.lock().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notification: Notification) {
        self.seen.lock().push(notification);
    }
}
