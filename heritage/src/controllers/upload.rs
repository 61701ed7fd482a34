use crate::client::RequestClient;
use crate::domain::{ProgressCallback, RequestConfig, TransferProgress, UploadFile};
use crate::error::{ApiError, Result};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::marker::PhantomData;
use std::sync::Arc;
use tokio::sync::watch;

#[derive(Debug, Clone, Default)]
pub struct UploadState {
    pub loading: bool,
    pub error: Option<ApiError>,
    /// Percent sent, 0..=100.
    pub progress: u8,
}

pub struct UploadController<T = Value> {
    client: RequestClient,
    url: String,
    config: RequestConfig,
    // shared with the progress callback, which outlives a borrow of self
    state: Arc<watch::Sender<UploadState>>,
    _response: PhantomData<fn() -> T>,
}

impl<T: DeserializeOwned> UploadController<T> {
    pub fn new(client: RequestClient, url: impl Into<String>) -> Self {
        let (state, _) = watch::channel(UploadState::default());
        Self {
            client,
            url: url.into(),
            config: RequestConfig::default(),
            state: Arc::new(state),
            _response: PhantomData,
        }
    }

    pub fn with_config(mut self, config: RequestConfig) -> Self {
        self.config = config;
        self
    }

    pub fn state(&self) -> UploadState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<UploadState> {
        self.state.subscribe()
    }

    pub async fn execute(&self, file: UploadFile) -> Result<T> {
        self.state.send_modify(|s| {
            s.loading = true;
            s.error = None;
            s.progress = 0;
        });

        let state = self.state.clone();
        let on_progress: ProgressCallback = Arc::new(move |progress: TransferProgress| {
            if let Some(percent) = progress.percent() {
                state.send_if_modified(|s| {
                    let changed = s.progress != percent;
                    s.progress = percent;
                    changed
                });
            }
        });

        let result = self
            .client
            .upload(&self.url, file, Some(on_progress), self.config.clone())
            .await;

        self.state.send_modify(|s| {
            s.loading = false;
            match &result {
                Ok(_) => s.progress = 100,
                Err(err) => s.error = Some(err.clone()),
            }
        });
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::RequestBody;
    use crate::retry::RetryPolicy;
    use crate::testing::{RecordingNotifier, ScriptedTransport};
    use serde_json::json;
    use shared::config::ClientConfig;

    fn client(transport: &Arc<ScriptedTransport>) -> RequestClient {
        RequestClient::builder(ClientConfig::default())
            .transport(transport.clone())
            .notifier(Arc::new(RecordingNotifier::default()))
            .retry(RetryPolicy::none())
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_upload_completes_at_full_progress() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.push_json(201, json!({"documentId": 31}));

        let controller: UploadController =
            UploadController::new(client(&transport), "/api/heritage-sites/4/documents");
        let response = controller
            .execute(UploadFile::new("survey.jpg", vec![0u8; 1024]).with_content_type("image/jpeg"))
            .await
            .unwrap();

        assert_eq!(response, json!({"documentId": 31}));
        let state = controller.state();
        assert!(!state.loading);
        assert_eq!(state.progress, 100);
        assert!(state.error.is_none());

        let request = &transport.requests()[0];
        assert!(request.on_progress.is_some());
        assert!(matches!(&request.body, RequestBody::File(file) if file.len() == 1024));
    }

    #[tokio::test]
    async fn test_progress_callback_updates_state() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.push_json(413, json!({}));

        let controller: UploadController =
            UploadController::new(client(&transport), "/api/heritage-sites/4/documents");
        let err = controller
            .execute(UploadFile::new("huge.tif", vec![0u8; 16]))
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(413));

        let state = controller.state();
        assert!(!state.loading);
        assert_eq!(state.progress, 0);
        assert_eq!(state.error.unwrap().status(), Some(413));

        // the transport drives the callback it was handed
        let callback = transport.requests()[0].on_progress.clone().unwrap();
        callback(TransferProgress {
            transferred: 8,
            total: Some(16),
        });
        assert_eq!(controller.state().progress, 50);
    }
}
