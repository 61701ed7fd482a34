use crate::client::RequestClient;
use crate::domain::{Method, RequestConfig};
use crate::error::{ApiError, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt::Display;
use std::future::Future;
use std::marker::PhantomData;
use tokio::sync::watch;

#[derive(Debug, Clone, Default)]
pub struct MutationState {
    pub loading: bool,
    pub error: Option<ApiError>,
}

/// Mark `state` loading for the duration of `call` and record its failure.
pub(crate) async fn track<T, F>(state: &watch::Sender<MutationState>, call: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    state.send_modify(|s| {
        s.loading = true;
        s.error = None;
    });
    let result = call.await;
    state.send_modify(|s| {
        s.loading = false;
        s.error = result.as_ref().err().cloned();
    });
    result
}

/// Write controller for POST, PUT or PATCH to a fixed URL.
pub struct MutationController<B: ?Sized, T> {
    client: RequestClient,
    method: Method,
    url: String,
    config: RequestConfig,
    state: watch::Sender<MutationState>,
    _types: PhantomData<fn(&B) -> T>,
}

impl<B, T> MutationController<B, T>
where
    B: Serialize + ?Sized,
    T: DeserializeOwned,
{
    fn with_method(client: RequestClient, method: Method, url: impl Into<String>) -> Self {
        let (state, _) = watch::channel(MutationState::default());
        Self {
            client,
            method,
            url: url.into(),
            config: RequestConfig::default(),
            state,
            _types: PhantomData,
        }
    }

    pub fn post(client: RequestClient, url: impl Into<String>) -> Self {
        Self::with_method(client, Method::Post, url)
    }

    pub fn put(client: RequestClient, url: impl Into<String>) -> Self {
        Self::with_method(client, Method::Put, url)
    }

    pub fn patch(client: RequestClient, url: impl Into<String>) -> Self {
        Self::with_method(client, Method::Patch, url)
    }

    pub fn with_config(mut self, config: RequestConfig) -> Self {
        self.config = config;
        self
    }

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn state(&self) -> MutationState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<MutationState> {
        self.state.subscribe()
    }

    /// Send `payload`. A failure is recorded in state and also returned.
    pub async fn execute(&self, payload: &B) -> Result<T> {
        let call = self
            .client
            .request(self.method, &self.url, Some(payload), self.config.clone());
        track(&self.state, call).await
    }
}

/// Write controller for DELETE, either of the base URL or of `<url>/<id>`.
pub struct DeleteController<T = Value> {
    client: RequestClient,
    url: String,
    config: RequestConfig,
    state: watch::Sender<MutationState>,
    _response: PhantomData<fn() -> T>,
}

impl<T: DeserializeOwned> DeleteController<T> {
    pub fn new(client: RequestClient, url: impl Into<String>) -> Self {
        let (state, _) = watch::channel(MutationState::default());
        Self {
            client,
            url: url.into(),
            config: RequestConfig::default(),
            state,
            _response: PhantomData,
        }
    }

    pub fn with_config(mut self, config: RequestConfig) -> Self {
        self.config = config;
        self
    }

    pub fn state(&self) -> MutationState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<MutationState> {
        self.state.subscribe()
    }

    pub async fn execute(&self) -> Result<T> {
        let call = self.client.delete(&self.url, self.config.clone());
        track(&self.state, call).await
    }

    pub async fn execute_for(&self, id: impl Display) -> Result<T> {
        let url = format!("{}/{}", self.url.trim_end_matches('/'), id);
        let call = self.client.delete(&url, self.config.clone());
        track(&self.state, call).await
    }
}
