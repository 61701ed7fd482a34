use crate::client::RequestClient;
use crate::domain::RequestConfig;
use crate::error::ApiError;
use serde::de::DeserializeOwned;
use shared_http::QueryParams;
use std::fmt;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestStatus {
    Idle,
    Loading,
    Success,
    Failed,
}

/// What a read controller currently knows.
/// `data` survives a failed reload; `error` is cleared when a load starts.
#[derive(Debug, Clone)]
pub struct RequestState<T> {
    pub data: Option<T>,
    pub loading: bool,
    pub error: Option<ApiError>,
}

impl<T> Default for RequestState<T> {
    fn default() -> Self {
        Self {
            data: None,
            loading: false,
            error: None,
        }
    }
}

impl<T> RequestState<T> {
    pub fn status(&self) -> RequestStatus {
        if self.loading {
            RequestStatus::Loading
        } else if self.error.is_some() {
            RequestStatus::Failed
        } else if self.data.is_some() {
            RequestStatus::Success
        } else {
            RequestStatus::Idle
        }
    }
}

type SuccessHook<T> = Arc<dyn Fn(&T) + Send + Sync>;
type ErrorHook = Arc<dyn Fn(&ApiError) + Send + Sync>;

pub struct QueryOptions<T> {
    pub enabled: bool,
    pub on_success: Option<SuccessHook<T>>,
    pub on_error: Option<ErrorHook>,
    pub config: RequestConfig,
}

impl<T> Default for QueryOptions<T> {
    fn default() -> Self {
        Self {
            enabled: true,
            on_success: None,
            on_error: None,
            config: RequestConfig::default(),
        }
    }
}

impl<T> QueryOptions<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn on_success<F>(mut self, hook: F) -> Self
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        self.on_success = Some(Arc::new(hook));
        self
    }

    pub fn on_error<F>(mut self, hook: F) -> Self
    where
        F: Fn(&ApiError) + Send + Sync + 'static,
    {
        self.on_error = Some(Arc::new(hook));
        self
    }

    pub fn config(mut self, config: RequestConfig) -> Self {
        self.config = config;
        self
    }
}

/// Read controller: fetches `url` with `params` and keeps the outcome.
/// Failures are absorbed into state; nothing is returned to the caller.
pub struct QueryController<T> {
    client: RequestClient,
    url: String,
    params: QueryParams,
    options: QueryOptions<T>,
    state: watch::Sender<RequestState<T>>,
}

impl<T> QueryController<T>
where
    T: DeserializeOwned + Clone + Send + Sync + 'static,
{
    /// Nothing is fetched until [`Self::activate`].
    pub fn new(
        client: RequestClient,
        url: impl Into<String>,
        params: QueryParams,
        options: QueryOptions<T>,
    ) -> Self {
        let (state, _) = watch::channel(RequestState::default());
        Self {
            client,
            url: url.into(),
            params,
            options,
            state,
        }
    }

    pub fn state(&self) -> RequestState<T> {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<RequestState<T>> {
        self.state.subscribe()
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn params(&self) -> &QueryParams {
        &self.params
    }

    pub fn is_enabled(&self) -> bool {
        self.options.enabled
    }

    /// First load, as when the consumer mounts.
    pub async fn activate(&self) {
        self.refetch().await;
    }

    pub async fn set_url(&mut self, url: impl Into<String>) {
        let url = url.into();
        if url != self.url {
            self.url = url;
            self.refetch().await;
        }
    }

    pub async fn set_params(&mut self, params: QueryParams) {
        if params != self.params {
            self.params = params;
            self.refetch().await;
        }
    }

    /// Turning a controller on loads it; turning it off keeps what it has.
    pub async fn set_enabled(&mut self, enabled: bool) {
        let was_enabled = self.options.enabled;
        self.options.enabled = enabled;
        if enabled && !was_enabled {
            self.refetch().await;
        }
    }

    pub async fn refetch(&self) {
        if !self.options.enabled {
            debug!("Skipping disabled query for {}", self.url);
            return;
        }
        self.load(&self.params).await;
    }

    /// Merge `partial` into the current params and load right away.
    pub async fn refetch_with_params(&mut self, partial: QueryParams) {
        self.params.merge(partial);
        self.refetch().await;
    }

    async fn load(&self, params: &QueryParams) {
        self.state.send_modify(|state| {
            state.loading = true;
            state.error = None;
        });

        let result = self
            .client
            .get::<T>(&self.url, params, self.options.config.clone())
            .await;

        match result {
            Ok(data) => {
                if let Some(hook) = &self.options.on_success {
                    hook(&data);
                }
                self.state.send_modify(|state| {
                    state.data = Some(data);
                    state.loading = false;
                });
            }
            Err(err) => {
                if let Some(hook) = &self.options.on_error {
                    hook(&err);
                }
                self.state.send_modify(|state| {
                    state.error = Some(err);
                    state.loading = false;
                });
            }
        }
    }
}

impl<T> fmt::Debug for QueryController<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryController")
            .field("url", &self.url)
            .field("params", &self.params)
            .field("enabled", &self.options.enabled)
            .finish()
    }
}
