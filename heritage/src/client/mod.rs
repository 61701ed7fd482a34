mod in_flight;

pub use in_flight::{InFlightTable, SharedResponse};

use crate::cache::ResponseCache;
use crate::credentials::{FileCredentialStore, MemoryCredentialStore};
use crate::domain::{
    ApiRequest, CacheKey, Method, ProgressCallback, RawResponse, RequestBody, RequestConfig,
    UploadFile,
};
use crate::error::{ApiError, Result};
use crate::notify::{Notification, TracingNotifier};
use crate::policy::{EndpointPolicy, PolicyTable, canonical_path};
use crate::ports::{CredentialStore, Notifier, Transport};
use crate::retry::RetryPolicy;
use crate::transport::ReqwestTransport;
use futures::FutureExt;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use shared::config::ClientConfig;
use shared_http::normalize::backend_message;
use shared_http::{FailureKind, NormalizedPage, QueryParams, looks_paginated, normalize_page};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Handle to the single data-access client. Clones share the cache, the
/// in-flight table and the ports.
#[derive(Clone)]
pub struct RequestClient {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    config: ClientConfig,
    transport: Arc<dyn Transport>,
    credentials: Arc<dyn CredentialStore>,
    notifier: Arc<dyn Notifier>,
    policy: PolicyTable,
    retry: RetryPolicy,
    cache: ResponseCache,
    in_flight: InFlightTable,
}

pub struct RequestClientBuilder {
    config: ClientConfig,
    transport: Option<Arc<dyn Transport>>,
    credentials: Option<Arc<dyn CredentialStore>>,
    notifier: Option<Arc<dyn Notifier>>,
    policy: PolicyTable,
    retry: Option<RetryPolicy>,
}

impl RequestClientBuilder {
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn credentials(mut self, credentials: Arc<dyn CredentialStore>) -> Self {
        self.credentials = Some(credentials);
        self
    }

    pub fn notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub fn policy(mut self, policy: PolicyTable) -> Self {
        self.policy = policy;
        self
    }

    pub fn retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = Some(retry);
        self
    }

    pub fn build(self) -> shared::Result<RequestClient> {
        self.config.validate()?;

        let transport: Arc<dyn Transport> = match self.transport {
            Some(transport) => transport,
            None => Arc::new(
                ReqwestTransport::new().map_err(|e| shared::Error::Internal(e.to_string()))?,
            ),
        };
        let credentials: Arc<dyn CredentialStore> =
            match (self.credentials, &self.config.token_path) {
                (Some(credentials), _) => credentials,
                (None, Some(path)) => Arc::new(FileCredentialStore::open(path)?),
                (None, None) => Arc::new(MemoryCredentialStore::new()),
            };
        let notifier = self.notifier.unwrap_or_else(|| Arc::new(TracingNotifier));
        let retry = self
            .retry
            .unwrap_or_else(|| RetryPolicy::from_config(&self.config));
        let cache = ResponseCache::new(self.config.cache_max_entries, self.config.cache_ttl.into());

        info!(
            "Request client ready for {} (cache ttl {:?}, {} retries)",
            self.config.api_base_url,
            cache.ttl(),
            retry.retries
        );

        Ok(RequestClient {
            inner: Arc::new(ClientInner {
                config: self.config,
                transport,
                credentials,
                notifier,
                policy: self.policy,
                retry,
                cache,
                in_flight: InFlightTable::new(),
            }),
        })
    }
}

impl RequestClient {
    pub fn builder(config: ClientConfig) -> RequestClientBuilder {
        RequestClientBuilder {
            config,
            transport: None,
            credentials: None,
            notifier: None,
            policy: PolicyTable::default(),
            retry: None,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    pub fn policy(&self) -> &PolicyTable {
        &self.inner.policy
    }

    /// Reads currently awaiting the network.
    pub fn in_flight_count(&self) -> usize {
        self.inner.in_flight.len()
    }

    /// Drop every cached read.
    pub fn invalidate_cache(&self) {
        self.inner.cache.invalidate_all();
        debug!("Response cache cleared");
    }

    pub async fn get<T: DeserializeOwned>(
        &self,
        url: &str,
        params: &QueryParams,
        config: RequestConfig,
    ) -> Result<T> {
        let url = canonical_path(url);
        let url: &str = &url;
        let skip_notification = config.skip_notification;
        let value = self.get_raw(url, params, config).await?;
        self.decode(Method::Get, url, value, skip_notification)
    }

    /// GET a list endpoint as a typed page, whichever envelope it answers with.
    pub async fn get_page<T: DeserializeOwned + Clone>(
        &self,
        url: &str,
        params: &QueryParams,
        config: RequestConfig,
    ) -> Result<NormalizedPage<T>> {
        let url = canonical_path(url);
        let url: &str = &url;
        let skip_notification = config.skip_notification;
        let value = self.get_raw(url, params, config).await?;
        NormalizedPage::from_value(value).map_err(|err| {
            self.inner
                .fail(Method::Get, url, FailureKind::Decode(err.to_string()), skip_notification)
        })
    }

    /// GET returning the normalized JSON as-is.
    ///
    /// Identical reads issued while one is pending share its outcome.
    /// Reads of cacheable endpoints are answered from the cache while fresh.
    pub async fn get_raw(
        &self,
        url: &str,
        params: &QueryParams,
        config: RequestConfig,
    ) -> Result<Value> {
        let url = canonical_path(url);
        let url: &str = &url;
        let policy = self.inner.policy.resolve(Method::Get, url);
        let key = CacheKey::new(Method::Get, url, params);

        if policy.cacheable && !config.skip_cache {
            if let Some(value) = self.inner.cache.get_fresh(&key).await {
                debug!("Cache hit for {}", key);
                return Ok(value);
            }
        }

        let (response, leader) = self.inner.in_flight.join_or_start(key.clone(), || {
            let request = self.inner.build_request(
                Method::Get,
                url,
                params,
                RequestBody::Empty,
                &config,
                policy,
                None,
            );
            ClientInner::start_read(
                self.inner.clone(),
                key.clone(),
                request,
                policy,
                config.skip_notification,
            )
        });
        if !leader {
            debug!("Joined pending request for {}", key);
        }
        response.await
    }

    pub async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        url: &str,
        body: &B,
        config: RequestConfig,
    ) -> Result<T> {
        self.request(Method::Post, url, Some(body), config).await
    }

    pub async fn put<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        url: &str,
        body: &B,
        config: RequestConfig,
    ) -> Result<T> {
        self.request(Method::Put, url, Some(body), config).await
    }

    pub async fn patch<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        url: &str,
        body: &B,
        config: RequestConfig,
    ) -> Result<T> {
        self.request(Method::Patch, url, Some(body), config).await
    }

    pub async fn delete<T: DeserializeOwned>(&self, url: &str, config: RequestConfig) -> Result<T> {
        self.request::<Value, T>(Method::Delete, url, None, config).await
    }

    /// Any method, without dedup or caching. GET goes through [`Self::get`].
    pub async fn request<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        method: Method,
        url: &str,
        body: Option<&B>,
        config: RequestConfig,
    ) -> Result<T> {
        let url = canonical_path(url);
        let url: &str = &url;
        if method.is_read() {
            return self.get(url, &QueryParams::new(), config).await;
        }

        let body = match body {
            Some(body) => match serde_json::to_value(body) {
                Ok(value) => RequestBody::Json(value),
                Err(err) => {
                    return Err(self.inner.fail(
                        method,
                        url,
                        FailureKind::Unknown(err.to_string()),
                        config.skip_notification,
                    ));
                }
            },
            None => RequestBody::Empty,
        };
        let policy = self.inner.policy.resolve(method, url);
        let request = self.inner.build_request(
            method,
            url,
            &QueryParams::new(),
            body,
            &config,
            policy,
            None,
        );
        let value = self.dispatch_json(request, config.skip_notification).await?;
        self.decode(method, url, value, config.skip_notification)
    }

    /// Multipart upload of one file, reporting bytes sent through `on_progress`.
    pub async fn upload<T: DeserializeOwned>(
        &self,
        url: &str,
        file: UploadFile,
        on_progress: Option<ProgressCallback>,
        config: RequestConfig,
    ) -> Result<T> {
        let url = canonical_path(url);
        let url: &str = &url;
        let policy = self.inner.policy.resolve(Method::Post, url);
        let request = self.inner.build_request(
            Method::Post,
            url,
            &QueryParams::new(),
            RequestBody::File(file),
            &config,
            policy,
            Some(self.inner.config.transfer_timeout),
        );
        let request = ApiRequest { on_progress, ..request };
        let value = self.dispatch_json(request, config.skip_notification).await?;
        self.decode(Method::Post, url, value, config.skip_notification)
    }

    /// Fetch `url` and save the body as `filename` in the download directory.
    /// Only the final component of `filename` is used.
    pub async fn download(
        &self,
        url: &str,
        filename: &str,
        config: RequestConfig,
    ) -> Result<PathBuf> {
        let url = canonical_path(url);
        let url: &str = &url;
        let skip_notification = config.skip_notification;
        let target = match Path::new(filename).file_name() {
            Some(name) => self.inner.config.download_dir.join(name),
            None => {
                return Err(self.inner.fail(
                    Method::Get,
                    url,
                    FailureKind::Unknown(format!("'{}' is not a file name", filename)),
                    skip_notification,
                ));
            }
        };

        let policy = self.inner.policy.resolve(Method::Get, url);
        let mut request = self.inner.build_request(
            Method::Get,
            url,
            &QueryParams::new(),
            RequestBody::Empty,
            &config,
            policy,
            Some(self.inner.config.transfer_timeout),
        );
        request.on_progress = config.on_progress.clone();

        let inner = self.inner.clone();
        let raw = spawn_settled(url, async move {
            inner.send_with_retry(request, skip_notification).await
        })
        .await?;

        if let Err(err) = write_file(&target, &raw.body).await {
            return Err(self.inner.fail(
                Method::Get,
                url,
                FailureKind::Unknown(err.to_string()),
                skip_notification,
            ));
        }
        info!("Saved {} bytes from {} to {}", raw.body.len(), url, target.display());
        Ok(target)
    }

    async fn dispatch_json(&self, request: ApiRequest, skip_notification: bool) -> Result<Value> {
        let inner = self.inner.clone();
        let path = request.path.clone();
        spawn_settled(&path, async move { inner.execute(request, skip_notification).await }).await
    }

    fn decode<T: DeserializeOwned>(
        &self,
        method: Method,
        url: &str,
        value: Value,
        skip_notification: bool,
    ) -> Result<T> {
        serde_json::from_value(value).map_err(|err| {
            self.inner
                .fail(method, url, FailureKind::Decode(err.to_string()), skip_notification)
        })
    }
}

impl ClientInner {
    #[allow(clippy::too_many_arguments)]
    fn build_request(
        &self,
        method: Method,
        url: &str,
        params: &QueryParams,
        body: RequestBody,
        config: &RequestConfig,
        policy: EndpointPolicy,
        transfer_timeout: Option<Duration>,
    ) -> ApiRequest {
        let mut headers = vec![("Accept".to_string(), "application/json".to_string())];
        if policy.attach_credentials {
            if let Some(token) = self.credentials.token() {
                headers.push(("Authorization".to_string(), format!("Bearer {}", token)));
            }
        }
        headers.extend(config.headers.iter().cloned());

        ApiRequest {
            method,
            path: url.to_string(),
            url: self.config.api_url(url),
            query: params.to_pairs(),
            headers,
            body,
            timeout: config
                .timeout
                .or(transfer_timeout)
                .unwrap_or(self.config.request_timeout),
            on_progress: None,
        }
    }

    /// Put a deduplicated read on its own task. The task stores the result,
    /// then leaves the in-flight table before anyone awaiting it wakes.
    fn start_read(
        inner: Arc<ClientInner>,
        key: CacheKey,
        request: ApiRequest,
        policy: EndpointPolicy,
        skip_notification: bool,
    ) -> SharedResponse {
        let path = request.path.clone();
        let task = tokio::spawn(async move {
            let result = inner.execute(request, skip_notification).await;
            if policy.cacheable {
                if let Ok(value) = &result {
                    inner.cache.store(key.clone(), value.clone()).await;
                }
            }
            inner.in_flight.remove(&key);
            result
        });
        async move {
            task.await.unwrap_or_else(|err| {
                Err(ApiError::new(FailureKind::Unknown(err.to_string()), &path))
            })
        }
        .boxed()
        .shared()
    }

    /// Send with retries and read the body as JSON.
    async fn execute(&self, request: ApiRequest, skip_notification: bool) -> Result<Value> {
        let method = request.method;
        let path = request.path.clone();
        let raw = self.send_with_retry(request, skip_notification).await?;

        match raw.parse_json() {
            Ok(value) if looks_paginated(&value) => Ok(normalize_page(value)),
            Ok(value) => Ok(value),
            Err(err) => Err(self.fail(
                method,
                &path,
                FailureKind::Decode(err.to_string()),
                skip_notification,
            )),
        }
    }

    async fn send_with_retry(
        &self,
        request: ApiRequest,
        skip_notification: bool,
    ) -> Result<RawResponse> {
        let outcome = self
            .retry
            .run(|| {
                let request = request.clone();
                async move {
                    let raw = self.transport.send(request).await.map_err(FailureKind::from)?;
                    if raw.is_success() {
                        Ok(raw)
                    } else {
                        Err(FailureKind::Http {
                            status: raw.status,
                            body: raw.parse_json().ok().filter(|body| !body.is_null()),
                        })
                    }
                }
            })
            .await;

        outcome.map_err(|kind| self.fail(request.method, &request.path, kind, skip_notification))
    }

    /// Classify, log and announce a failure.
    fn fail(
        &self,
        method: Method,
        path: &str,
        kind: FailureKind,
        skip_notification: bool,
    ) -> ApiError {
        match backend_message(&kind) {
            Some(detail) => warn!("{} {} failed: {} ({})", method, path, kind, detail),
            None => warn!("{} {} failed: {}", method, path, kind),
        }
        let err = ApiError::new(kind, path);
        if !skip_notification {
            if let Some(notification) = Notification::for_failure(&err) {
                self.notifier.notify(notification);
            }
        }
        err
    }
}

/// Run `work` on its own task so dropping the caller does not abort the call.
async fn spawn_settled<T, F>(path: &str, work: F) -> Result<T>
where
    T: Send + 'static,
    F: std::future::Future<Output = Result<T>> + Send + 'static,
{
    tokio::spawn(work)
        .await
        .unwrap_or_else(|err| Err(ApiError::new(FailureKind::Unknown(err.to_string()), path)))
}

async fn write_file(target: &Path, bytes: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = target.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(target, bytes).await
}
