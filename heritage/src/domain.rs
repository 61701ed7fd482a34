use bytes::Bytes;
use serde_json::Value;
use shared_http::QueryParams;
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        }
    }

    pub fn is_read(&self) -> bool {
        matches!(self, Method::Get)
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Bytes moved so far for an upload or download.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferProgress {
    pub transferred: u64,
    pub total: Option<u64>,
}

impl TransferProgress {
    /// Completion in whole percent, when the total size is known.
    pub fn percent(&self) -> Option<u8> {
        match self.total {
            Some(0) => Some(100),
            Some(total) => Some(((self.transferred.min(total) * 100) / total) as u8),
            None => None,
        }
    }
}

pub type ProgressCallback = Arc<dyn Fn(TransferProgress) + Send + Sync>;

/// A file to send as a multipart upload.
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub field_name: String,
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

impl UploadFile {
    pub fn new(file_name: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        Self {
            field_name: "file".to_string(),
            file_name: file_name.into(),
            content_type: None,
            bytes: bytes.into(),
        }
    }

    pub fn with_field_name(mut self, field_name: impl Into<String>) -> Self {
        self.field_name = field_name.into();
        self
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Read a file from disk, naming the part after the file.
    pub async fn from_path(path: impl AsRef<Path>) -> shared::Result<Self> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .ok_or_else(|| {
                shared::Error::Internal(format!("{} has no file name", path.display()))
            })?;
        Ok(Self::new(file_name, bytes))
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

#[derive(Debug, Clone)]
pub enum RequestBody {
    Empty,
    Json(Value),
    File(UploadFile),
}

/// Per-call options layered over the client defaults.
#[derive(Clone, Default)]
pub struct RequestConfig {
    pub headers: Vec<(String, String)>,
    pub timeout: Option<Duration>,
    /// Go to the network even when a fresh cached response exists.
    pub skip_cache: bool,
    /// Suppress the user notification for this call's failures.
    pub skip_notification: bool,
    /// Download progress. Uploads take their callback explicitly.
    pub on_progress: Option<ProgressCallback>,
}

impl RequestConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn skip_cache(mut self) -> Self {
        self.skip_cache = true;
        self
    }

    pub fn skip_notification(mut self) -> Self {
        self.skip_notification = true;
        self
    }

    pub fn on_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(TransferProgress) + Send + Sync + 'static,
    {
        self.on_progress = Some(Arc::new(callback));
        self
    }
}

impl fmt::Debug for RequestConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestConfig")
            .field("headers", &self.headers)
            .field("timeout", &self.timeout)
            .field("skip_cache", &self.skip_cache)
            .field("skip_notification", &self.skip_notification)
            .field("on_progress", &self.on_progress.is_some())
            .finish()
    }
}

/// A fully resolved request, ready for a transport.
#[derive(Clone)]
pub struct ApiRequest {
    pub method: Method,
    /// Path as the caller named it, used for policy lookup and error reports.
    pub path: String,
    pub url: String,
    pub query: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
    pub body: RequestBody,
    pub timeout: Duration,
    pub on_progress: Option<ProgressCallback>,
}

impl ApiRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

impl fmt::Debug for ApiRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let headers: Vec<(&str, &str)> = self
            .headers
            .iter()
            .map(|(n, v)| {
                if n.eq_ignore_ascii_case("authorization") {
                    (n.as_str(), "<redacted>")
                } else {
                    (n.as_str(), v.as_str())
                }
            })
            .collect();
        f.debug_struct("ApiRequest")
            .field("method", &self.method)
            .field("url", &self.url)
            .field("query", &self.query)
            .field("headers", &headers)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// What came back over the wire, before any interpretation.
#[derive(Debug, Clone, PartialEq)]
pub struct RawResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Bytes,
}

impl RawResponse {
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            content_type: None,
            body: body.into(),
        }
    }

    pub fn json(status: u16, value: &Value) -> Self {
        Self {
            status,
            content_type: Some("application/json".to_string()),
            body: Bytes::from(value.to_string()),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Parse the body as JSON. An empty body reads as `null`.
    pub fn parse_json(&self) -> Result<Value, serde_json::Error> {
        if self.body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Value::Null);
        }
        serde_json::from_slice(&self.body)
    }
}

/// Identity of a read for caching and deduplication.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    method: Method,
    url: String,
    params: String,
}

impl CacheKey {
    pub fn new(method: Method, url: &str, params: &QueryParams) -> Self {
        Self {
            method,
            url: url.to_string(),
            params: params.serialize(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.method, self.url, self.params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_progress_percent() {
        let half = TransferProgress {
            transferred: 50,
            total: Some(200),
        };
        assert_eq!(half.percent(), Some(25));
        let unknown = TransferProgress {
            transferred: 50,
            total: None,
        };
        assert_eq!(unknown.percent(), None);
        let empty = TransferProgress {
            transferred: 0,
            total: Some(0),
        };
        assert_eq!(empty.percent(), Some(100));
    }

    #[test]
    fn test_cache_key_ignores_param_order() {
        let a = CacheKey::new(
            Method::Get,
            "/api/heritage-sites",
            &QueryParams::new().with("page", 0).with("size", 10),
        );
        let b = CacheKey::new(
            Method::Get,
            "/api/heritage-sites",
            &QueryParams::new().with("size", 10).with("page", 0),
        );
        assert_eq!(a, b);
        let c = CacheKey::new(
            Method::Get,
            "/api/heritage-sites",
            &QueryParams::new().with("page", 1),
        );
        assert_ne!(a, c);
    }

    #[test]
    fn test_raw_response_empty_body_is_null() {
        let response = RawResponse::new(204, Bytes::new());
        assert_eq!(response.parse_json().unwrap(), Value::Null);
        let response = RawResponse::json(200, &json!({"id": 1}));
        assert_eq!(response.parse_json().unwrap(), json!({"id": 1}));
    }

    #[test]
    fn test_debug_redacts_authorization() {
        let request = ApiRequest {
            method: Method::Get,
            path: "/api/users".into(),
            url: "http://localhost/api/users".into(),
            query: vec![],
            headers: vec![("Authorization".into(), "Bearer secret".into())],
            body: RequestBody::Empty,
            timeout: Duration::from_secs(1),
            on_progress: None,
        };
        let printed = format!("{:?}", request);
        assert!(!printed.contains("secret"));
        assert_eq!(request.header("authorization"), Some("Bearer secret"));
    }
}
