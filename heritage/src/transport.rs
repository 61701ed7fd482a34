use crate::domain::{
    ApiRequest, Method, ProgressCallback, RawResponse, RequestBody, TransferProgress, UploadFile,
};
use crate::error::TransportError;
use crate::ports::Transport;
use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use reqwest::header::CONTENT_TYPE;
use reqwest::multipart::{Form, Part};
use reqwest::{Body, Client};
use tracing::debug;

/// Size of the slices an upload body is streamed in; progress is reported per slice.
const UPLOAD_CHUNK_BYTES: usize = 64 * 1024;

/// Most a download buffer is sized up front from the announced length.
const DOWNLOAD_PREALLOC_BYTES: u64 = 1024 * 1024;

/// reqwest-backed transport. Timeouts are applied per request.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new() -> Result<Self, TransportError> {
        let client = Client::builder()
            .user_agent(concat!("heritage/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

fn to_reqwest_method(method: Method) -> reqwest::Method {
    match method {
        Method::Get => reqwest::Method::GET,
        Method::Post => reqwest::Method::POST,
        Method::Put => reqwest::Method::PUT,
        Method::Patch => reqwest::Method::PATCH,
        Method::Delete => reqwest::Method::DELETE,
    }
}

fn upload_part(
    file: UploadFile,
    on_progress: Option<ProgressCallback>,
) -> Result<Part, TransportError> {
    let total = file.bytes.len() as u64;
    let chunks: Vec<Bytes> = (0..file.bytes.len())
        .step_by(UPLOAD_CHUNK_BYTES)
        .map(|start| {
            let end = (start + UPLOAD_CHUNK_BYTES).min(file.bytes.len());
            file.bytes.slice(start..end)
        })
        .collect();

    let mut sent = 0u64;
    let stream = futures::stream::iter(chunks.into_iter().map(move |chunk| {
        sent += chunk.len() as u64;
        if let Some(callback) = &on_progress {
            callback(TransferProgress {
                transferred: sent,
                total: Some(total),
            });
        }
        Ok::<Bytes, std::io::Error>(chunk)
    }));

    let mut part =
        Part::stream_with_length(Body::wrap_stream(stream), total).file_name(file.file_name);
    if let Some(content_type) = file.content_type {
        part = part
            .mime_str(&content_type)
            .map_err(|e| TransportError::InvalidRequest(e.to_string()))?;
    }
    Ok(part)
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: ApiRequest) -> Result<RawResponse, TransportError> {
        debug!("{} {}", request.method, request.url);

        let mut builder = self
            .client
            .request(to_reqwest_method(request.method), &request.url)
            .timeout(request.timeout);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let is_upload = matches!(request.body, RequestBody::File(_));
        builder = match request.body {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => builder.json(&value),
            RequestBody::File(file) => {
                let field_name = file.field_name.clone();
                let part = upload_part(file, request.on_progress.clone())?;
                builder.multipart(Form::new().part(field_name, part))
            }
        };

        let mut response = builder.send().await?;
        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let body = match (&request.on_progress, is_upload) {
            (Some(callback), false) => {
                // Content-Length is only a hint; the buffer grows with what arrives.
                let total = response.content_length();
                let reserve = total.map_or(0, |t| t.min(DOWNLOAD_PREALLOC_BYTES));
                let mut received = BytesMut::with_capacity(reserve as usize);
                while let Some(chunk) = response.chunk().await? {
                    received.extend_from_slice(&chunk);
                    callback(TransferProgress {
                        transferred: received.len() as u64,
                        total,
                    });
                }
                received.freeze()
            }
            _ => response.bytes().await?,
        };

        Ok(RawResponse {
            status,
            content_type,
            body,
        })
    }
}
