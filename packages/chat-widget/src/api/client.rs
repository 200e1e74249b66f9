//! HTTP implementation of the chat backend contract.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use super::{ChatApi, ProgressSink, RetryPolicy, UploadApi};
use crate::auth::AuthConfig;
use crate::config::ResolvedConfig;
use crate::error::{Result, WidgetError};
use crate::types::{LinkPreview, MessagePage, SendMessageRequest, SendMessageResponse, UploadedFile};
use crate::upload::LocalFile;

/// Budget for one operation, retries included.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Size of the pieces an upload body is streamed in.
const UPLOAD_CHUNK_SIZE: usize = 64 * 1024;

/// Chat backend client bound to one base URL.
///
/// Cheap to clone; every widget mount owns its own instance.
#[derive(Clone)]
pub struct ApiClient {
    http_client: Client,
    base_url: String,
    auth: AuthConfig,
    timeout: Duration,
    retry: RetryPolicy,
    upload_endpoint: String,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http_client: Client::new(),
            base_url: base_url.into(),
            auth: AuthConfig::default(),
            timeout: DEFAULT_TIMEOUT,
            retry: RetryPolicy::default(),
            upload_endpoint: "/upload".to_string(),
        }
    }

    /// Build a client from a resolved widget configuration.
    pub fn from_config(config: &ResolvedConfig) -> Self {
        Self::new(config.api_url.clone())
            .with_auth(config.auth.clone())
            .with_upload_endpoint(config.upload.endpoint.clone())
    }

    pub fn with_auth(mut self, auth: AuthConfig) -> Self {
        self.auth = auth;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Path (relative to the base URL) or absolute URL for uploads.
    pub fn with_upload_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.upload_endpoint = endpoint.into();
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// Run a request with the retry policy, bounded by the timeout.
    async fn execute<T, F>(&self, operation: &'static str, build: F) -> Result<T>
    where
        T: DeserializeOwned,
        F: Fn(&Client) -> RequestBuilder,
    {
        tokio::time::timeout(self.timeout, self.execute_with_retry(operation, build))
            .await
            .map_err(|_| WidgetError::Timeout {
                after: self.timeout,
            })?
    }

    async fn execute_with_retry<T, F>(&self, operation: &'static str, build: F) -> Result<T>
    where
        T: DeserializeOwned,
        F: Fn(&Client) -> RequestBuilder,
    {
        let mut attempt = 0;
        loop {
            match self.send(build(&self.http_client)).await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_transient() && attempt < self.retry.max_retries => {
                    let delay = self.retry.delay_for(attempt);
                    attempt += 1;
                    warn!(
                        operation,
                        attempt,
                        error = %e,
                        delay_ms = delay.as_millis() as u64,
                        "Transient failure, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// One attempt: attach auth, send, check status, decode.
    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let mut request = request;
        if let Some((name, value)) = self.auth.header().await? {
            request = request.header(name, value);
        }

        let resp = request.send().await.map_err(WidgetError::Network)?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(WidgetError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let body = resp.bytes().await.map_err(WidgetError::Network)?;
        serde_json::from_slice(&body).map_err(WidgetError::Parse)
    }
}

#[async_trait]
impl ChatApi for ApiClient {
    async fn send_message(&self, request: &SendMessageRequest) -> Result<SendMessageResponse> {
        debug!(
            content_len = request.content.len(),
            attachments = request.attachments.as_ref().map_or(0, Vec::len),
            "Sending message"
        );
        let url = self.url("messages");
        self.execute("send_message", |client| client.post(&url).json(request))
            .await
    }

    async fn list_messages(&self, cursor: Option<&str>) -> Result<MessagePage> {
        debug!(cursor = ?cursor, "Fetching message page");
        let url = self.url("messages");
        self.execute("list_messages", |client| {
            let request = client.get(&url);
            match cursor {
                Some(cursor) => request.query(&[("cursor", cursor)]),
                None => request,
            }
        })
        .await
    }

    async fn fetch_link_preview(&self, url: &str) -> Result<LinkPreview> {
        debug!(url, "Fetching link preview");
        let endpoint = self.url("link-preview");
        self.execute("fetch_link_preview", |client| {
            client.get(&endpoint).query(&[("url", url)])
        })
        .await
    }
}

#[async_trait]
impl UploadApi for ApiClient {
    async fn upload_file(&self, file: &LocalFile, progress: ProgressSink) -> Result<UploadedFile> {
        let total = file.size();
        debug!(file = %file.name, size = total, mime = %file.mime_type, "Uploading file");

        let chunks: Vec<Bytes> = file
            .data
            .chunks(UPLOAD_CHUNK_SIZE)
            .map(|chunk| file.data.slice_ref(chunk))
            .collect();
        let mut sent = 0u64;
        let stream = futures::stream::iter(chunks).map(move |chunk| {
            sent += chunk.len() as u64;
            progress(sent);
            Ok::<Bytes, std::io::Error>(chunk)
        });

        let part = Part::stream_with_length(reqwest::Body::wrap_stream(stream), total)
            .file_name(file.name.clone())
            .mime_str(&file.mime_type)
            .map_err(WidgetError::Network)?;
        let form = Form::new().part("file", part);

        // Streamed bodies cannot be replayed, so uploads are not retried.
        let request = self.http_client.post(self.url(&self.upload_endpoint)).multipart(form);
        tokio::time::timeout(self.timeout, self.send(request))
            .await
            .map_err(|_| WidgetError::Timeout {
                after: self.timeout,
            })?
    }
}
