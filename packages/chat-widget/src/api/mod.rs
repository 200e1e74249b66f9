//! Backend access.
//!
//! [`ChatApi`] and [`UploadApi`] are the seams the chat core and the upload
//! coordinator depend on. [`ApiClient`] implements both over HTTP.

pub mod client;
pub mod retry;

use std::sync::Arc;

use async_trait::async_trait;

pub use client::{ApiClient, DEFAULT_TIMEOUT};
pub use retry::RetryPolicy;

use crate::error::Result;
use crate::types::{LinkPreview, MessagePage, SendMessageRequest, SendMessageResponse, UploadedFile};
use crate::upload::LocalFile;

/// Receives the cumulative number of bytes sent for one file.
pub type ProgressSink = Arc<dyn Fn(u64) + Send + Sync>;

/// Conversation endpoints.
#[async_trait]
pub trait ChatApi: Send + Sync {
    /// `POST /messages`
    async fn send_message(&self, request: &SendMessageRequest) -> Result<SendMessageResponse>;

    /// `GET /messages`: one page older than `cursor`, newest first.
    /// `None` asks for the most recent page.
    async fn list_messages(&self, cursor: Option<&str>) -> Result<MessagePage>;

    /// `GET /link-preview`, best effort.
    async fn fetch_link_preview(&self, url: &str) -> Result<LinkPreview>;
}

/// File transfer endpoint.
#[async_trait]
pub trait UploadApi: Send + Sync {
    /// Upload a single file as multipart field `file`.
    async fn upload_file(&self, file: &LocalFile, progress: ProgressSink) -> Result<UploadedFile>;
}
