//! Testing utilities including mock implementations.
//!
//! These let tests drive the chat core and the upload coordinator without a
//! backend. Responses can be scripted up front or gated behind a oneshot
//! channel, so a test decides exactly when an in-flight request settles.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use chrono::{Duration, TimeZone, Utc};
use tokio::sync::oneshot;

use crate::api::{ChatApi, ProgressSink, UploadApi};
use crate::error::{Result, WidgetError};
use crate::events::WidgetEvents;
use crate::types::{
    LinkPreview, Message, MessagePage, MessageRole, SendMessageRequest, SendMessageResponse,
    UploadedFile,
};
use crate::upload::LocalFile;

/// A reply that is either ready now or released later by the test.
enum Scripted<T> {
    Ready(Result<T>),
    Gated(oneshot::Receiver<Result<T>>),
}

impl<T> Scripted<T> {
    async fn settle(self) -> Result<T> {
        match self {
            Scripted::Ready(result) => result,
            Scripted::Gated(rx) => rx.await.unwrap_or_else(|_| {
                Err(WidgetError::Api {
                    status: 499,
                    message: "gate dropped".into(),
                })
            }),
        }
    }
}

/// Record of a call made to the mock API.
#[derive(Debug, Clone, PartialEq)]
pub enum MockCall {
    SendMessage {
        content: String,
        attachments: Option<Vec<String>>,
    },
    ListMessages {
        cursor: Option<String>,
    },
    LinkPreview {
        url: String,
    },
    Upload {
        filename: String,
    },
}

/// A mock chat backend for testing.
///
/// With nothing scripted, sends are echoed back with an assistant reply,
/// listing returns an empty final page and uploads succeed.
#[derive(Default)]
pub struct MockChatApi {
    sends: Arc<RwLock<VecDeque<Scripted<SendMessageResponse>>>>,
    pages: Arc<RwLock<VecDeque<Scripted<MessagePage>>>>,
    uploads: Arc<RwLock<HashMap<String, Scripted<UploadedFile>>>>,
    calls: Arc<RwLock<Vec<MockCall>>>,
}

impl MockChatApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a page for the next `list_messages` call.
    pub fn with_page(self, page: MessagePage) -> Self {
        self.pages.write().unwrap().push_back(Scripted::Ready(Ok(page)));
        self
    }

    pub fn with_list_error(self, error: WidgetError) -> Self {
        self.pages.write().unwrap().push_back(Scripted::Ready(Err(error)));
        self
    }

    /// Queue a response for the next `send_message` call.
    pub fn with_send_response(self, response: SendMessageResponse) -> Self {
        self.sends
            .write()
            .unwrap()
            .push_back(Scripted::Ready(Ok(response)));
        self
    }

    pub fn with_send_error(self, error: WidgetError) -> Self {
        self.sends.write().unwrap().push_back(Scripted::Ready(Err(error)));
        self
    }

    /// Make the upload of `filename` fail.
    pub fn with_upload_error(self, filename: impl Into<String>, error: WidgetError) -> Self {
        self.uploads
            .write()
            .unwrap()
            .insert(filename.into(), Scripted::Ready(Err(error)));
        self
    }

    /// Hold the next `list_messages` call until the returned sender fires.
    pub fn gate_list(&self) -> oneshot::Sender<Result<MessagePage>> {
        let (tx, rx) = oneshot::channel();
        self.pages.write().unwrap().push_back(Scripted::Gated(rx));
        tx
    }

    /// Hold the next `send_message` call until the returned sender fires.
    pub fn gate_send(&self) -> oneshot::Sender<Result<SendMessageResponse>> {
        let (tx, rx) = oneshot::channel();
        self.sends.write().unwrap().push_back(Scripted::Gated(rx));
        tx
    }

    /// Hold the upload of `filename` until the returned sender fires.
    pub fn gate_upload(&self, filename: impl Into<String>) -> oneshot::Sender<Result<UploadedFile>> {
        let (tx, rx) = oneshot::channel();
        self.uploads
            .write()
            .unwrap()
            .insert(filename.into(), Scripted::Gated(rx));
        tx
    }

    /// Get all calls made to this mock.
    pub fn calls(&self) -> Vec<MockCall> {
        self.calls.read().unwrap().clone()
    }

    pub fn list_calls(&self) -> usize {
        self.calls
            .read()
            .unwrap()
            .iter()
            .filter(|c| matches!(c, MockCall::ListMessages { .. }))
            .count()
    }

    pub fn upload_calls(&self) -> usize {
        self.calls
            .read()
            .unwrap()
            .iter()
            .filter(|c| matches!(c, MockCall::Upload { .. }))
            .count()
    }

    fn record(&self, call: MockCall) {
        self.calls.write().unwrap().push(call);
    }
}

#[async_trait]
impl ChatApi for MockChatApi {
    async fn send_message(&self, request: &SendMessageRequest) -> Result<SendMessageResponse> {
        self.record(MockCall::SendMessage {
            content: request.content.clone(),
            attachments: request.attachments.clone(),
        });
        let scripted = self.sends.write().unwrap().pop_front();
        match scripted {
            Some(reply) => reply.settle().await,
            None => Ok(echo_response(&request.content)),
        }
    }

    async fn list_messages(&self, cursor: Option<&str>) -> Result<MessagePage> {
        self.record(MockCall::ListMessages {
            cursor: cursor.map(str::to_string),
        });
        let scripted = self.pages.write().unwrap().pop_front();
        match scripted {
            Some(reply) => reply.settle().await,
            None => Ok(MessagePage {
                messages: Vec::new(),
                has_more: false,
                next_cursor: None,
            }),
        }
    }

    async fn fetch_link_preview(&self, url: &str) -> Result<LinkPreview> {
        self.record(MockCall::LinkPreview {
            url: url.to_string(),
        });
        Ok(LinkPreview {
            url: url.to_string(),
            title: "Example".into(),
            description: "Example page".into(),
            image: None,
            domain: url::Url::parse(url)
                .ok()
                .and_then(|u| u.host_str().map(str::to_string))
                .unwrap_or_default(),
        })
    }
}

#[async_trait]
impl UploadApi for MockChatApi {
    async fn upload_file(&self, file: &LocalFile, progress: ProgressSink) -> Result<UploadedFile> {
        self.record(MockCall::Upload {
            filename: file.name.clone(),
        });
        progress(file.size() / 2);
        let scripted = self.uploads.write().unwrap().remove(&file.name);
        let result = match scripted {
            Some(reply) => reply.settle().await,
            None => Ok(uploaded_descriptor(file)),
        };
        if result.is_ok() {
            progress(file.size());
        }
        result
    }
}

/// The descriptor the mock returns for a successful upload.
pub fn uploaded_descriptor(file: &LocalFile) -> UploadedFile {
    let url = format!("https://files.test/{}", file.name);
    UploadedFile {
        id: format!("upload-{}", file.name),
        thumbnail_url: file.is_image().then(|| url.clone()),
        url,
        filename: file.name.clone(),
        mime_type: file.mime_type.clone(),
        size: file.size(),
    }
}

/// Server echo of `content` plus an assistant reply.
pub fn echo_response(content: &str) -> SendMessageResponse {
    let id = uuid::Uuid::new_v4();
    SendMessageResponse {
        message: Message::new(format!("user-{id}"), MessageRole::User, content),
        response: Some(Message::new(
            format!("assistant-{id}"),
            MessageRole::Assistant,
            format!("Echo: {content}"),
        )),
    }
}

/// A message with a fixed timestamp `minute` minutes into the fixture day.
pub fn message_at(id: &str, role: MessageRole, content: &str, minute: i64) -> Message {
    let base = Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap();
    Message {
        created_at: base + Duration::minutes(minute),
        ..Message::new(id, role, content)
    }
}

/// A host callback as seen by [`RecordingEvents`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordedEvent {
    Ready,
    Open,
    Close,
    MessageSent { id: String, content: String },
    MessageReceived { id: String },
    Error(String),
}

/// Records every host callback in order.
#[derive(Default)]
pub struct RecordingEvents {
    events: RwLock<Vec<RecordedEvent>>,
}

impl RecordingEvents {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn events(&self) -> Vec<RecordedEvent> {
        self.events.read().unwrap().clone()
    }

    pub fn errors(&self) -> Vec<String> {
        self.events
            .read()
            .unwrap()
            .iter()
            .filter_map(|e| match e {
                RecordedEvent::Error(message) => Some(message.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, wanted: &RecordedEvent) -> usize {
        self.events
            .read()
            .unwrap()
            .iter()
            .filter(|e| *e == wanted)
            .count()
    }

    fn push(&self, event: RecordedEvent) {
        self.events.write().unwrap().push(event);
    }
}

impl WidgetEvents for RecordingEvents {
    fn on_ready(&self) {
        self.push(RecordedEvent::Ready);
    }

    fn on_open(&self) {
        self.push(RecordedEvent::Open);
    }

    fn on_close(&self) {
        self.push(RecordedEvent::Close);
    }

    fn on_message_sent(&self, message: &Message) {
        self.push(RecordedEvent::MessageSent {
            id: message.id.clone(),
            content: message.content.clone(),
        });
    }

    fn on_message_received(&self, message: &Message) {
        self.push(RecordedEvent::MessageReceived {
            id: message.id.clone(),
        });
    }

    fn on_error(&self, error: &WidgetError) {
        self.push(RecordedEvent::Error(error.to_string()));
    }
}
