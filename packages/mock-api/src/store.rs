//! In-memory conversation and attachment registry.
//!
//! Messages are kept oldest-first. Pages are served newest-first and the
//! cursor names the oldest message already handed out, so the next page
//! continues with everything before it.

use std::collections::HashMap;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ApiError;
use crate::replies::GREETING;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttachmentKind {
    Image,
    File,
    Link,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: AttachmentKind,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
}

impl Attachment {
    pub fn new(kind: AttachmentKind, url: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            kind,
            url: url.into(),
            filename: None,
            mime_type: None,
            size: None,
            thumbnail_url: None,
            title: None,
            description: None,
            domain: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredMessage {
    pub id: String,
    pub role: Role,
    pub content: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<Attachment>,
    pub created_at: DateTime<Utc>,
}

impl StoredMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role,
            content: content.into(),
            attachments: Vec::new(),
            created_at: Utc::now(),
        }
    }

    pub fn with_attachments(mut self, attachments: Vec<Attachment>) -> Self {
        self.attachments = attachments;
        self
    }
}

/// One page of history, newest message first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessagePage {
    pub messages: Vec<StoredMessage>,
    pub has_more: bool,
    pub next_cursor: Option<String>,
}

#[derive(Debug, Default)]
pub struct Store {
    messages: Vec<StoredMessage>,
    attachments: HashMap<String, Attachment>,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    /// A conversation opened by the assistant's greeting a minute ago.
    pub fn seeded() -> Self {
        let mut greeting = StoredMessage::new(Role::Assistant, GREETING);
        greeting.id = "1".to_string();
        greeting.created_at = Utc::now() - Duration::seconds(60);
        Self {
            messages: vec![greeting],
            attachments: HashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn push(&mut self, message: StoredMessage) {
        self.messages.push(message);
    }

    pub fn register_attachment(&mut self, attachment: Attachment) {
        self.attachments.insert(attachment.id.clone(), attachment);
    }

    /// Look up uploaded attachments by id. Unknown ids are dropped.
    pub fn resolve_attachments(&self, ids: &[String]) -> Vec<Attachment> {
        ids.iter()
            .filter_map(|id| self.attachments.get(id).cloned())
            .collect()
    }

    /// Serve the page that ends just before `cursor`.
    pub fn page(&self, cursor: Option<&str>, page_size: Option<usize>) -> Result<MessagePage, ApiError> {
        let end = match cursor {
            None => self.messages.len(),
            Some(cursor) => {
                let id = decode_cursor(cursor)?;
                self.messages
                    .iter()
                    .position(|m| m.id == id)
                    .ok_or_else(|| ApiError::BadRequest("Unknown cursor".to_string()))?
            }
        };
        let start = page_size.map_or(0, |size| end.saturating_sub(size));

        let messages: Vec<StoredMessage> = self.messages[start..end].iter().rev().cloned().collect();
        let has_more = start > 0;
        let next_cursor = match messages.last() {
            Some(oldest) if has_more => Some(encode_cursor(&oldest.id)),
            _ => None,
        };

        Ok(MessagePage {
            messages,
            has_more,
            next_cursor,
        })
    }
}

pub fn encode_cursor(id: &str) -> String {
    URL_SAFE_NO_PAD.encode(id.as_bytes())
}

pub fn decode_cursor(cursor: &str) -> Result<String, ApiError> {
    let bytes = URL_SAFE_NO_PAD
        .decode(cursor)
        .map_err(|_| ApiError::BadRequest("Invalid cursor: not valid base64".to_string()))?;
    String::from_utf8(bytes)
        .map_err(|_| ApiError::BadRequest("Invalid cursor: not valid UTF-8".to_string()))
}
