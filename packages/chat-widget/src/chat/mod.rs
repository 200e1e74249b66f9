//! The chat state core.
//!
//! [`ChatCore`] owns one conversation. Views read it through
//! [`ChatCore::snapshot`] or [`ChatCore::subscribe`] and change it only through
//! the intent methods. Each intent applies its state change in a single step on
//! the watch channel, then notifies the host outside of it.

pub mod state;

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::watch;
use tracing::{debug, info, warn};
use uuid::Uuid;

pub use state::{ChatState, MessageLog};

use crate::api::ChatApi;
use crate::config::ResolvedConfig;
use crate::events::WidgetEvents;
use crate::types::{Message, MessageRole, MessageStatus, SendMessageRequest};

/// Shown when a page fetch fails.
pub const LOAD_FAILED: &str = "Failed to load messages";
/// Shown when a send fails.
pub const SEND_FAILED: &str = "Failed to send message";

/// Result of [`ChatCore::load_messages`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// A fetch was already in flight, or there is no older history.
    Skipped,
    Loaded { fetched: usize },
    Failed,
}

/// Result of [`ChatCore::send`].
#[derive(Debug, Clone, PartialEq)]
pub enum SendOutcome {
    /// The server-confirmed user message.
    Sent(Message),
    Failed,
}

struct ChatInner {
    api: Arc<dyn ChatApi>,
    events: Arc<dyn WidgetEvents>,
    state: watch::Sender<ChatState>,
    /// Requests behind messages that failed to send, keyed by the errored
    /// message's id. An entry lives until `retry` or `discard` takes it.
    failed: Mutex<HashMap<String, SendMessageRequest>>,
}

/// One widget's conversation.
#[derive(Clone)]
pub struct ChatCore {
    inner: Arc<ChatInner>,
}

impl ChatCore {
    /// Create the core and report readiness to the host.
    pub fn new(api: Arc<dyn ChatApi>, events: Arc<dyn WidgetEvents>, start_open: bool) -> Self {
        let (state, _) = watch::channel(ChatState {
            is_open: start_open,
            ..ChatState::default()
        });
        let core = Self {
            inner: Arc::new(ChatInner {
                api,
                events,
                state,
                failed: Mutex::new(HashMap::new()),
            }),
        };
        debug!(start_open, "Chat core ready");
        core.inner.events.on_ready();
        core
    }

    pub fn from_config(api: Arc<dyn ChatApi>, config: &ResolvedConfig) -> Self {
        Self::new(api, Arc::clone(&config.events), config.start_open)
    }

    pub fn snapshot(&self) -> ChatState {
        self.inner.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ChatState> {
        self.inner.state.subscribe()
    }

    /// Whether both handles drive the same conversation.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    pub fn toggle(&self) {
        let mut now_open = false;
        self.inner.state.send_modify(|s| {
            s.is_open = !s.is_open;
            now_open = s.is_open;
        });
        self.notify_visibility(now_open);
    }

    pub fn open(&self) {
        if self.set_open(true) {
            self.notify_visibility(true);
        }
    }

    pub fn close(&self) {
        if self.set_open(false) {
            self.notify_visibility(false);
        }
    }

    fn set_open(&self, open: bool) -> bool {
        self.inner.state.send_if_modified(|s| {
            let changed = s.is_open != open;
            s.is_open = open;
            changed
        })
    }

    fn notify_visibility(&self, open: bool) {
        if open {
            self.inner.events.on_open();
        } else {
            self.inner.events.on_close();
        }
    }

    /// Fetch the page older than everything loaded so far.
    ///
    /// Returns [`LoadOutcome::Skipped`] without touching state or the network
    /// while another fetch is in flight or once history is exhausted.
    pub async fn load_messages(&self) -> LoadOutcome {
        let mut cursor = None;
        let started = self.inner.state.send_if_modified(|s| {
            if s.is_loading || !s.has_more {
                return false;
            }
            s.is_loading = true;
            s.error = None;
            cursor = s.next_cursor.clone();
            true
        });
        if !started {
            debug!("Load skipped");
            return LoadOutcome::Skipped;
        }

        match self.inner.api.list_messages(cursor.as_deref()).await {
            Ok(page) => {
                let fetched = page.messages.len();
                debug!(fetched, has_more = page.has_more, "Loaded message page");
                self.inner.state.send_modify(|s| {
                    s.messages.prepend(page.messages.into_iter().rev());
                    s.has_more = page.has_more;
                    s.next_cursor = page.next_cursor;
                    s.is_loading = false;
                });
                LoadOutcome::Loaded { fetched }
            }
            Err(e) => {
                warn!(error = %e, cursor = ?cursor, "Failed to load messages");
                self.inner.state.send_modify(|s| {
                    s.is_loading = false;
                    s.error = Some(LOAD_FAILED.to_string());
                });
                self.inner.events.on_error(&e);
                LoadOutcome::Failed
            }
        }
    }

    /// Send a user message optimistically.
    ///
    /// A provisional message with a `temp-` id is shown at once. On success it
    /// is swapped for the confirmed message and the reply; on failure it stays,
    /// marked as errored.
    pub async fn send(&self, content: impl Into<String>, attachments: Option<Vec<String>>) -> SendOutcome {
        let content = content.into();
        let provisional_id = format!("temp-{}", Uuid::new_v4());
        let provisional = Message::new(&provisional_id, MessageRole::User, content.clone())
            .with_status(MessageStatus::Sending);

        self.inner.state.send_modify(|s| {
            s.messages.push(provisional);
            s.is_typing = true;
        });

        let request = SendMessageRequest {
            content,
            attachments: attachments.filter(|ids| !ids.is_empty()),
        };
        match self.inner.api.send_message(&request).await {
            Ok(response) => {
                let confirmed = response.message.with_status(MessageStatus::Sent);
                info!(id = %confirmed.id, replied = response.response.is_some(), "Message sent");
                let published = confirmed.clone();
                self.inner.state.send_modify(|s| {
                    s.messages.remove(&provisional_id);
                    s.messages.push(published);
                    if let Some(reply) = response.response {
                        s.messages.push(reply);
                    }
                    s.is_typing = false;
                });
                self.inner.events.on_message_sent(&confirmed);
                SendOutcome::Sent(confirmed)
            }
            Err(e) => {
                warn!(error = %e, id = %provisional_id, "Failed to send message");
                self.inner.state.send_modify(|s| {
                    s.messages.set_status(&provisional_id, MessageStatus::Error);
                    s.is_typing = false;
                    s.error = Some(SEND_FAILED.to_string());
                });
                self.lock_failed().insert(provisional_id, request);
                self.inner.events.on_error(&e);
                SendOutcome::Failed
            }
        }
    }

    /// Resend a message that failed, replacing its errored entry.
    ///
    /// Returns `None` when `message_id` is not a failed send.
    pub async fn retry(&self, message_id: &str) -> Option<SendOutcome> {
        let request = self.lock_failed().remove(message_id)?;
        self.inner.state.send_modify(|s| {
            s.messages.remove(message_id);
        });
        debug!(id = message_id, "Retrying message");
        Some(self.send(request.content, request.attachments).await)
    }

    /// Drop a failed message and the request kept for retrying it.
    ///
    /// Returns `false` when `message_id` is not a failed send.
    pub fn discard(&self, message_id: &str) -> bool {
        if self.lock_failed().remove(message_id).is_none() {
            return false;
        }
        self.inner.state.send_modify(|s| {
            s.messages.remove(message_id);
        });
        debug!(id = message_id, "Discarded failed message");
        true
    }

    /// Append a message delivered outside the send flow.
    pub fn add_message(&self, message: Message) {
        let received = message.clone();
        self.inner.state.send_modify(|s| s.messages.push(message));
        self.inner.events.on_message_received(&received);
    }

    pub fn clear_error(&self) {
        self.inner.state.send_if_modified(|s| s.error.take().is_some());
    }

    pub fn set_typing(&self, typing: bool) {
        self.inner.state.send_if_modified(|s| {
            let changed = s.is_typing != typing;
            s.is_typing = typing;
            changed
        });
    }

    fn lock_failed(&self) -> MutexGuard<'_, HashMap<String, SendMessageRequest>> {
        self.inner.failed.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
