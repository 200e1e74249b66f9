//! Embeddable Chat Widget
//!
//! A chat window that docks to a corner of the host page, talks to a small
//! REST backend and supports markdown, attachments and file uploads.
//!
//! # Usage
//!
//! ```rust,ignore
//! use chat_widget::{ChatWidget, ChatWidgetConfig, ChatWidgetProps, WidgetHandle};
//! use dioxus::prelude::*;
//!
//! let handle = WidgetHandle::mount(ChatWidgetConfig::new("https://chat.example.com/api"));
//!
//! // Inside the host's Dioxus tree:
//! rsx! { ChatWidget { handle } }
//! ```
//!
//! The state underneath the views is usable on its own:
//!
//! ```rust,ignore
//! let core = ChatCore::new(Arc::new(ApiClient::new(url)), Arc::new(NoopEvents), false);
//! core.load_messages().await;
//! core.send("hello", None).await;
//! ```
//!
//! # Modules
//!
//! - [`config`] - Host configuration and default merging
//! - [`api`] - Backend traits and the HTTP client
//! - [`upload`] - File staging, restrictions and batch upload
//! - [`chat`] - Conversation state and intents
//! - [`theme`], [`markdown`], [`format`] - Pure rendering helpers
//! - [`ui`] - Dioxus components
//! - [`testing`] - Mock backend and event recorder

pub mod api;
pub mod auth;
pub mod chat;
pub mod config;
pub mod error;
pub mod events;
pub mod format;
pub mod markdown;
pub mod theme;
pub mod types;
pub mod ui;
pub mod upload;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

// Re-export core types at crate root
pub use api::{ApiClient, ChatApi, RetryPolicy, UploadApi};
pub use auth::{AuthConfig, SecretString, TokenProvider, TokenSource};
pub use chat::{ChatCore, ChatState, LoadOutcome, MessageLog, SendOutcome};
pub use config::{ChatWidgetConfig, Position, ResolvedConfig, ThemeMode};
pub use error::{RestrictionError, Result, WidgetError};
pub use events::{NoopEvents, WidgetEvents};
pub use theme::ThemeStyle;
pub use types::{
    Attachment, AttachmentKind, LinkPreview, Message, MessagePage, MessageRole, MessageStatus,
    UploadedFile,
};
pub use ui::{ChatWidget, ChatWidgetProps, WidgetHandle};
pub use upload::{LocalFile, UploadBatch, UploadCoordinator, UploadOutcome};
