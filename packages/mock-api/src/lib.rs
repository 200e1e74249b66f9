//! Mock Chat API
//!
//! A small axum backend speaking the chat widget's REST contract. It keeps the
//! conversation in memory, stores uploads on disk and answers every message
//! with a canned reply chosen by keyword.
//!
//! # Routes
//!
//! - `GET /messages` - newest-first pages, opaque `cursor` query parameter
//! - `POST /messages` - store a user message and return it with the reply
//! - `POST /upload` - multipart `file` field, returns the uploaded descriptor
//! - `GET /link-preview?url=..` - canned preview for any absolute URL
//! - `GET /uploads/*` - static files written by `/upload`
//! - `GET /health`

pub mod app;
pub mod config;
pub mod error;
pub mod replies;
pub mod routes;
pub mod store;

pub use app::{build_router, serve, AppState};
pub use config::MockConfig;
pub use error::ApiError;
pub use store::{Attachment, AttachmentKind, MessagePage, Role, Store, StoredMessage};
