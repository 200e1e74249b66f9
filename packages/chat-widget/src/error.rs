//! Typed errors for the chat widget.
//!
//! Every failure the widget can observe (transport, validation, parsing) is
//! represented here so it can be shown in the UI and forwarded verbatim to the
//! host's `on_error` callback.

use std::time::Duration;

use thiserror::Error;

/// Result type for widget operations.
pub type Result<T> = std::result::Result<T, WidgetError>;

/// Errors surfaced by the API client, upload coordinator and chat core.
#[derive(Debug, Error)]
pub enum WidgetError {
    /// Transport failure (connection refused, DNS, reset, body stream error)
    #[error("network error: {0}")]
    Network(#[source] reqwest::Error),

    /// The operation did not settle within the configured timeout
    #[error("request timed out after {after:?}")]
    Timeout { after: Duration },

    /// Non-2xx response from the chat backend
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Response body could not be decoded
    #[error("parse error: {0}")]
    Parse(#[source] serde_json::Error),

    /// The auth token provider failed to produce a token
    #[error("auth error: {0}")]
    Auth(String),

    /// A file was rejected by the upload restrictions
    #[error("upload rejected: {0}")]
    Restriction(#[from] RestrictionError),

    /// The batch is uploading and cannot be modified
    #[error("an upload is already in progress")]
    UploadInProgress,

    /// `remove_file` was called with an index outside the batch
    #[error("file index {index} out of range (batch has {len} files)")]
    InvalidFileIndex { index: usize, len: usize },
}

impl WidgetError {
    /// Whether the failure is worth retrying automatically.
    ///
    /// Mirrors the usual HTTP client policy: transport failures and
    /// 408/413/429/500/502/503/504 are transient, everything else is not.
    pub fn is_transient(&self) -> bool {
        match self {
            WidgetError::Network(_) => true,
            WidgetError::Api { status, .. } => {
                matches!(status, 408 | 413 | 429 | 500 | 502 | 503 | 504)
            }
            _ => false,
        }
    }
}

/// Reasons a file is refused by the upload restrictions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RestrictionError {
    #[error("{filename} is {size} bytes, exceeding the {max} byte limit")]
    TooLarge { filename: String, size: u64, max: u64 },

    #[error("{filename} has a disallowed type ({mime_type})")]
    TypeNotAllowed { filename: String, mime_type: String },

    #[error("cannot add {filename}: at most {max} files per upload")]
    TooManyFiles { filename: String, max: usize },
}
