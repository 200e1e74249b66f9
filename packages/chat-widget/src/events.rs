//! Host lifecycle notifications.

use crate::error::WidgetError;
use crate::types::Message;

/// Callbacks the embedding application can observe.
///
/// Every method has a no-op default, so hosts implement only what they need.
/// Callbacks are invoked synchronously after the state change they describe
/// has been published, never while widget state is locked.
pub trait WidgetEvents: Send + Sync {
    /// The chat core was mounted.
    fn on_ready(&self) {}

    fn on_open(&self) {}

    fn on_close(&self) {}

    /// The server confirmed a message the user sent.
    fn on_message_sent(&self, _message: &Message) {}

    /// A message was delivered from outside the send flow (e.g. pushed).
    fn on_message_received(&self, _message: &Message) {}

    /// Any failure: transport, validation or parsing.
    fn on_error(&self, _error: &WidgetError) {}
}

/// Events sink used when the host registers nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopEvents;

impl WidgetEvents for NoopEvents {}
