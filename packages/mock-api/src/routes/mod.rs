pub mod health;
pub mod link_preview;
pub mod messages;
pub mod upload;

pub use health::health_handler;
pub use link_preview::link_preview_handler;
pub use messages::{list_messages_handler, send_message_handler};
pub use upload::upload_handler;
