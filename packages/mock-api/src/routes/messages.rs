use axum::{
    extract::{Extension, Query},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::app::AppState;
use crate::error::ApiError;
use crate::replies;
use crate::store::{MessagePage, Role, StoredMessage};

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SendMessageBody {
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub attachments: Option<Vec<String>>,
}

#[derive(Debug, Serialize)]
pub struct SendMessageReply {
    pub message: StoredMessage,
    pub response: StoredMessage,
}

/// GET /messages
pub async fn list_messages_handler(
    Extension(state): Extension<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<MessagePage>, ApiError> {
    let page = state
        .store
        .read()
        .await
        .page(query.cursor.as_deref(), state.config.page_size)?;
    debug!(
        cursor = ?query.cursor,
        returned = page.messages.len(),
        has_more = page.has_more,
        "Served message page"
    );
    Ok(Json(page))
}

/// POST /messages
///
/// The user message is stored right away; the reply lands after the
/// configured delay and both are returned together.
pub async fn send_message_handler(
    Extension(state): Extension<AppState>,
    Json(body): Json<SendMessageBody>,
) -> Result<Json<SendMessageReply>, ApiError> {
    let ids = body.attachments.unwrap_or_default();
    if body.content.trim().is_empty() && ids.is_empty() {
        return Err(ApiError::BadRequest(
            "Message must have content or attachments".to_string(),
        ));
    }

    let message = {
        let mut store = state.store.write().await;
        let attachments = store.resolve_attachments(&ids);
        let message = StoredMessage::new(Role::User, body.content).with_attachments(attachments);
        store.push(message.clone());
        message
    };
    info!(
        message_id = %message.id,
        attachments = message.attachments.len(),
        "Stored user message"
    );

    tokio::time::sleep(state.config.reply_delay).await;

    let response = replies::generate(&message.content);
    state.store.write().await.push(response.clone());
    debug!(message_id = %response.id, "Stored assistant reply");

    Ok(Json(SendMessageReply { message, response }))
}
