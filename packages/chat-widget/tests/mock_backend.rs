//! End-to-end runs against the demo backend on an ephemeral port.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chat_widget::{
    ApiClient, AttachmentKind, ChatApi, ChatCore, LoadOutcome, LocalFile, MessageRole,
    MessageStatus, NoopEvents, SendOutcome, UploadCoordinator, UploadOutcome, WidgetError,
};
use chat_widget::config::UploadLimits;
use mock_api::{AppState, MockConfig};
use tokio::net::TcpListener;
use tokio_test::assert_ok;

struct Backend {
    base_url: String,
    upload_dir: PathBuf,
}

impl Drop for Backend {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.upload_dir);
    }
}

async fn spawn_backend(reply_delay: Duration, page_size: Option<usize>) -> Backend {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base_url = format!("http://{}", listener.local_addr().unwrap());
    let upload_dir = std::env::temp_dir().join(format!("chat-widget-it-{}", uuid::Uuid::new_v4()));

    let config = MockConfig {
        public_url: base_url.clone(),
        upload_dir: upload_dir.clone(),
        reply_delay,
        page_size,
        ..MockConfig::default()
    };
    tokio::spawn(mock_api::serve(listener, AppState::new(config)));

    Backend {
        base_url,
        upload_dir,
    }
}

fn core_for(client: ApiClient) -> ChatCore {
    ChatCore::new(Arc::new(client), Arc::new(NoopEvents), true)
}

#[tokio::test]
async fn fresh_conversation_loads_in_one_page() {
    let backend = spawn_backend(Duration::ZERO, None).await;
    let core = core_for(ApiClient::new(&backend.base_url));

    assert_eq!(core.load_messages().await, LoadOutcome::Loaded { fetched: 1 });

    let state = core.snapshot();
    assert!(!state.has_more);
    assert_eq!(state.next_cursor, None);
    assert_eq!(state.messages.len(), 1);
    assert_eq!(state.messages.to_vec()[0].role, MessageRole::Assistant);

    // History is exhausted, so a second load never reaches the network.
    assert_eq!(core.load_messages().await, LoadOutcome::Skipped);
}

#[tokio::test]
async fn code_keyword_gets_a_code_block_reply() {
    let backend = spawn_backend(Duration::from_millis(50), None).await;
    let core = core_for(ApiClient::new(&backend.base_url));

    let outcome = core.send("kod", None).await;
    let SendOutcome::Sent(confirmed) = outcome else {
        panic!("send failed: {:?}", core.snapshot().error);
    };
    assert_eq!(confirmed.content, "kod");
    assert!(!confirmed.id.starts_with("temp-"));

    let messages = core.snapshot().messages.to_vec();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].status, Some(MessageStatus::Sent));
    assert_eq!(messages[1].role, MessageRole::Assistant);
    assert!(messages[1].content.starts_with("```javascript"));
    assert!(!core.snapshot().is_typing);
}

#[tokio::test]
async fn history_pages_prepend_in_chronological_order() {
    let backend = spawn_backend(Duration::ZERO, Some(2)).await;
    let writer = core_for(ApiClient::new(&backend.base_url));
    writer.send("one", None).await;
    writer.send("two", None).await;

    // Five messages on the server: greeting, then two exchanges.
    let reader = core_for(ApiClient::new(&backend.base_url));
    assert_eq!(reader.load_messages().await, LoadOutcome::Loaded { fetched: 2 });
    assert!(reader.snapshot().has_more);
    assert_eq!(reader.load_messages().await, LoadOutcome::Loaded { fetched: 2 });
    assert_eq!(reader.load_messages().await, LoadOutcome::Loaded { fetched: 1 });

    let state = reader.snapshot();
    assert!(!state.has_more);
    let contents: Vec<String> = state.messages.iter().map(|m| m.content.clone()).collect();
    assert_eq!(contents.len(), 5);
    assert_eq!(contents[1], "one");
    assert_eq!(contents[3], "two");
    assert_eq!(state.messages.to_vec()[0].id, "1");
}

#[tokio::test]
async fn uploaded_file_is_attached_to_the_next_message() {
    let backend = spawn_backend(Duration::ZERO, None).await;
    let client = ApiClient::new(&backend.base_url);
    let uploads = UploadCoordinator::new(
        Arc::new(client.clone()),
        UploadLimits::default(),
        Arc::new(NoopEvents),
    );

    let report = uploads
        .add_files([LocalFile::new("notes.txt", "meeting notes".as_bytes().to_vec())])
        .unwrap();
    assert_eq!(report.accepted, 1);

    let outcome = assert_ok!(uploads.upload().await);
    let UploadOutcome::Completed(files) = &outcome else {
        panic!("upload did not complete: {outcome:?}");
    };
    assert_eq!(files[0].filename, "notes.txt");
    assert_eq!(files[0].mime_type, "text/plain");
    assert_eq!(files[0].size, 13);
    assert!(files[0].url.starts_with(&format!("{}/uploads/", backend.base_url)));
    assert!(uploads.snapshot().files.is_empty());

    let stored = reqwest::get(&files[0].url).await.unwrap().text().await.unwrap();
    assert_eq!(stored, "meeting notes");

    let core = core_for(client);
    let SendOutcome::Sent(confirmed) = core.send("see attached", Some(outcome.attachment_ids())).await
    else {
        panic!("send failed");
    };
    assert_eq!(confirmed.attachments.len(), 1);
    assert_eq!(confirmed.attachments[0].kind, AttachmentKind::File);
    assert_eq!(confirmed.attachments[0].filename.as_deref(), Some("notes.txt"));
}

#[tokio::test]
async fn slow_reply_times_out() {
    let backend = spawn_backend(Duration::from_secs(5), None).await;
    let client = ApiClient::new(&backend.base_url).with_timeout(Duration::from_millis(200));

    let request = chat_widget::types::SendMessageRequest {
        content: "hello".to_string(),
        attachments: None,
    };
    let err = client.send_message(&request).await.unwrap_err();
    assert!(matches!(err, WidgetError::Timeout { after } if after == Duration::from_millis(200)));

    let core = core_for(client);
    assert_eq!(core.send("hello", None).await, SendOutcome::Failed);
    let messages = core.snapshot().messages.to_vec();
    assert_eq!(messages[0].status, Some(MessageStatus::Error));
}

#[tokio::test]
async fn link_preview_comes_from_the_backend() {
    let backend = spawn_backend(Duration::ZERO, None).await;
    let client = ApiClient::new(&backend.base_url);

    let preview = client
        .fetch_link_preview("https://docs.rs/tokio?version=1")
        .await
        .unwrap();
    assert_eq!(preview.url, "https://docs.rs/tokio?version=1");
    assert_eq!(preview.title, "Example Link");
    assert_eq!(preview.domain, "docs.rs");
}

#[tokio::test]
async fn bad_link_is_reported_without_retrying() {
    let backend = spawn_backend(Duration::ZERO, None).await;
    let client = ApiClient::new(&backend.base_url);

    let err = client.fetch_link_preview("not a url").await.unwrap_err();
    assert!(matches!(err, WidgetError::Api { status: 400, .. }));
    assert!(!err.is_transient());
}
