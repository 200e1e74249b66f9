//! `ApiClient` behaviour against purpose-built axum routes.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::get;
use axum::{Json, Router};
use chat_widget::{ApiClient, AuthConfig, ChatApi, RetryPolicy, WidgetError};
use serde_json::{json, Value};
use tokio::net::TcpListener;

async fn serve(router: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base_url = format!("http://{}", listener.local_addr().unwrap());
    tokio::spawn(async move { axum::serve(listener, router).await });
    base_url
}

fn empty_page() -> Value {
    json!({ "messages": [], "hasMore": false, "nextCursor": null })
}

/// GET /messages succeeds only when `header` carries `expected`.
fn guarded_messages(header: &'static str, expected: &'static str) -> Router {
    Router::new().route(
        "/messages",
        get(move |headers: HeaderMap| async move {
            match headers.get(header).and_then(|v| v.to_str().ok()) {
                Some(value) if value == expected => (StatusCode::OK, Json(empty_page())),
                _ => (
                    StatusCode::UNAUTHORIZED,
                    Json(json!({ "error": "missing token" })),
                ),
            }
        }),
    )
}

/// GET /messages answers `failures` times with `status`, then succeeds.
fn flaky_messages(status: StatusCode, failures: usize, hits: Arc<AtomicUsize>) -> Router {
    Router::new()
        .route(
            "/messages",
            get(
                move |State(hits): State<Arc<AtomicUsize>>| async move {
                    if hits.fetch_add(1, Ordering::SeqCst) < failures {
                        (status, Json(json!({ "error": "try again" })))
                    } else {
                        (StatusCode::OK, Json(empty_page()))
                    }
                },
            ),
        )
        .with_state(hits)
}

fn fast_retries() -> RetryPolicy {
    RetryPolicy {
        max_retries: 2,
        base_delay: Duration::from_millis(10),
    }
}

#[tokio::test]
async fn static_token_is_sent_as_bearer() {
    let base_url = serve(guarded_messages("authorization", "Bearer s3cret")).await;

    let anonymous = ApiClient::new(&base_url).with_retry(RetryPolicy::none());
    let err = anonymous.list_messages(None).await.unwrap_err();
    assert!(matches!(err, WidgetError::Api { status: 401, .. }));

    let client = ApiClient::new(&base_url).with_auth(AuthConfig::bearer("s3cret"));
    let page = client.list_messages(None).await.unwrap();
    assert!(page.messages.is_empty());
    assert!(!page.has_more);
}

#[tokio::test]
async fn provider_token_uses_custom_header() {
    let base_url = serve(guarded_messages("x-chat-token", "Bearer fresh")).await;
    let calls = Arc::new(AtomicUsize::new(0));

    let counter = Arc::clone(&calls);
    let auth = AuthConfig::default()
        .with_provider(move || {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok::<_, WidgetError>("fresh".to_string())
            }
        })
        .with_header_name("X-Chat-Token");
    let client = ApiClient::new(&base_url).with_auth(auth);

    client.list_messages(None).await.unwrap();
    client.list_messages(None).await.unwrap();
    // Resolved again for every request.
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn failing_provider_surfaces_as_auth_error() {
    let base_url = serve(guarded_messages("authorization", "Bearer never")).await;
    let auth = AuthConfig::default()
        .with_provider(|| async { Err::<String, _>(WidgetError::Auth("session expired".to_string())) });
    let client = ApiClient::new(&base_url).with_auth(auth);

    let err = client.list_messages(None).await.unwrap_err();
    assert!(matches!(err, WidgetError::Auth(ref reason) if reason == "session expired"));
}

#[tokio::test]
async fn transient_status_is_retried() {
    let hits = Arc::new(AtomicUsize::new(0));
    let base_url = serve(flaky_messages(
        StatusCode::SERVICE_UNAVAILABLE,
        2,
        Arc::clone(&hits),
    ))
    .await;
    let client = ApiClient::new(&base_url).with_retry(fast_retries());

    let page = client.list_messages(None).await.unwrap();
    assert!(page.messages.is_empty());
    assert_eq!(hits.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn retries_are_bounded() {
    let hits = Arc::new(AtomicUsize::new(0));
    let base_url = serve(flaky_messages(
        StatusCode::BAD_GATEWAY,
        10,
        Arc::clone(&hits),
    ))
    .await;
    let client = ApiClient::new(&base_url).with_retry(fast_retries());

    let err = client.list_messages(None).await.unwrap_err();
    assert!(matches!(err, WidgetError::Api { status: 502, .. }));
    assert_eq!(hits.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn client_errors_are_not_retried() {
    let hits = Arc::new(AtomicUsize::new(0));
    let base_url = serve(flaky_messages(StatusCode::NOT_FOUND, 10, Arc::clone(&hits))).await;
    let client = ApiClient::new(&base_url).with_retry(fast_retries());

    let err = client.list_messages(None).await.unwrap_err();
    assert!(matches!(err, WidgetError::Api { status: 404, .. }));
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn malformed_body_is_a_parse_error() {
    let router = Router::new().route("/messages", get(|| async { "not json" }));
    let base_url = serve(router).await;
    let client = ApiClient::new(&base_url);

    let err = client.list_messages(None).await.unwrap_err();
    assert!(matches!(err, WidgetError::Parse(_)));
}
