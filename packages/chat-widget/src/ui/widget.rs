//! Root component and embedding handle

use std::sync::Arc;

use dioxus::prelude::*;
use tracing::{debug, warn};

use super::{ChatToggle, ChatWindow};
use crate::api::{ApiClient, ChatApi, UploadApi};
use crate::chat::{ChatCore, SendOutcome};
use crate::config::{ChatWidgetConfig, ResolvedConfig};
use crate::theme::ThemeStyle;
use crate::upload::{LocalFile, UploadCoordinator, UploadOutcome};

struct HandleInner {
    config: ResolvedConfig,
    chat: ChatCore,
    uploads: UploadCoordinator,
}

/// One mounted widget: its configuration, conversation and upload batch.
///
/// Every mount owns its own API client and state. Clones share the mount.
#[derive(Clone)]
pub struct WidgetHandle {
    inner: Arc<HandleInner>,
}

impl PartialEq for WidgetHandle {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl WidgetHandle {
    /// Resolve `config` and connect to its `api_url`.
    pub fn mount(config: ChatWidgetConfig) -> Self {
        let config = config.resolve();
        let client = Arc::new(ApiClient::from_config(&config));
        Self::with_backend(config, client.clone(), client)
    }

    /// Mount against explicit backend implementations.
    pub fn with_backend(
        config: ResolvedConfig,
        chat_api: Arc<dyn ChatApi>,
        upload_api: Arc<dyn UploadApi>,
    ) -> Self {
        let chat = ChatCore::from_config(chat_api, &config);
        let uploads = UploadCoordinator::new(
            upload_api,
            config.upload.clone(),
            Arc::clone(&config.events),
        );
        debug!(api_url = %config.api_url, position = config.position.as_str(), "Widget mounted");
        Self {
            inner: Arc::new(HandleInner {
                config,
                chat,
                uploads,
            }),
        }
    }

    pub fn config(&self) -> &ResolvedConfig {
        &self.inner.config
    }

    pub fn chat(&self) -> &ChatCore {
        &self.inner.chat
    }

    pub fn uploads(&self) -> &UploadCoordinator {
        &self.inner.uploads
    }

    /// Send the composer contents.
    ///
    /// With files staged, the batch is uploaded first and the text goes out
    /// with the returned attachment ids. Returns `None` when nothing was sent:
    /// an empty draft, or an upload that failed or was cancelled.
    pub async fn submit(&self, text: &str) -> Option<SendOutcome> {
        let text = text.trim();
        if self.uploads().snapshot().files.is_empty() {
            if text.is_empty() {
                return None;
            }
            return Some(self.chat().send(text, None).await);
        }

        match self.uploads().upload().await {
            Ok(UploadOutcome::Completed(files)) => {
                let ids = files.into_iter().map(|f| f.id).collect();
                Some(self.chat().send(text, Some(ids)).await)
            }
            Ok(UploadOutcome::Empty) if !text.is_empty() => Some(self.chat().send(text, None).await),
            Ok(UploadOutcome::Empty) => None,
            Ok(UploadOutcome::Failed { .. }) | Ok(UploadOutcome::Cancelled) => None,
            Err(e) => {
                warn!(error = %e, "Submit ignored");
                None
            }
        }
    }

    /// Stage picked files; rejections are reported through `on_error`.
    pub fn add_files(&self, files: Vec<LocalFile>) {
        if let Err(e) = self.uploads().add_files(files) {
            warn!(error = %e, "Files not staged");
        }
    }

    pub fn remove_file(&self, index: usize) {
        if let Err(e) = self.uploads().remove_file(index) {
            warn!(error = %e, index, "File not removed");
        }
    }

    /// Clear both the conversation and the upload error banners.
    pub fn dismiss_errors(&self) {
        self.chat().clear_error();
        self.uploads().clear_error();
    }

    pub fn theme_style(&self, system_prefers_dark: bool) -> ThemeStyle {
        ThemeStyle::resolve(&self.config().theme, system_prefers_dark)
    }

    /// Inline style placing the widget in its corner.
    pub fn position_style(&self) -> String {
        let config = self.config();
        format!(
            "{}: {}px; bottom: {}px;",
            config.position.as_str(),
            config.offset_x,
            config.offset_y
        )
    }
}

#[derive(Props, Clone, PartialEq)]
pub struct ChatWidgetProps {
    pub handle: WidgetHandle,
    /// Result of the host's `prefers-color-scheme: dark` query.
    #[props(default)]
    pub system_prefers_dark: bool,
}

/// The embeddable widget.
///
/// Subscribes to the chat core and the upload coordinator, renders the window
/// and toggle, and loads history the first time the window opens.
#[component]
pub fn ChatWidget(props: ChatWidgetProps) -> Element {
    let handle = props.handle.clone();
    let mut chat = use_signal(|| handle.chat().snapshot());
    let mut batch = use_signal(|| handle.uploads().snapshot());

    use_future({
        let handle = handle.clone();
        move || {
            let mut rx = handle.chat().subscribe();
            async move {
                while rx.changed().await.is_ok() {
                    let next = rx.borrow_and_update().clone();
                    chat.set(next);
                }
            }
        }
    });

    use_future({
        let handle = handle.clone();
        move || {
            let mut rx = handle.uploads().subscribe();
            async move {
                while rx.changed().await.is_ok() {
                    let next = rx.borrow_and_update().clone();
                    batch.set(next);
                }
            }
        }
    });

    let is_open = use_memo(move || chat.read().is_open);
    use_effect({
        let handle = handle.clone();
        move || {
            if !is_open() {
                return;
            }
            let needs_history = {
                let state = chat.peek();
                state.messages.is_empty() && !state.is_loading && state.has_more
            };
            if needs_history {
                let handle = handle.clone();
                spawn(async move {
                    handle.chat().load_messages().await;
                });
            }
        }
    });

    let config = handle.config();
    let theme = handle.theme_style(props.system_prefers_dark);
    let style = format!("{} {}", handle.position_style(), theme.to_inline_style());
    let state = chat.read().clone();

    let on_toggle = {
        let handle = handle.clone();
        move |_: ()| handle.chat().toggle()
    };
    let on_close = {
        let handle = handle.clone();
        move |_: ()| handle.chat().close()
    };
    let on_send = {
        let handle = handle.clone();
        move |text: String| {
            let handle = handle.clone();
            spawn(async move {
                handle.submit(&text).await;
            });
        }
    };
    let on_load_more = {
        let handle = handle.clone();
        move |_: ()| {
            let handle = handle.clone();
            spawn(async move {
                handle.chat().load_messages().await;
            });
        }
    };
    let on_retry = {
        let handle = handle.clone();
        move |id: String| {
            let handle = handle.clone();
            spawn(async move {
                handle.chat().retry(&id).await;
            });
        }
    };
    let on_files_selected = {
        let handle = handle.clone();
        move |files: Vec<LocalFile>| handle.add_files(files)
    };
    let on_remove_file = {
        let handle = handle.clone();
        move |index: usize| handle.remove_file(index)
    };
    let on_dismiss_error = {
        let handle = handle.clone();
        move |_: ()| handle.dismiss_errors()
    };

    rsx! {
        div {
            id: "chat-widget-root",
            class: "chat-widget chat-widget-{config.position.as_str()}",
            "data-theme": theme.data_theme,
            style: "{style}",
            ChatWindow {
                state: state.clone(),
                batch: batch.read().clone(),
                labels: config.labels.clone(),
                features: config.features.clone(),
                position: config.position,
                allowed_types: config.upload.allowed_types.clone(),
                on_close,
                on_send,
                on_load_more,
                on_retry,
                on_files_selected,
                on_remove_file,
                on_dismiss_error,
            }
            ChatToggle { is_open: state.is_open, on_click: on_toggle }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ThemeConfig, ThemeMode};
    use crate::testing::{message_at, MockCall, MockChatApi, RecordingEvents};
    use crate::types::MessageRole;
    use crate::ui::render;

    fn handle_with(api: Arc<MockChatApi>, config: ChatWidgetConfig) -> WidgetHandle {
        WidgetHandle::with_backend(config.resolve(), api.clone(), api)
    }

    fn render_widget(handle: WidgetHandle, system_prefers_dark: bool) -> String {
        let mut dom = VirtualDom::new_with_props(
            ChatWidget,
            ChatWidgetProps {
                handle,
                system_prefers_dark,
            },
        );
        render(&mut dom)
    }

    #[test]
    fn closed_widget_shows_only_the_toggle() {
        let handle = handle_with(Arc::new(MockChatApi::new()), ChatWidgetConfig::new("http://api.test"));
        let html = render_widget(handle, false);
        assert!(html.contains("chat-widget chat-widget-right"));
        assert!(html.contains("right: 24px; bottom: 24px;"));
        assert!(html.contains(r#"data-theme="light""#));
        assert!(html.contains("Open chat"));
        assert!(!html.contains("chat-window"));
    }

    #[test]
    fn open_widget_renders_the_conversation() {
        let config = ChatWidgetConfig {
            start_open: Some(true),
            theme: Some(ThemeConfig {
                mode: Some(ThemeMode::Auto),
                ..ThemeConfig::default()
            }),
            ..ChatWidgetConfig::new("http://api.test")
        };
        let handle = handle_with(Arc::new(MockChatApi::new()), config);
        handle
            .chat()
            .add_message(message_at("m1", MessageRole::Assistant, "Hello **there**", 0));

        let html = render_widget(handle, true);
        assert!(html.contains(r#"data-theme="dark""#));
        assert!(html.contains("<strong>there</strong>"));
        assert!(html.contains("Close chat"));
    }

    #[test]
    fn handles_compare_by_mount() {
        let api = Arc::new(MockChatApi::new());
        let a = handle_with(api.clone(), ChatWidgetConfig::new("http://api.test"));
        let b = handle_with(api, ChatWidgetConfig::new("http://api.test"));
        assert!(a == a.clone());
        assert!(a != b);
    }

    #[tokio::test]
    async fn submit_uploads_staged_files_before_sending() {
        let api = Arc::new(MockChatApi::new());
        let handle = handle_with(api.clone(), ChatWidgetConfig::new("http://api.test"));
        handle.add_files(vec![LocalFile::new("photo.png", vec![1u8; 8])]);

        let outcome = handle.submit("  look at this  ").await;

        assert!(matches!(outcome, Some(SendOutcome::Sent(_))));
        assert_eq!(
            api.calls(),
            vec![
                MockCall::Upload {
                    filename: "photo.png".into()
                },
                MockCall::SendMessage {
                    content: "look at this".into(),
                    attachments: Some(vec!["upload-photo.png".into()]),
                },
            ]
        );
        assert!(handle.uploads().snapshot().files.is_empty());
    }

    #[tokio::test]
    async fn failed_upload_sends_nothing() {
        let api = Arc::new(MockChatApi::new().with_upload_error(
            "photo.png",
            crate::error::WidgetError::Api {
                status: 500,
                message: "disk full".into(),
            },
        ));
        let events = RecordingEvents::new();
        let config = ChatWidgetConfig::new("http://api.test").with_events(events.clone());
        let handle = handle_with(api.clone(), config);
        handle.add_files(vec![LocalFile::new("photo.png", vec![1u8; 8])]);

        assert_eq!(handle.submit("hi").await, None);
        assert_eq!(api.calls().len(), 1);
        assert_eq!(events.errors().len(), 1);
    }

    #[tokio::test]
    async fn blank_submit_without_files_is_ignored() {
        let api = Arc::new(MockChatApi::new());
        let handle = handle_with(api.clone(), ChatWidgetConfig::new("http://api.test"));
        assert_eq!(handle.submit("   ").await, None);
        assert!(api.calls().is_empty());
    }
}
