//! Scrollable message list

use dioxus::prelude::*;

use super::{MessageBubble, TypingIndicator};
use crate::chat::MessageLog;
use crate::config::{Features, Labels};

#[derive(Props, Clone, PartialEq)]
pub struct ChatMessagesProps {
    pub messages: MessageLog,
    pub is_typing: bool,
    pub is_loading: bool,
    pub has_more: bool,
    pub features: Features,
    pub labels: Labels,
    pub on_load_more: EventHandler<()>,
    pub on_retry: EventHandler<String>,
}

/// The conversation, oldest first.
///
/// Older pages are requested with an explicit button at the top. The list
/// uses `overflow-anchor` so prepended messages keep the visible ones in place.
#[component]
pub fn ChatMessages(props: ChatMessagesProps) -> Element {
    if props.messages.is_empty() && !props.is_loading {
        return rsx! {
            div {
                class: "chat-messages-empty",
                div { class: "chat-messages-empty-icon", "💬" }
                h3 { class: "chat-messages-empty-title", "{props.labels.empty_state_title}" }
                p { class: "chat-messages-empty-text", "{props.labels.empty_state_text}" }
            }
        };
    }

    let on_load_more = props.on_load_more;
    let on_retry = props.on_retry;
    let show_load_more = props.has_more && !props.is_loading && !props.messages.is_empty();

    rsx! {
        div {
            class: "chat-messages",
            style: "overflow-anchor: auto",
            if props.is_loading {
                div { class: "chat-messages-loading", "{props.labels.loading_text}" }
            }
            if show_load_more {
                button {
                    class: "chat-messages-load-more",
                    onclick: move |_| on_load_more.call(()),
                    "{props.labels.load_more}"
                }
            }
            for message in props.messages.iter() {
                MessageBubble {
                    key: "{message.id}",
                    message: message.clone(),
                    features: props.features.clone(),
                    retry_label: props.labels.retry_text.clone(),
                    on_retry,
                }
            }
            if props.is_typing && props.features.typing_indicator {
                div {
                    class: "chat-message chat-message-assistant",
                    div {
                        class: "chat-message-content",
                        TypingIndicator {}
                        span { class: "chat-typing-text", "{props.labels.typing_text}" }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::message_at;
    use crate::types::MessageRole;
    use crate::ui::render;

    #[component]
    fn Harness(
        messages: MessageLog,
        is_typing: bool,
        is_loading: bool,
        has_more: bool,
        labels: Labels,
    ) -> Element {
        rsx! {
            ChatMessages {
                messages,
                is_typing,
                is_loading,
                has_more,
                features: Features::default(),
                labels,
                on_load_more: move |_| {},
                on_retry: move |_| {},
            }
        }
    }

    fn render_list(messages: MessageLog, is_typing: bool, is_loading: bool, has_more: bool) -> String {
        render_with_labels(messages, is_typing, is_loading, has_more, Labels::default())
    }

    fn render_with_labels(
        messages: MessageLog,
        is_typing: bool,
        is_loading: bool,
        has_more: bool,
        labels: Labels,
    ) -> String {
        let mut dom = VirtualDom::new_with_props(
            Harness,
            HarnessProps {
                messages,
                is_typing,
                is_loading,
                has_more,
                labels,
            },
        );
        render(&mut dom)
    }

    fn conversation() -> MessageLog {
        [
            message_at("m1", MessageRole::User, "first question", 1),
            message_at("m2", MessageRole::Assistant, "first answer", 2),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn empty_conversation_shows_empty_state() {
        let html = render_list(MessageLog::default(), false, false, true);
        assert!(html.contains("No messages yet"));
        assert!(html.contains("Start a conversation!"));
    }

    #[test]
    fn messages_render_in_order() {
        let html = render_list(conversation(), false, false, false);
        let first = html.find("first question").unwrap();
        let second = html.find("first answer").unwrap();
        assert!(first < second);
        assert!(!html.contains("chat-messages-load-more"));
    }

    #[test]
    fn load_more_button_only_when_history_remains() {
        assert!(render_list(conversation(), false, false, true).contains("Load older messages"));
        let loading = render_list(conversation(), false, true, true);
        assert!(loading.contains("chat-messages-loading"));
        assert!(!loading.contains("Load older messages"));
    }

    #[test]
    fn paging_texts_come_from_labels() {
        let labels = Labels {
            load_more: "Wczytaj starsze".to_string(),
            loading_text: "Ładowanie...".to_string(),
            ..Labels::default()
        };
        let idle = render_with_labels(conversation(), false, false, true, labels.clone());
        assert!(idle.contains("Wczytaj starsze"));
        assert!(!idle.contains("Load older messages"));

        let loading = render_with_labels(conversation(), false, true, true, labels);
        assert!(loading.contains("Ładowanie..."));
        assert!(!loading.contains("Loading..."));
    }

    #[test]
    fn typing_row_follows_the_messages() {
        let html = render_list(conversation(), true, false, false);
        assert!(html.contains("chat-typing-indicator"));
        assert!(html.find("first answer").unwrap() < html.find("chat-typing-indicator").unwrap());
    }
}
