use dioxus::prelude::*;

/// Three bouncing dots shown while the assistant is replying.
#[component]
pub fn TypingIndicator() -> Element {
    rsx! {
        div {
            class: "chat-typing-indicator",
            span { class: "chat-typing-dot" }
            span { class: "chat-typing-dot" }
            span { class: "chat-typing-dot" }
        }
    }
}
