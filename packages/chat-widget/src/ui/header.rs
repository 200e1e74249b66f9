//! Window title bar

use dioxus::prelude::*;

use super::icons::{ChatBubbleIcon, CloseIcon};
use crate::config::Labels;

#[component]
pub fn ChatHeader(labels: Labels, on_close: EventHandler<()>) -> Element {
    rsx! {
        div {
            class: "chat-header",
            div {
                class: "chat-header-content",
                div { class: "chat-header-avatar", ChatBubbleIcon { size: 20 } }
                div {
                    class: "chat-header-info",
                    h3 { class: "chat-header-title", "{labels.title}" }
                    p { class: "chat-header-subtitle", "{labels.subtitle}" }
                }
            }
            button {
                class: "chat-header-close",
                aria_label: "{labels.close_button}",
                onclick: move |_| on_close.call(()),
                CloseIcon { size: 20 }
            }
        }
    }
}
