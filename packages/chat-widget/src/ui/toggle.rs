//! Floating open/close button

use dioxus::prelude::*;

use super::icons::{ChatBubbleIcon, CloseIcon};

#[component]
pub fn ChatToggle(is_open: bool, on_click: EventHandler<()>) -> Element {
    let label = if is_open { "Close chat" } else { "Open chat" };

    rsx! {
        button {
            class: "chat-toggle",
            aria_label: label,
            onclick: move |_| on_click.call(()),
            if is_open {
                CloseIcon { size: 24 }
            } else {
                ChatBubbleIcon { size: 24 }
            }
        }
    }
}
