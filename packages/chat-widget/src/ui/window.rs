//! The open chat panel

use dioxus::prelude::*;

use super::{ChatHeader, ChatInput, ChatMessages};
use crate::chat::ChatState;
use crate::config::{Features, Labels, Position};
use crate::upload::{LocalFile, UploadBatch};

#[derive(Props, Clone, PartialEq)]
pub struct ChatWindowProps {
    pub state: ChatState,
    pub batch: UploadBatch,
    pub labels: Labels,
    pub features: Features,
    pub position: Position,
    pub allowed_types: Vec<String>,
    pub on_close: EventHandler<()>,
    pub on_send: EventHandler<String>,
    pub on_load_more: EventHandler<()>,
    pub on_retry: EventHandler<String>,
    pub on_files_selected: EventHandler<Vec<LocalFile>>,
    pub on_remove_file: EventHandler<usize>,
    pub on_dismiss_error: EventHandler<()>,
}

#[component]
pub fn ChatWindow(props: ChatWindowProps) -> Element {
    if !props.state.is_open {
        return rsx! {};
    }

    let error = props.state.error.clone().or_else(|| props.batch.error.clone());
    let on_dismiss_error = props.on_dismiss_error;

    rsx! {
        div {
            class: "chat-window chat-window-{props.position.as_str()}",
            ChatHeader { labels: props.labels.clone(), on_close: props.on_close }
            if let Some(error) = error {
                div {
                    class: "chat-error",
                    role: "alert",
                    span { "{error}" }
                    button {
                        class: "chat-error-dismiss",
                        aria_label: "Dismiss",
                        onclick: move |_| on_dismiss_error.call(()),
                        "×"
                    }
                }
            }
            ChatMessages {
                messages: props.state.messages.clone(),
                is_typing: props.state.is_typing,
                is_loading: props.state.is_loading,
                has_more: props.state.has_more,
                features: props.features.clone(),
                labels: props.labels.clone(),
                on_load_more: props.on_load_more,
                on_retry: props.on_retry,
            }
            ChatInput {
                labels: props.labels.clone(),
                batch: props.batch.clone(),
                file_upload_enabled: props.features.file_upload,
                allowed_types: props.allowed_types.clone(),
                on_send: props.on_send,
                on_files_selected: props.on_files_selected,
                on_remove_file: props.on_remove_file,
            }
        }
    }
}
