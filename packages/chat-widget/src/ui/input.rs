//! Message composer

use std::path::Path;

use dioxus::prelude::*;
use tracing::warn;

use super::icons::{PaperclipIcon, SendIcon};
use super::FileUploadList;
use crate::config::Labels;
use crate::upload::{LocalFile, UploadBatch};

#[derive(Props, Clone, PartialEq)]
pub struct ChatInputProps {
    pub labels: Labels,
    pub batch: UploadBatch,
    pub file_upload_enabled: bool,
    /// Allow-list for the file picker's `accept` attribute.
    pub allowed_types: Vec<String>,
    /// Called with the trimmed draft. May be empty when files are staged.
    pub on_send: EventHandler<String>,
    pub on_files_selected: EventHandler<Vec<LocalFile>>,
    pub on_remove_file: EventHandler<usize>,
}

/// Textarea with attach and send buttons. Enter sends, Shift+Enter breaks.
#[component]
pub fn ChatInput(props: ChatInputProps) -> Element {
    let mut draft = use_signal(String::new);

    let has_files = !props.batch.files.is_empty();
    let is_uploading = props.batch.is_uploading;
    let on_send = props.on_send;
    let on_files_selected = props.on_files_selected;

    let mut submit = move || {
        let text = draft.read().trim().to_string();
        if (text.is_empty() && !has_files) || is_uploading {
            return;
        }
        on_send.call(text);
        draft.set(String::new());
    };

    let send_disabled = (draft.read().trim().is_empty() && !has_files) || is_uploading;
    let accept = props.allowed_types.join(",");

    rsx! {
        div {
            class: "chat-input-container",
            FileUploadList {
                files: props.batch.files.clone(),
                is_uploading,
                progress: props.batch.progress,
                on_remove: props.on_remove_file,
            }
            form {
                class: "chat-input",
                onsubmit: move |evt: FormEvent| {
                    evt.prevent_default();
                    submit();
                },
                if props.file_upload_enabled {
                    label {
                        class: "chat-input-attach",
                        aria_label: "{props.labels.upload_button}",
                        PaperclipIcon { size: 20 }
                        input {
                            r#type: "file",
                            multiple: true,
                            accept: "{accept}",
                            style: "display: none",
                            disabled: is_uploading,
                            onchange: move |evt: FormEvent| async move {
                                let Some(engine) = evt.files() else {
                                    return;
                                };
                                let mut picked = Vec::new();
                                for path in engine.files() {
                                    let name = Path::new(&path)
                                        .file_name()
                                        .map(|n| n.to_string_lossy().into_owned())
                                        .unwrap_or_else(|| path.clone());
                                    match engine.read_file(&path).await {
                                        Some(bytes) => picked.push(LocalFile::new(name, bytes)),
                                        None => warn!(file = %path, "Could not read selected file"),
                                    }
                                }
                                if !picked.is_empty() {
                                    on_files_selected.call(picked);
                                }
                            },
                        }
                    }
                }
                textarea {
                    class: "chat-input-textarea",
                    placeholder: "{props.labels.placeholder}",
                    rows: "1",
                    value: "{draft}",
                    disabled: is_uploading,
                    oninput: move |evt| draft.set(evt.value()),
                    onkeydown: move |evt: KeyboardEvent| {
                        if evt.key() == Key::Enter && !evt.modifiers().contains(Modifiers::SHIFT) {
                            evt.prevent_default();
                            submit();
                        }
                    },
                }
                button {
                    r#type: "submit",
                    class: "chat-input-send",
                    aria_label: "{props.labels.send_button}",
                    disabled: send_disabled,
                    SendIcon { size: 20 }
                }
            }
        }
    }
}
