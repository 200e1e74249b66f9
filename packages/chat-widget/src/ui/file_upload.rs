//! Staged files above the input

use dioxus::prelude::*;

use crate::format::format_file_size;
use crate::upload::LocalFile;

/// Staged files with remove buttons, and a progress bar while uploading.
#[component]
pub fn FileUploadList(
    files: Vec<LocalFile>,
    is_uploading: bool,
    progress: f64,
    on_remove: EventHandler<usize>,
) -> Element {
    if files.is_empty() {
        return rsx! {};
    }
    let bar_style = format!("width: {}%", progress.round());

    rsx! {
        div {
            class: "chat-file-upload",
            for (index, file) in files.iter().enumerate() {
                div {
                    key: "{index}",
                    class: "chat-file-upload-item",
                    div {
                        class: "chat-file-upload-info",
                        div { class: "chat-file-upload-name", "{file.name}" }
                        div { class: "chat-file-upload-size", "{format_file_size(file.size())}" }
                    }
                    if !is_uploading {
                        button {
                            class: "chat-file-upload-remove",
                            aria_label: "Remove file",
                            onclick: move |_| on_remove.call(index),
                            "×"
                        }
                    }
                }
            }
            if is_uploading {
                div {
                    class: "chat-file-upload-progress",
                    div { class: "chat-file-upload-progress-bar", style: "{bar_style}" }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::render;

    #[component]
    fn Harness(files: Vec<LocalFile>, is_uploading: bool, progress: f64) -> Element {
        rsx! {
            FileUploadList { files, is_uploading, progress, on_remove: move |_| {} }
        }
    }

    fn render_list(files: Vec<LocalFile>, is_uploading: bool, progress: f64) -> String {
        let mut dom = VirtualDom::new_with_props(
            Harness,
            HarnessProps {
                files,
                is_uploading,
                progress,
            },
        );
        render(&mut dom)
    }

    #[test]
    fn staged_files_show_size_and_remove_button() {
        let html = render_list(vec![LocalFile::new("notes.txt", vec![0u8; 1536])], false, 0.0);
        assert!(html.contains("notes.txt"));
        assert!(html.contains("1.5 KB"));
        assert!(html.contains("chat-file-upload-remove"));
        assert!(!html.contains("chat-file-upload-progress"));
    }

    #[test]
    fn uploading_hides_remove_and_shows_progress() {
        let html = render_list(vec![LocalFile::new("a.png", vec![0u8; 10])], true, 42.4);
        assert!(!html.contains("chat-file-upload-remove"));
        assert!(html.contains("width: 42%"));
    }

    #[test]
    fn nothing_renders_without_files() {
        assert!(!render_list(Vec::new(), false, 0.0).contains("chat-file-upload"));
    }
}
