//! A single message bubble and its attachments

use chrono::Local;
use dioxus::prelude::*;

use super::icons::{DownloadIcon, ExternalLinkIcon};
use crate::config::Features;
use crate::format::{extract_domain, file_icon, format_file_size, format_time};
use crate::markdown::{render_markdown, safe_url};
use crate::types::{Attachment, AttachmentKind, Message};

#[derive(Props, Clone, PartialEq)]
pub struct MessageBubbleProps {
    pub message: Message,
    pub features: Features,
    pub retry_label: String,
    /// Called with the message id when a failed message is retried.
    pub on_retry: EventHandler<String>,
}

#[component]
pub fn MessageBubble(props: MessageBubbleProps) -> Element {
    let message = &props.message;
    let features = &props.features;

    let mut class = format!("chat-message chat-message-{}", message.role.as_str());
    if message.is_failed() {
        class.push_str(" chat-message-error");
    } else if message.is_pending() {
        class.push_str(" chat-message-sending");
    }

    let images: Vec<Attachment> = message.attachments_of(AttachmentKind::Image).cloned().collect();
    let files: Vec<Attachment> = message.attachments_of(AttachmentKind::File).cloned().collect();
    let links: Vec<Attachment> = if features.link_previews {
        message.attachments_of(AttachmentKind::Link).cloned().collect()
    } else {
        Vec::new()
    };
    let time = format_time(&message.created_at.with_timezone(&Local));
    let failed_id = message.is_failed().then(|| message.id.clone());
    let on_retry = props.on_retry;

    rsx! {
        div {
            class: "{class}",
            div {
                class: "chat-message-content",
                if !message.content.is_empty() {
                    MessageText {
                        content: message.content.clone(),
                        markdown: features.markdown,
                        highlight: features.code_highlight,
                    }
                }
                if !images.is_empty() {
                    MessageImages { images, gallery: features.image_gallery }
                }
                for file in files {
                    MessageFile { key: "{file.id}", file: file.clone() }
                }
                for link in links {
                    MessageLink { key: "{link.id}", link: link.clone() }
                }
                div { class: "chat-message-time", "{time}" }
                if let Some(id) = failed_id {
                    button {
                        class: "chat-message-retry",
                        onclick: move |_| on_retry.call(id.clone()),
                        "{props.retry_label}"
                    }
                }
            }
        }
    }
}

#[component]
fn MessageText(content: String, markdown: bool, highlight: bool) -> Element {
    if !markdown {
        return rsx! {
            div { class: "chat-message-text", "{content}" }
        };
    }
    let html = render_markdown(&content, highlight);
    rsx! {
        div { class: "chat-message-text", dangerous_inner_html: "{html}" }
    }
}

#[component]
fn MessageImages(images: Vec<Attachment>, gallery: bool) -> Element {
    let layout = if images.len() > 1 { "grid" } else { "single" };
    let images: Vec<(Attachment, String, String)> = images
        .into_iter()
        .map(|image| {
            let href = safe_url(&image.url);
            let src = safe_url(image.thumbnail_url.as_deref().unwrap_or(&image.url));
            (image, href, src)
        })
        .collect();

    rsx! {
        div {
            class: "chat-message-images chat-message-images-{layout}",
            for (image, href, src) in images {
                if gallery {
                    a {
                        class: "chat-image-item",
                        href: "{href}",
                        target: "_blank",
                        "data-gallery": "message-gallery",
                        img {
                            src: "{src}",
                            alt: image.filename.clone().unwrap_or_else(|| "Image".to_string()),
                            loading: "lazy",
                        }
                    }
                } else {
                    img {
                        class: "chat-image-item",
                        src: "{src}",
                        alt: image.filename.clone().unwrap_or_else(|| "Image".to_string()),
                        loading: "lazy",
                    }
                }
            }
        }
    }
}

#[component]
fn MessageFile(file: Attachment) -> Element {
    let name = file.filename.clone().unwrap_or_else(|| "File".to_string());
    let icon = file_icon(file.mime_type.as_deref().unwrap_or_default());
    let href = safe_url(&file.url);

    rsx! {
        a {
            class: "chat-message-file",
            href: "{href}",
            target: "_blank",
            rel: "noopener noreferrer",
            download: "{name}",
            div { class: "chat-file-icon", "{icon}" }
            div {
                class: "chat-file-info",
                div { class: "chat-file-name", "{name}" }
                if let Some(size) = file.size {
                    div { class: "chat-file-size", "{format_file_size(size)}" }
                }
            }
            div { class: "chat-file-download", DownloadIcon { size: 16 } }
        }
    }
}

#[component]
fn MessageLink(link: Attachment) -> Element {
    let title = link.title.clone().unwrap_or_else(|| link.url.clone());
    let domain = link
        .domain
        .clone()
        .unwrap_or_else(|| extract_domain(&link.url));
    let href = safe_url(&link.url);
    let thumbnail = link.thumbnail_url.as_deref().map(safe_url);

    rsx! {
        a {
            class: "chat-message-link",
            href: "{href}",
            target: "_blank",
            rel: "noopener noreferrer",
            if let Some(thumbnail) = thumbnail {
                div {
                    class: "chat-link-image",
                    img { src: thumbnail, alt: link.title.clone().unwrap_or_default(), loading: "lazy" }
                }
            }
            div {
                class: "chat-link-content",
                div { class: "chat-link-title", "{title}" }
                if let Some(description) = link.description.clone() {
                    div { class: "chat-link-description", "{description}" }
                }
                div {
                    class: "chat-link-domain",
                    ExternalLinkIcon { size: 12 }
                    span { "{domain}" }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::message_at;
    use crate::types::{MessageRole, MessageStatus};
    use crate::ui::render;

    #[component]
    fn Harness(message: Message, features: Features) -> Element {
        rsx! {
            MessageBubble { message, features, retry_label: "Retry", on_retry: move |_| {} }
        }
    }

    fn render_bubble(message: Message, features: Features) -> String {
        let mut dom = VirtualDom::new_with_props(Harness, HarnessProps { message, features });
        render(&mut dom)
    }

    #[test]
    fn markdown_content_is_rendered() {
        let message = message_at("a1", MessageRole::Assistant, "**bold** and `code`", 0);
        let html = render_bubble(message, Features::default());
        assert!(html.contains("chat-message chat-message-assistant"));
        assert!(html.contains("<strong>bold</strong>"));
        assert!(html.contains("<code>code</code>"));
    }

    #[test]
    fn plain_text_when_markdown_is_off() {
        let message = message_at("a1", MessageRole::Assistant, "**bold**", 0);
        let features = Features {
            markdown: false,
            ..Features::default()
        };
        let html = render_bubble(message, features);
        assert!(html.contains("**bold**"));
        assert!(!html.contains("<strong>"));
    }

    #[test]
    fn failed_message_offers_retry() {
        let message = message_at("temp-1", MessageRole::User, "hello", 0).with_status(MessageStatus::Error);
        let html = render_bubble(message, Features::default());
        assert!(html.contains("chat-message-error"));
        assert!(html.contains("chat-message-retry"));
        assert!(html.contains("Retry"));
    }

    #[test]
    fn attachments_render_by_kind() {
        let message = message_at("a1", MessageRole::Assistant, "", 0).with_attachments(vec![
            Attachment::image("i1", "https://img.test/1.png"),
            Attachment::image("i2", "https://img.test/2.png"),
            Attachment::file("f1", "https://files.test/doc.pdf", "doc.pdf", "application/pdf", 2048),
            Attachment::link("l1", "https://www.rust-lang.org/learn"),
        ]);
        let html = render_bubble(message.clone(), Features::default());
        assert!(html.contains("chat-message-images-grid"));
        assert!(html.contains("doc.pdf"));
        assert!(html.contains("2 KB"));
        assert!(html.contains("rust-lang.org"));
        assert!(!html.contains("chat-message-text"));

        let no_links = Features {
            link_previews: false,
            ..Features::default()
        };
        assert!(!render_bubble(message, no_links).contains("chat-message-link"));
    }

    #[test]
    fn fenced_code_follows_the_highlight_flag() {
        let message = message_at("a1", MessageRole::Assistant, "```rust\nfn main() {}\n```", 0);
        let highlighted = render_bubble(message.clone(), Features::default());
        let plain = render_bubble(
            message,
            Features {
                code_highlight: false,
                ..Features::default()
            },
        );
        assert_ne!(highlighted, plain);
        assert!(highlighted.contains("hl-"));
        assert!(!plain.contains("hl-"));
        assert!(plain.contains("fn main() {}"));
    }

    #[test]
    fn attachment_urls_with_unsafe_schemes_are_neutralised() {
        let mut image = Attachment::image("i1", "javascript:alert(3)");
        image.thumbnail_url = Some("javascript:alert(4)".to_string());
        let message = message_at("a1", MessageRole::Assistant, "", 0).with_attachments(vec![
            image,
            Attachment::file("f1", "javascript:alert(2)", "doc.pdf", "application/pdf", 10),
            Attachment::link("l1", "javascript:alert(1)"),
        ]);
        let html = render_bubble(message, Features::default());
        assert!(html.contains(r##"href="#""##));
        assert!(html.contains(r##"src="#""##));
        assert!(!html.contains(r#"href="javascript:"#));
        assert!(!html.contains(r#"src="javascript:"#));
    }
}
