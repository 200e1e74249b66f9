//! Canned assistant replies.
//!
//! Each reply showcases one kind of content the widget can render.

use crate::store::{Attachment, AttachmentKind, Role, StoredMessage};

pub const GREETING: &str = "Hi! 👋 I'm the demo assistant.\n\nTry typing:\n- **\"code\"** - a code sample\n- **\"table\"** - a table\n- **\"image\"** - a gallery\n- **\"file\"** - an attachment\n- **\"link\"** - a link preview";

const CODE_SAMPLE: &str = "```javascript\nfunction hello() {\n  console.log(\"Hello!\");\n}\n```";

const TABLE_SAMPLE: &str = "| Col 1 | Col 2 |\n|-------|-------|\n| A | B |\n| C | D |";

/// Pick the assistant's answer to `content`. Keywords match case-insensitively
/// anywhere in the text; the first rule that matches wins.
pub fn generate(content: &str) -> StoredMessage {
    let lower = content.to_lowercase();
    let has = |words: &[&str]| words.iter().any(|w| lower.contains(w));

    if has(&["kod", "code"]) {
        return StoredMessage::new(Role::Assistant, CODE_SAMPLE);
    }

    if has(&["tabel", "table"]) {
        return StoredMessage::new(Role::Assistant, TABLE_SAMPLE);
    }

    if has(&["obraz", "image"]) {
        let images = (1..=2)
            .map(|n| Attachment {
                thumbnail_url: Some(format!("https://picsum.photos/400/300?random={}", n)),
                ..Attachment::new(
                    AttachmentKind::Image,
                    format!("https://picsum.photos/800/600?random={}", n),
                )
            })
            .collect();
        return StoredMessage::new(Role::Assistant, "Here are some images:").with_attachments(images);
    }

    if has(&["plik", "file"]) {
        let file = Attachment {
            filename: Some("dokument.pdf".to_string()),
            mime_type: Some("application/pdf".to_string()),
            size: Some(12345),
            ..Attachment::new(AttachmentKind::File, "https://example.com/file.pdf")
        };
        return StoredMessage::new(Role::Assistant, "Here is a file:").with_attachments(vec![file]);
    }

    if has(&["link"]) {
        let link = Attachment {
            title: Some("GitHub".to_string()),
            description: Some("Where the world builds software".to_string()),
            thumbnail_url: Some(
                "https://github.githubassets.com/images/modules/logos_page/GitHub-Mark.png"
                    .to_string(),
            ),
            domain: Some("github.com".to_string()),
            ..Attachment::new(AttachmentKind::Link, "https://github.com")
        };
        return StoredMessage::new(Role::Assistant, "Check out this link:").with_attachments(vec![link]);
    }

    StoredMessage::new(
        Role::Assistant,
        format!(
            "I received: \"{}\"\n\nType \"code\", \"table\", \"image\", \"file\" or \"link\" to see the different message types.",
            content
        ),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_keyword_in_either_language() {
        assert!(generate("show me KOD").content.starts_with("```javascript"));
        assert!(generate("some code please").content.starts_with("```javascript"));
    }

    #[test]
    fn table_reply_is_markdown_table() {
        let reply = generate("tabela");
        assert!(reply.content.contains("| Col 1 | Col 2 |"));
        assert!(reply.attachments.is_empty());
    }

    #[test]
    fn image_reply_carries_two_images() {
        let reply = generate("obrazki");
        assert_eq!(reply.attachments.len(), 2);
        assert!(reply
            .attachments
            .iter()
            .all(|a| a.kind == AttachmentKind::Image && a.thumbnail_url.is_some()));
    }

    #[test]
    fn file_and_link_replies() {
        let file = generate("send a file");
        assert_eq!(file.attachments[0].kind, AttachmentKind::File);
        assert_eq!(file.attachments[0].size, Some(12345));

        let link = generate("link");
        assert_eq!(link.attachments[0].kind, AttachmentKind::Link);
        assert_eq!(link.attachments[0].domain.as_deref(), Some("github.com"));
    }

    #[test]
    fn first_matching_rule_wins() {
        // "code" beats "file"
        assert!(generate("code file").content.starts_with("```"));
    }

    #[test]
    fn anything_else_is_echoed() {
        let reply = generate("hello there");
        assert_eq!(reply.role, Role::Assistant);
        assert!(reply.content.starts_with("I received: \"hello there\""));
    }
}
