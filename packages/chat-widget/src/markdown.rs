//! Markdown to HTML for message bodies.
//!
//! Raw HTML in messages is escaped, never passed through. Links open in a new
//! tab, and URLs with schemes outside a small allow-list are replaced with `#`.
//! Fenced code renders as `<pre class="chat-code-block" data-lang="..">` for the
//! stylesheet to pick up. With highlighting on, code in a known language is
//! split into `hl-` prefixed classed spans by syntect.

use lazy_static::lazy_static;
use pulldown_cmark::escape::escape_html;
use pulldown_cmark::{html, CodeBlockKind, CowStr, Event, Options, Parser, Tag};
use syntect::html::{ClassStyle, ClassedHTMLGenerator};
use syntect::parsing::SyntaxSet;
use syntect::util::LinesWithEndings;
use url::Url;

const SAFE_SCHEMES: [&str; 4] = ["http", "https", "mailto", "tel"];

/// Prefix for the classes emitted on highlighted tokens.
pub const HIGHLIGHT_CLASS_PREFIX: &str = "hl-";

lazy_static! {
    static ref SYNTAXES: SyntaxSet = SyntaxSet::load_defaults_newlines();
}

fn options() -> Options {
    Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH | Options::ENABLE_TASKLISTS
}

/// Render message content to sanitized HTML.
///
/// `highlight_code` turns on syntax highlighting for fenced code blocks.
pub fn render_markdown(content: &str, highlight_code: bool) -> String {
    let mut events = Vec::new();
    // Language and collected text of the code block being read.
    let mut code_block: Option<(String, String)> = None;
    let mut link_depth = 0usize;

    for event in Parser::new_ext(content, options()) {
        match event {
            Event::Start(Tag::CodeBlock(kind)) => {
                code_block = Some((code_lang(&kind).to_string(), String::new()));
            }
            Event::End(Tag::CodeBlock(_)) => {
                if let Some((lang, code)) = code_block.take() {
                    events.push(Event::Html(render_code_block(&lang, &code, highlight_code).into()));
                }
            }
            Event::Text(text) if code_block.is_some() => {
                if let Some((_, code)) = code_block.as_mut() {
                    code.push_str(&text);
                }
            }
            Event::Start(Tag::Link(_, dest, title)) => {
                link_depth += 1;
                events.push(Event::Html(link_open(&dest, &title).into()));
            }
            Event::End(Tag::Link(..)) => {
                link_depth = link_depth.saturating_sub(1);
                events.push(Event::Html("</a>".into()));
            }
            Event::Start(Tag::Image(kind, dest, title)) => {
                events.push(Event::Start(Tag::Image(kind, safe_url(&dest).into(), title)));
            }
            Event::Html(raw) => events.push(Event::Text(raw)),
            Event::SoftBreak => events.push(Event::HardBreak),
            Event::Text(text) if link_depth == 0 => linkify(text, &mut events),
            other => events.push(other),
        }
    }

    let mut out = String::with_capacity(content.len() * 3 / 2);
    html::push_html(&mut out, events.into_iter());
    out
}

/// `url` when its scheme is allowed (or it is relative), `#` otherwise.
pub fn safe_url(url: &str) -> String {
    let url = url.trim();
    match Url::parse(url) {
        Ok(parsed) if !SAFE_SCHEMES.contains(&parsed.scheme()) => "#".to_string(),
        _ => url.to_string(),
    }
}

fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    // Writing into a String cannot fail.
    let _ = escape_html(&mut out, value);
    out
}

fn code_lang<'a>(kind: &'a CodeBlockKind) -> &'a str {
    match kind {
        CodeBlockKind::Fenced(info) => info.split_whitespace().next().unwrap_or(""),
        CodeBlockKind::Indented => "",
    }
}

fn render_code_block(lang: &str, code: &str, highlight_code: bool) -> String {
    let body = highlight_code
        .then(|| highlight(lang, code))
        .flatten()
        .unwrap_or_else(|| escape(code));
    format!(
        "<pre class=\"chat-code-block\" data-lang=\"{}\"><code>{}</code></pre>\n",
        escape(lang),
        body
    )
}

/// Classed HTML for `code`, or `None` when `lang` is not a known syntax.
fn highlight(lang: &str, code: &str) -> Option<String> {
    if lang.is_empty() {
        return None;
    }
    let syntax = SYNTAXES.find_syntax_by_token(lang)?;
    let mut generator = ClassedHTMLGenerator::new_with_class_style(
        syntax,
        &SYNTAXES,
        ClassStyle::SpacedPrefixed {
            prefix: HIGHLIGHT_CLASS_PREFIX,
        },
    );
    for line in LinesWithEndings::from(code) {
        generator
            .parse_html_for_line_which_includes_newline(line)
            .ok()?;
    }
    Some(generator.finalize())
}

fn link_open(dest: &str, title: &str) -> String {
    let title = if title.is_empty() {
        String::new()
    } else {
        format!(r#" title="{}""#, escape(title))
    };
    format!(
        r#"<a href="{}" target="_blank" rel="noopener noreferrer"{title}>"#,
        escape(&safe_url(dest))
    )
}

/// Turn bare http(s) URLs in plain text into links.
fn linkify<'a>(text: CowStr<'a>, events: &mut Vec<Event<'a>>) {
    if !text.contains("http://") && !text.contains("https://") {
        events.push(Event::Text(text));
        return;
    }

    let source = text.into_string();
    let mut last = 0;
    for (start, url) in find_urls(&source) {
        if start > last {
            events.push(Event::Text(source[last..start].to_string().into()));
        }
        let anchor = format!("{}{}</a>", link_open(url, ""), escape(url));
        events.push(Event::Html(anchor.into()));
        last = start + url.len();
    }
    if last < source.len() {
        events.push(Event::Text(source[last..].to_string().into()));
    }
}

fn find_urls(text: &str) -> Vec<(usize, &str)> {
    let mut found = Vec::new();
    let mut offset = 0;
    for word in text.split_inclusive(char::is_whitespace) {
        let body = word.trim_start_matches(|c: char| matches!(c, '(' | '<' | '"' | '\''));
        let lead = word.len() - body.len();
        let candidate = body
            .trim_end()
            .trim_end_matches(|c: char| matches!(c, '.' | ',' | ')' | '!' | '?' | ';' | ':' | '"' | '\'' | '>'));
        if (candidate.starts_with("http://") || candidate.starts_with("https://"))
            && Url::parse(candidate).is_ok()
        {
            found.push((offset + lead, candidate));
        }
        offset += word.len();
    }
    found
}
