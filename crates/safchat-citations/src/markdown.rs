//! Minimal Markdown rendering for assistant output.
//!
//! Model output is untrusted: every segment is HTML-escaped before any
//! formatting rule runs, so the only tags in the result are the ones added
//! here.

use once_cell::sync::Lazy;
use regex::Regex;

static LINK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"\[([^\]\n]+)\]\((https?://[^\s)]+)\)"#).expect("valid link regex"));
static CODE: Lazy<Regex> = Lazy::new(|| Regex::new(r"`([^`\n]+)`").expect("valid code regex"));
static BOLD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*\*(.+?)\*\*").expect("valid bold regex"));
static ITALIC: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*([^*\n]+)\*").expect("valid italic regex"));

/// Escape the five HTML-significant characters
pub fn escape_html(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// Reverse of [`escape_html`], plus the numeric quote entity
pub fn unescape_html(input: &str) -> String {
    input
        .replace("&quot;", "\"")
        .replace("&#34;", "\"")
        .replace("&#39;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

/// Render one text segment: escape, then links, code, bold, italic, newlines.
///
/// Links are matched first. Code and emphasis only apply to the text between
/// links and to link labels, never to an href.
pub fn render_markdown_segment(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }

    let escaped = escape_html(text);
    let mut html = String::with_capacity(escaped.len());
    let mut last = 0;

    for caps in LINK.captures_iter(&escaped) {
        let (Some(whole), Some(label), Some(href)) = (caps.get(0), caps.get(1), caps.get(2)) else {
            continue;
        };
        html.push_str(&render_inline(&escaped[last..whole.start()]));
        html.push_str(r#"<a href=""#);
        html.push_str(href.as_str());
        html.push_str(r#"" target="_blank" rel="noopener">"#);
        html.push_str(&render_inline(label.as_str()));
        html.push_str("</a>");
        last = whole.end();
    }
    html.push_str(&render_inline(&escaped[last..]));

    html.replace("\r\n", "\n").replace('\n', "<br>")
}

/// Code, bold and italic over already escaped text
fn render_inline(text: &str) -> String {
    let html = CODE.replace_all(text, "<code>$1</code>");
    let html = BOLD.replace_all(&html, "<strong>$1</strong>");
    ITALIC.replace_all(&html, "<em>$1</em>").into_owned()
}
