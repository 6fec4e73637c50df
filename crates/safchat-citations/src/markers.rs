//! Splicing ordinal citation markers into assistant text.

use std::collections::HashMap;

use crate::markdown::{escape_html, render_markdown_segment};

/// CSS class carried by every unresolved citation anchor
pub const CITE_CLASS: &str = "saf-cite";

/// A file citation attached to a span of the original (unescaped) text.
///
/// Offsets count Unicode scalar values, not bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Citation {
    pub file_id: String,
    pub end_index: usize,
    pub start_index: Option<usize>,
    /// Source text the provider reports for the span
    pub text: Option<String>,
}

impl Citation {
    pub fn new(file_id: impl Into<String>, end_index: usize) -> Self {
        Self {
            file_id: file_id.into(),
            end_index,
            start_index: None,
            text: None,
        }
    }

    pub fn with_span(mut self, start_index: usize, text: impl Into<String>) -> Self {
        self.start_index = Some(start_index);
        self.text = Some(text.into());
        self
    }

    /// Start of a provider `【…】` placeholder that should be dropped, if any
    fn placeholder_start(&self) -> Option<usize> {
        let text = self.text.as_deref()?;
        if text.starts_with('【') {
            self.start_index.filter(|start| *start <= self.end_index)
        } else {
            None
        }
    }
}

/// `<sup><a class="saf-cite" data-file-id="...">[n]</a></sup>`
pub fn cite_marker(ordinal: usize, file_id: &str) -> String {
    format!(
        r#"<sup><a class="{}" data-file-id="{}">[{}]</a></sup>"#,
        CITE_CLASS,
        escape_html(file_id),
        ordinal
    )
}

/// Render `value` as HTML with a marker after every cited span.
///
/// Ordinals follow first-seen order of file ids in `citations`; repeated ids
/// reuse their ordinal. Each segment between offsets goes through
/// [`render_markdown_segment`] on its own and segments are joined in
/// ascending offset order.
pub fn render_cited_text(value: &str, citations: &[Citation]) -> String {
    if citations.is_empty() {
        return render_markdown_segment(value);
    }

    let chars: Vec<char> = value.chars().collect();
    let len = chars.len();

    let mut ordinals: HashMap<&str, usize> = HashMap::new();
    let mut splices = Vec::with_capacity(citations.len());
    for citation in citations {
        let next = ordinals.len() + 1;
        let ordinal = *ordinals.entry(citation.file_id.as_str()).or_insert(next);
        let end = citation.end_index.min(len);
        let cut = citation.placeholder_start().map(|s| s.min(end)).unwrap_or(end);
        splices.push((end, cut, ordinal, citation.file_id.as_str()));
    }
    // stable: equal offsets keep annotation order
    splices.sort_by_key(|(end, ..)| *end);

    let mut html = String::with_capacity(value.len() * 2);
    let mut cursor = 0;
    for (end, cut, ordinal, file_id) in splices {
        let cut = cut.max(cursor);
        if cut > cursor {
            let segment: String = chars[cursor..cut].iter().collect();
            html.push_str(&render_markdown_segment(&segment));
        }
        html.push_str(&cite_marker(ordinal, file_id));
        cursor = cursor.max(end);
    }
    if cursor < len {
        let tail: String = chars[cursor..].iter().collect();
        html.push_str(&render_markdown_segment(&tail));
    }

    html
}
