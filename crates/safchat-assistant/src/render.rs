// Provider message -> (plain text, HTML with citation markers)

use safchat_citations::{render_cited_text, Citation};

use crate::openai::{MessageObject, TextContent};

const PART_SEPARATOR_TEXT: &str = "\n\n";
const PART_SEPARATOR_HTML: &str = "<br><br>";

/// Raw text of every text part
pub fn message_plain_text(message: &MessageObject) -> String {
    message
        .text_parts()
        .map(|part| part.value.as_str())
        .collect::<Vec<_>>()
        .join(PART_SEPARATOR_TEXT)
}

/// Rendered HTML of every text part; ordinals restart per part
pub fn message_html(message: &MessageObject) -> String {
    message
        .text_parts()
        .map(render_text_part)
        .collect::<Vec<_>>()
        .join(PART_SEPARATOR_HTML)
}

pub fn render_text_part(part: &TextContent) -> String {
    render_cited_text(&part.value, &citations(part))
}

/// File citations that carry an `end_index`, in annotation order
fn citations(part: &TextContent) -> Vec<Citation> {
    part.annotations
        .iter()
        .filter_map(|annotation| {
            let file_id = annotation.cited_file_id()?;
            let end_index = annotation.end_index?;
            let mut citation = Citation::new(file_id, end_index);
            if let (Some(start), Some(text)) = (annotation.start_index, annotation.text.as_ref()) {
                citation = citation.with_span(start, text.clone());
            }
            Some(citation)
        })
        .collect()
}
