pub mod file_map;
pub mod markdown;
pub mod markers;
pub mod resolver;

pub use file_map::{FileLink, FileUrlMap};
pub use markdown::{escape_html, render_markdown_segment, unescape_html};
pub use markers::{cite_marker, render_cited_text, Citation, CITE_CLASS};
pub use resolver::CitationResolver;
