//! Rewrites provider citation anchors and inline doc tokens into links to
//! locally served files.
//!
//! Both passes fail open: anything that cannot be resolved is left exactly
//! as it was. Both are idempotent since their output never matches their
//! own patterns.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use safchat_types::FileRecord;

use crate::file_map::{FileLink, FileUrlMap};
use crate::markdown::{escape_html, unescape_html};
use crate::markers::CITE_CLASS;

static CITE_ANCHOR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?s)<a class="saf-cite" data-file-id="([^"]*)">(.*?)</a>"#)
        .expect("valid citation anchor regex")
});

static DOC_TOKEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"\[\[doc:\s*(?:"|&quot;|&#34;)((?:[^"&\]\n]|&(?:amp|lt|gt|#39);)+)(?:"|&quot;|&#34;)(?:\s*,\s*page:\s*(\d+))?\s*\]\]"#)
        .expect("valid doc token regex")
});

/// Resolves citations against one collection's files
#[derive(Debug, Clone)]
pub struct CitationResolver {
    map: FileUrlMap,
}

impl CitationResolver {
    pub fn new(files: &[FileRecord]) -> Self {
        Self {
            map: FileUrlMap::from_files(files),
        }
    }

    pub fn from_map(map: FileUrlMap) -> Self {
        Self { map }
    }

    pub fn file_map(&self) -> &FileUrlMap {
        &self.map
    }

    /// Run both passes
    pub fn resolve(&self, html: &str) -> String {
        let html = self.resolve_provider_anchors(html);
        self.resolve_doc_tokens(&html)
    }

    /// Replace `<a class="saf-cite" data-file-id="ID">inner</a>` with a real
    /// link when `ID` is a known provider file id.
    pub fn resolve_provider_anchors(&self, html: &str) -> String {
        CITE_ANCHOR
            .replace_all(html, |caps: &Captures| {
                let file_id = unescape_html(&caps[1]);
                match self.map.by_provider_id(&file_id) {
                    Some(link) => cite_link(link, &caps[1], &caps[2]),
                    None => {
                        tracing::debug!(file_id = %file_id, "Citation left unresolved");
                        caps[0].to_string()
                    }
                }
            })
            .into_owned()
    }

    /// Replace `[[doc:"TOKEN"]]` / `[[doc:"TOKEN", page:N]]` with a link
    pub fn resolve_doc_tokens(&self, html: &str) -> String {
        DOC_TOKEN
            .replace_all(html, |caps: &Captures| {
                let token = unescape_html(&caps[1]);
                match self.map.lookup_token(&token) {
                    Some(link) => {
                        let page = caps.get(2).map(|m| m.as_str());
                        doc_link(link, page)
                    }
                    None => {
                        tracing::debug!(token = %token, "Doc token left unresolved");
                        caps[0].to_string()
                    }
                }
            })
            .into_owned()
    }
}

fn cite_link(link: &FileLink, raw_file_id: &str, inner: &str) -> String {
    let label = escape_html(&link.label);
    format!(
        r#"<a href="{}" class="{} saf-cite-resolved" data-file-id="{}" target="_blank" rel="noopener" title="{}">{} {}</a>"#,
        escape_html(&link.url),
        CITE_CLASS,
        raw_file_id,
        label,
        inner,
        label
    )
}

fn doc_link(link: &FileLink, page: Option<&str>) -> String {
    let mut href = link.url.clone();
    if let Some(page) = page {
        if link.is_pdf && !href.contains('#') {
            href.push_str("#page=");
            href.push_str(page);
        }
    }
    format!(
        r#"<a href="{}" class="saf-doc" target="_blank" rel="noopener">{}</a>"#,
        escape_html(&href),
        escape_html(&link.label)
    )
}
