use std::collections::HashMap;

use safchat_types::FileRecord;

/// Where a citation or doc token should point
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileLink {
    pub url: String,
    pub label: String,
    pub is_pdf: bool,
}

impl FileLink {
    fn from_record(file: &FileRecord) -> Self {
        Self {
            url: file.local_url(),
            label: file.display_label(),
            is_pdf: file.is_pdf(),
        }
    }
}

/// Request-scoped lookup from the three names a file can be referred to by:
/// provider file id, storage name (`{id}.{ext}`), and display name.
///
/// Built from the caller's file list on every resolution; nothing is cached.
#[derive(Debug, Clone, Default)]
pub struct FileUrlMap {
    by_provider_id: HashMap<String, FileLink>,
    by_storage_name: HashMap<String, FileLink>,
    by_display_name: HashMap<String, FileLink>,
}

impl FileUrlMap {
    pub fn from_files(files: &[FileRecord]) -> Self {
        let mut map = Self::default();

        for file in files {
            let link = FileLink::from_record(file);

            if let Some(provider_id) = file.provider_file_id.as_deref().filter(|id| !id.is_empty()) {
                map.by_provider_id.insert(provider_id.to_string(), link.clone());
            }
            map.by_storage_name
                .insert(file.storage_name().to_ascii_lowercase(), link.clone());

            // first upload wins when two files share a display name
            map.by_display_name
                .entry(file.original_name.to_lowercase())
                .or_insert_with(|| link.clone());
            map.by_display_name
                .entry(link.label.to_lowercase())
                .or_insert(link);
        }

        map
    }

    pub fn is_empty(&self) -> bool {
        self.by_provider_id.is_empty() && self.by_storage_name.is_empty()
    }

    /// Exact lookup by provider file id
    pub fn by_provider_id(&self, provider_file_id: &str) -> Option<&FileLink> {
        self.by_provider_id.get(provider_file_id)
    }

    /// Resolve a doc token: provider id when it looks like one, then storage
    /// name, then display name.
    pub fn lookup_token(&self, token: &str) -> Option<&FileLink> {
        let token = token.trim();
        if token.is_empty() {
            return None;
        }

        if looks_like_provider_id(token) {
            if let Some(link) = self.by_provider_id.get(token) {
                return Some(link);
            }
        }

        let lowered = token.to_lowercase();
        self.by_storage_name
            .get(&token.to_ascii_lowercase())
            .or_else(|| self.by_display_name.get(&lowered))
    }
}

fn looks_like_provider_id(token: &str) -> bool {
    token.starts_with("file-") || token.starts_with("file_")
}
