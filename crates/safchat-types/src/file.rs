use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Metadata for a locally stored file that may also be hosted by the provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileRecord {
    pub id: Uuid,
    pub collection_id: Uuid,
    /// Name as uploaded by the user
    pub original_name: String,
    /// Extension without the leading dot
    pub extension: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider_file_id: Option<String>,
    #[serde(default)]
    pub content_type: String,
    #[serde(default)]
    pub size_bytes: u64,
    pub uploaded_at: DateTime<Utc>,
}

impl FileRecord {
    pub fn new(collection_id: Uuid, original_name: impl Into<String>) -> Self {
        let original_name = original_name.into();
        let extension = original_name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_default();

        Self {
            id: Uuid::new_v4(),
            collection_id,
            original_name,
            extension,
            provider_file_id: None,
            content_type: String::new(),
            size_bytes: 0,
            uploaded_at: Utc::now(),
        }
    }

    pub fn with_id(mut self, id: Uuid) -> Self {
        self.id = id;
        self
    }

    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into().trim_start_matches('.').to_ascii_lowercase();
        self
    }

    pub fn with_provider_file_id(mut self, provider_file_id: impl Into<String>) -> Self {
        self.provider_file_id = Some(provider_file_id.into());
        self
    }

    pub fn with_content(mut self, content_type: impl Into<String>, size_bytes: u64) -> Self {
        self.content_type = content_type.into();
        self.size_bytes = size_bytes;
        self
    }

    /// `{id}.{ext}`, the name the file is stored under on disk
    pub fn storage_name(&self) -> String {
        if self.extension.is_empty() {
            self.id.to_string()
        } else {
            format!("{}.{}", self.id, self.extension)
        }
    }

    /// Convention-based path served by the local file server
    pub fn local_url(&self) -> String {
        format!("/Files/{}", self.storage_name())
    }

    /// Original name, with the extension appended only when missing
    pub fn display_label(&self) -> String {
        if self.extension.is_empty() {
            return self.original_name.clone();
        }
        let suffix = format!(".{}", self.extension);
        if self
            .original_name
            .to_ascii_lowercase()
            .ends_with(&suffix)
        {
            self.original_name.clone()
        } else {
            format!("{}{}", self.original_name, suffix)
        }
    }

    pub fn is_pdf(&self) -> bool {
        self.extension == "pdf"
    }
}
