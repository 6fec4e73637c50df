use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A tenant's document set.
///
/// The collection owns the provider thread and vector store ids; both are
/// opaque strings assigned by the hosted assistant service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Collection {
    pub id: Uuid,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thread_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vector_store_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Collection {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            thread_id: None,
            vector_store_id: None,
            created_at: Utc::now(),
        }
    }

    /// Name given to a vector store created for this collection
    pub fn vector_store_name(&self) -> String {
        format!("collection-{}", self.id)
    }
}
