//! Vector-store health checks and repair.
//!
//! Hosted stores expire after a period of inactivity. Callers go through
//! [`VectorStoreKeeper::ensure_ready_or_repair`] before using a store so
//! expiry never has to be special-cased; repair reuses the already-hosted
//! file ids, nothing is re-uploaded.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::Utc;
use tokio_util::sync::CancellationToken;

use crate::config::AssistantConfig;
use crate::error::{AssistantError, Result};
use crate::ingest::attach_batch;
use crate::openai::{CreateVectorStoreRequest, VectorStoreObject, VectorStoreStatus};
use crate::polling::{ensure_active, PollPolicy};
use crate::traits::{ignore_not_found, AssistantsApi};

/// What to rebuild a store from when it has to be recreated
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RepairRequest {
    pub known_file_ids: Vec<String>,
    pub name: String,
    pub metadata: HashMap<String, String>,
}

impl RepairRequest {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_file_ids<I, S>(mut self, file_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.known_file_ids = file_ids.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Trimmed, non-blank ids in first-seen order without duplicates
    pub fn attachable_file_ids(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.known_file_ids
            .iter()
            .map(|id| id.trim())
            .filter(|id| !id.is_empty())
            .filter(|id| seen.insert(id.to_string()))
            .map(str::to_string)
            .collect()
    }
}

pub struct VectorStoreKeeper {
    api: Arc<dyn AssistantsApi>,
    policy: PollPolicy,
    expiry_days: Option<u32>,
}

impl VectorStoreKeeper {
    pub fn new(api: Arc<dyn AssistantsApi>, config: &AssistantConfig) -> Self {
        Self {
            api,
            policy: config.indexing_policy(),
            expiry_days: config.vector_store_expiry_days,
        }
    }

    pub fn with_policy(mut self, policy: PollPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Create an empty store
    pub async fn create(
        &self,
        name: &str,
        metadata: &HashMap<String, String>,
        cancel: &CancellationToken,
    ) -> Result<String> {
        let mut request = CreateVectorStoreRequest::new(name).with_metadata(metadata.clone());
        if let Some(days) = self.expiry_days {
            request = request.expires_after_days(days);
        }

        let store = self.api.create_vector_store(request, cancel).await?;
        tracing::info!(vector_store_id = %store.id, name, "Created vector store");
        Ok(store.id)
    }

    /// Idempotent
    pub async fn delete(&self, vector_store_id: &str, cancel: &CancellationToken) -> Result<()> {
        ignore_not_found(
            self.api.delete_vector_store(vector_store_id, cancel).await,
            "Vector store",
            vector_store_id,
        )
    }

    /// Return an id that is safe to use: the same one when the store is
    /// ready, a freshly built one when it expired or could not be fetched.
    ///
    /// A live store that is still indexing is an error; retrying is up to
    /// the caller.
    pub async fn ensure_ready_or_repair(
        &self,
        vector_store_id: &str,
        repair: &RepairRequest,
        cancel: &CancellationToken,
    ) -> Result<String> {
        ensure_active(cancel)?;

        if vector_store_id.trim().is_empty() {
            return self.recreate(repair, cancel).await;
        }

        let store = match self.api.get_vector_store(vector_store_id, cancel).await {
            Ok(store) => store,
            Err(AssistantError::Cancelled) => return Err(AssistantError::Cancelled),
            Err(err) => {
                tracing::warn!(vector_store_id, "Vector store fetch failed, recreating: {}", err);
                return self.recreate(repair, cancel).await;
            }
        };

        if is_expired(&store, Utc::now().timestamp()) {
            tracing::info!(vector_store_id, status = %store.status, "Vector store expired, recreating");
            return self.recreate(repair, cancel).await;
        }

        if store.status != VectorStoreStatus::Completed {
            return Err(AssistantError::VectorStoreNotReady {
                vector_store_id: vector_store_id.to_string(),
                status: store.status.to_string(),
            });
        }

        Ok(store.id)
    }

    async fn recreate(&self, repair: &RepairRequest, cancel: &CancellationToken) -> Result<String> {
        let new_id = self.create(&repair.name, &repair.metadata, cancel).await?;

        let file_ids = repair.attachable_file_ids();
        if !file_ids.is_empty() {
            attach_batch(self.api.as_ref(), &new_id, &file_ids, self.policy, cancel).await?;
            tracing::info!(vector_store_id = %new_id, files = file_ids.len(), "Reattached files");
        }

        Ok(new_id)
    }
}

/// Expired by status, or by an `expires_at` that is already past
fn is_expired(store: &VectorStoreObject, now: i64) -> bool {
    store.status == VectorStoreStatus::Expired
        || store.expires_at.is_some_and(|expires_at| expires_at <= now)
}
