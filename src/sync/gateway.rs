use std::sync::Arc;

use super::DigestApi;
use super::cache::{CacheKey, QueryCache};
use crate::core::digest::{self, DigestDraft, DigestId, DigestRecord, DigestUpdate};
use crate::core::form::Submission;
use crate::error::MutationError;

pub type CollectionCache = QueryCache<Vec<DigestRecord>>;

/// Issues contact mutations and keeps the shared collection cache honest.
///
/// A successful mutation only invalidates the cache; the collection is never
/// patched in place. A failed one leaves the cache alone and is not retried.
#[derive(Clone)]
pub struct MutationGateway {
    api: Arc<dyn DigestApi>,
    cache: Arc<CollectionCache>,
}

impl MutationGateway {
    pub fn new(api: Arc<dyn DigestApi>) -> Self {
        Self::with_cache(api, Arc::new(QueryCache::new()))
    }

    pub fn with_cache(api: Arc<dyn DigestApi>, cache: Arc<CollectionCache>) -> Self {
        Self { api, cache }
    }

    pub fn cache(&self) -> &Arc<CollectionCache> {
        &self.cache
    }

    /// The owner's contacts, newest first, served from the cache when fresh.
    pub async fn collection(&self) -> Result<Vec<DigestRecord>, MutationError> {
        let api = self.api.clone();
        self.cache
            .read(CacheKey::Digests, move || async move {
                let mut records = api.all().await?;
                digest::sort_newest_first(&mut records);
                log::debug!("Fetched {} contacts", records.len());
                Ok(records)
            })
            .await
    }

    /// Mark the collection stale and read it again from the API. Used for
    /// explicit refreshes and when a new API is installed over a shared cache.
    pub async fn reload(&self) -> Result<Vec<DigestRecord>, MutationError> {
        self.cache.invalidate(CacheKey::Digests).await;
        self.collection().await
    }

    pub async fn create(&self, draft: &DigestDraft) -> Result<DigestRecord, MutationError> {
        let record = self.api.create(draft).await.inspect_err(|e| {
            log::warn!("Creating contact {:?} failed: {}", draft.full_name, e);
        })?;
        log::info!("Created contact {}", record.id);
        self.cache.invalidate(CacheKey::Digests).await;
        Ok(record)
    }

    pub async fn update(&self, update: &DigestUpdate) -> Result<DigestRecord, MutationError> {
        let record = self.api.update(update).await.inspect_err(|e| {
            log::warn!("Updating contact {} failed: {}", update.id, e);
        })?;
        log::info!("Updated contact {}", record.id);
        self.cache.invalidate(CacheKey::Digests).await;
        Ok(record)
    }

    pub async fn remove(&self, id: DigestId) -> Result<(), MutationError> {
        self.api.remove(id).await.inspect_err(|e| {
            log::warn!("Removing contact {} failed: {}", id, e);
        })?;
        log::info!("Removed contact {}", id);
        self.cache.invalidate(CacheKey::Digests).await;
        Ok(())
    }

    /// Dispatch a form submission to `create` or `update`.
    pub async fn submit(&self, submission: Submission) -> Result<DigestRecord, MutationError> {
        match submission {
            Submission::Create(draft) => self.create(&draft).await,
            Submission::Update(update) => self.update(&update).await,
        }
    }
}
