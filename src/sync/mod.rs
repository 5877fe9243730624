pub mod cache;
pub mod gateway;
pub mod http;
pub mod keyring;
pub mod memory;
pub mod snapshot;

use async_trait::async_trait;

use crate::core::digest::{DigestDraft, DigestId, DigestRecord, DigestUpdate};
use crate::error::MutationError;

/// The `digests.*` remote procedures.
///
/// Implementations talk to the source of truth and nothing else; cache
/// bookkeeping belongs to [`gateway::MutationGateway`].
#[async_trait]
pub trait DigestApi: Send + Sync {
    /// Every contact of the current owner, newest first.
    async fn all(&self) -> Result<Vec<DigestRecord>, MutationError>;

    async fn create(&self, draft: &DigestDraft) -> Result<DigestRecord, MutationError>;

    async fn update(&self, update: &DigestUpdate) -> Result<DigestRecord, MutationError>;

    async fn remove(&self, id: DigestId) -> Result<(), MutationError>;
}
