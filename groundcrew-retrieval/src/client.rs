//! ABOUTME: Search client trait over the underlying index, plus a lazy-load hook

use crate::error::Result;
use crate::query::SearchQuery;
use async_trait::async_trait;
use groundcrew_core::Reference;

/// The index a `RetrievalEngine` searches against. One implementation per
/// backend (hosted hybrid search service, self-hosted vector store, ...).
#[async_trait]
pub trait SearchClient: Send + Sync {
    async fn search(&self, query: &SearchQuery) -> Result<Vec<Reference>>;

    /// Fetch the full content for a reference previously returned as a
    /// summary by lazy retrieval.
    async fn load(&self, id: &str) -> Result<Reference>;
}
