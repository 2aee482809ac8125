//! ABOUTME: Durable embedding-indexed long-term memory, recalled by cosine similarity

use crate::error::{MemoryError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use groundcrew_core::{LongTermMemory, MemoryType};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::warn;

#[derive(Debug, Clone, Default)]
pub struct RecallFilter {
    pub session_id: Option<String>,
    pub user_id: Option<String>,
    pub memory_type: Option<MemoryType>,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MemoryStats {
    pub total: usize,
    pub episodic: usize,
    pub semantic: usize,
    pub procedural: usize,
    pub preference: usize,
}

/// Redesigned per `spec.md` §9 to the narrow `{add, recall, prune, stats}`
/// surface the orchestrator actually needs, rather than the teacher's
/// multi-backend trait hierarchy.
#[async_trait]
pub trait LongTermMemoryStore: Send + Sync {
    async fn add(&self, memory: LongTermMemory) -> Result<()>;

    /// Top-K by cosine similarity `>= min_similarity`, after `filter`.
    async fn recall(&self, query_embedding: &[f32], top_k: usize, min_similarity: f32, filter: &RecallFilter) -> Result<Vec<LongTermMemory>>;

    /// Deletes records older than `max_age_days` with `usage_count < min_usage`.
    async fn prune(&self, max_age_days: i64, min_usage: u32) -> Result<usize>;

    async fn stats(&self) -> Result<MemoryStats>;
}

/// Thread-safe in-process store, following the teacher's
/// `Arc<RwLock<HashMap>>` + cosine-similarity-scan shape for episodic
/// memory. Adequate for a single process; a durable backend would
/// implement the same trait against a real vector store.
pub struct InMemoryLongTermStore {
    records: Arc<RwLock<HashMap<String, LongTermMemory>>>,
    /// Dimensionality of the first embedding ever added; 0 means unset.
    /// Every later `add` and `recall` is validated against it.
    dimensions: AtomicUsize,
}

impl InMemoryLongTermStore {
    #[must_use]
    pub fn new() -> Self {
        Self {
            records: Arc::new(RwLock::new(HashMap::new())),
            dimensions: AtomicUsize::new(0),
        }
    }

    /// Returns the store's fixed embedding dimensionality, pinning it to
    /// `len` if this is the first call.
    fn dimensions_or_pin(&self, len: usize) -> usize {
        match self.dimensions.compare_exchange(0, len, Ordering::SeqCst, Ordering::SeqCst) {
            Ok(_) => len,
            Err(existing) => existing,
        }
    }
}

impl Default for InMemoryLongTermStore {
    fn default() -> Self {
        Self::new()
    }
}

fn matches(memory: &LongTermMemory, filter: &RecallFilter) -> bool {
    if let Some(session_id) = &filter.session_id {
        if &memory.session_id != session_id {
            return false;
        }
    }
    if let Some(user_id) = &filter.user_id {
        if memory.user_id.as_ref() != Some(user_id) {
            return false;
        }
    }
    if let Some(memory_type) = filter.memory_type {
        if memory.memory_type != memory_type {
            return false;
        }
    }
    filter.tags.iter().all(|tag| memory.tags.contains(tag))
}

#[async_trait]
impl LongTermMemoryStore for InMemoryLongTermStore {
    async fn add(&self, memory: LongTermMemory) -> Result<()> {
        let expected = self.dimensions_or_pin(memory.embedding.len());
        if memory.embedding.len() != expected {
            return Err(MemoryError::DimensionMismatch { expected, actual: memory.embedding.len() });
        }
        self.records.write().insert(memory.id.clone(), memory);
        Ok(())
    }

    async fn recall(&self, query_embedding: &[f32], top_k: usize, min_similarity: f32, filter: &RecallFilter) -> Result<Vec<LongTermMemory>> {
        let now: DateTime<Utc> = Utc::now();
        let mut records = self.records.write();

        let mut scored: Vec<(f32, String)> = records
            .values()
            .filter(|memory| matches(memory, filter))
            .filter(|memory| memory.embedding.len() == query_embedding.len())
            .map(|memory| (memory.cosine_similarity(query_embedding), memory.id.clone()))
            .filter(|(score, _)| *score >= min_similarity)
            .collect();
        scored.sort_by(|a, b| b.0.total_cmp(&a.0));
        scored.truncate(top_k);

        let mut results = Vec::with_capacity(scored.len());
        for (_, id) in scored {
            if let Some(memory) = records.get_mut(&id) {
                memory.mark_accessed(now);
                results.push(memory.clone());
            }
        }
        Ok(results)
    }

    async fn prune(&self, max_age_days: i64, min_usage: u32) -> Result<usize> {
        let now: DateTime<Utc> = Utc::now();
        let mut records = self.records.write();
        let before = records.len();
        records.retain(|_, memory| {
            let age_days = (now - memory.created_at).num_days();
            !(age_days > max_age_days && memory.usage_count < min_usage)
        });
        let pruned = before - records.len();
        Ok(pruned)
    }

    async fn stats(&self) -> Result<MemoryStats> {
        let records = self.records.read();
        let count = |kind: MemoryType| records.values().filter(|m| m.memory_type == kind).count();
        Ok(MemoryStats {
            total: records.len(),
            episodic: count(MemoryType::Episodic),
            semantic: count(MemoryType::Semantic),
            procedural: count(MemoryType::Procedural),
            preference: count(MemoryType::Preference),
        })
    }
}

/// Wraps a fallible recall so a failure never blocks the pipeline
/// (`spec.md` §4.6 failure mode): logs a warning and returns an empty set.
pub async fn recall_or_empty(
    store: &dyn LongTermMemoryStore,
    query_embedding: &[f32],
    top_k: usize,
    min_similarity: f32,
    filter: &RecallFilter,
) -> Vec<LongTermMemory> {
    match store.recall(query_embedding, top_k, min_similarity, filter).await {
        Ok(results) => results,
        Err(err) => {
            warn!(error = %err, "long-term memory recall failed, continuing without it");
            Vec::new()
        }
    }
}
