//! ABOUTME: Memory record types shared by short-term and long-term stores

use serde::{Deserialize, Serialize};

/// A single distilled fact kept across turns within one session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryBullet {
    pub turn: u32,
    pub text: String,
}

/// A user preference or recurring fact worth remembering across sessions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SalienceNote {
    pub text: String,
    pub weight: f32,
    /// Turn this note was last reinforced on, for age pruning.
    pub last_seen_turn: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemoryType {
    /// A specific past exchange: "Q: ... A: ...".
    Episodic,
    /// A distilled fact about the world, independent of when it was learned.
    Semantic,
    /// A recurring pattern in how the user wants a task done.
    Procedural,
    /// A standing preference the user has stated ("always answer in French").
    Preference,
}

/// A record in the long-term store, recalled by embedding similarity
/// (`spec.md` §4.6, redesigned per §9 to expose `{add, recall, prune, stats}`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LongTermMemory {
    pub id: String,
    pub session_id: String,
    pub user_id: Option<String>,
    pub memory_type: MemoryType,
    pub text: String,
    pub embedding: Vec<f32>,
    pub tags: Vec<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub last_accessed_at: Option<chrono::DateTime<chrono::Utc>>,
    pub usage_count: u32,
}

impl LongTermMemory {
    #[must_use]
    pub fn new(id: impl Into<String>, session_id: impl Into<String>, memory_type: MemoryType, text: impl Into<String>, embedding: Vec<f32>, created_at: chrono::DateTime<chrono::Utc>) -> Self {
        Self {
            id: id.into(),
            session_id: session_id.into(),
            user_id: None,
            memory_type,
            text: text.into(),
            embedding,
            tags: Vec::new(),
            created_at,
            last_accessed_at: None,
            usage_count: 0,
        }
    }

    #[must_use]
    pub fn cosine_similarity(&self, query: &[f32]) -> f32 {
        cosine_similarity(&self.embedding, query)
    }

    /// Records a recall: bumps `usage_count` and stamps `last_accessed_at`.
    pub fn mark_accessed(&mut self, now: chrono::DateTime<chrono::Utc>) {
        self.usage_count += 1;
        self.last_accessed_at = Some(now);
    }
}

#[must_use]
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_vectors_have_similarity_one() {
        let v = vec![1.0, 2.0, 3.0];
        assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn orthogonal_vectors_have_similarity_zero() {
        assert!((cosine_similarity(&[1.0, 0.0], &[0.0, 1.0])).abs() < 1e-6);
    }

    #[test]
    fn mismatched_lengths_return_zero() {
        assert_eq!(cosine_similarity(&[1.0, 2.0], &[1.0]), 0.0);
    }
}
