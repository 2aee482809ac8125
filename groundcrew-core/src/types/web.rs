//! ABOUTME: Web search result and fusion scoring types

use serde::{Deserialize, Serialize};

/// Per-result scores computed by `groundcrew_web::filter` before fusion.
/// Zeroed by default; populated once a result has an embedding to compare
/// against the query and the rest of the batch.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct WebScore {
    pub authority: f32,
    pub novelty: f32,
    pub relevance: f32,
    pub overall: f32,
}

/// A single result returned by the web search client, prior to fusion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebResult {
    /// Stable id within one search call, used to correlate a result across
    /// the raw response, the quality filter, and fusion.
    pub id: String,
    pub url: String,
    pub title: String,
    pub snippet: String,
    pub published_at: Option<chrono::DateTime<chrono::Utc>>,
    /// Position in the provider's own ranking, 0-based.
    pub rank: u32,
    pub fetched_at: chrono::DateTime<chrono::Utc>,
    pub scores: WebScore,
}

impl WebResult {
    #[must_use]
    pub fn new(url: impl Into<String>, title: impl Into<String>, snippet: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            url: url.into(),
            title: title.into(),
            snippet: snippet.into(),
            published_at: None,
            rank: 0,
            fetched_at: chrono::Utc::now(),
            scores: WebScore::default(),
        }
    }

    #[must_use]
    pub fn with_rank(mut self, rank: u32) -> Self {
        self.rank = rank;
        self
    }
}
