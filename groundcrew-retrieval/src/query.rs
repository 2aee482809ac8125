//! ABOUTME: Query builder for the hybrid search client

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VectorFilterMode {
    /// Apply the OData filter before the vector search narrows candidates.
    PreFilter,
    /// Run the vector search first, then drop results that fail the filter.
    PostFilter,
}

/// A single search request. Built incrementally so each retrieval stage
/// can relax one knob (drop the filter, widen `top_k`, drop the vector
/// term) without reconstructing the whole query.
#[derive(Debug, Clone)]
pub struct SearchQuery {
    pub text: String,
    pub vector: Option<Vec<f32>>,
    pub top_k: u32,
    pub reranker_threshold: f32,
    pub odata_filter: Option<String>,
    pub vector_filter_mode: VectorFilterMode,
}

impl SearchQuery {
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            vector: None,
            top_k: 8,
            reranker_threshold: 0.0,
            odata_filter: None,
            vector_filter_mode: VectorFilterMode::PreFilter,
        }
    }

    #[must_use]
    pub fn with_vector(mut self, vector: Vec<f32>) -> Self {
        self.vector = Some(vector);
        self
    }

    #[must_use]
    pub fn with_top_k(mut self, top_k: u32) -> Self {
        self.top_k = top_k;
        self
    }

    #[must_use]
    pub fn with_reranker_threshold(mut self, threshold: f32) -> Self {
        self.reranker_threshold = threshold;
        self
    }

    #[must_use]
    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.odata_filter = Some(filter.into());
        self
    }

    /// A copy of this query with the keyword term dropped — the pure
    /// vector search fallback stage. The client is expected to treat an
    /// empty `text` as "match on `vector` alone".
    #[must_use]
    pub fn without_keyword(&self) -> Self {
        Self {
            text: String::new(),
            ..self.clone()
        }
    }

    /// A copy of this query with the filter dropped — the widen stage.
    #[must_use]
    pub fn without_filter(&self) -> Self {
        Self {
            odata_filter: None,
            ..self.clone()
        }
    }

    /// A copy of this query with the reranker threshold relaxed to zero.
    #[must_use]
    pub fn without_threshold(&self) -> Self {
        Self {
            reranker_threshold: 0.0,
            ..self.clone()
        }
    }
}
