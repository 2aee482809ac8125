//! ABOUTME: Fallback chain that relaxes a search query one knob at a time until it returns evidence

use crate::query::SearchQuery;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackStage {
    /// Vector + keyword + reranker threshold + filter, as requested.
    HybridRerank,
    /// Drop the reranker threshold — a real but low-scoring match may exist.
    HybridRelaxedThreshold,
    /// Drop the filter and the keyword term; keep only the vector term.
    VectorOnly,
    /// The vector-only query again, but accept whatever it returns — even
    /// below the success bar — as summary-only evidence rather than
    /// failing the whole retrieval.
    LazyMode,
}

/// Builds the ordered sequence of queries `RetrievalEngine::run_chain` tries
/// before giving up, widening on a single axis at each stage so the caller
/// can tell which relaxation actually produced results.
///
/// 1. **Hybrid + rerank** — the query as built by the caller.
/// 2. **Hybrid, relaxed threshold** → drop the reranker threshold, keep
///    filter and vector.
/// 3. **Pure vector search** → also drop the filter and the keyword term.
/// 4. **Lazy mode** → the same vector-only query, with the engine accepting
///    a below-threshold result as summary evidence rather than failing.
#[must_use]
pub fn fallback_chain(query: &SearchQuery) -> Vec<(FallbackStage, SearchQuery)> {
    let stage1 = query.clone();
    let stage2 = stage1.without_threshold();
    let stage3 = stage2.without_filter().without_keyword();
    let stage4 = stage3.clone();

    debug!(
        has_filter = query.odata_filter.is_some(),
        has_vector = query.vector.is_some(),
        "built 4-stage retrieval fallback chain"
    );

    vec![
        (FallbackStage::HybridRerank, stage1),
        (FallbackStage::HybridRelaxedThreshold, stage2),
        (FallbackStage::VectorOnly, stage3),
        (FallbackStage::LazyMode, stage4),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chain_relaxes_one_axis_per_stage() {
        let query = SearchQuery::new("photosynthesis")
            .with_vector(vec![0.1, 0.2])
            .with_reranker_threshold(0.6)
            .with_filter("category eq 'biology'");
        let chain = fallback_chain(&query);

        assert_eq!(chain.len(), 4);
        assert!(chain[0].1.odata_filter.is_some());
        assert_eq!(chain[0].1.reranker_threshold, 0.6);
        assert_eq!(chain[1].1.reranker_threshold, 0.0);
        assert!(chain[1].1.odata_filter.is_some());
        assert!(chain[2].1.odata_filter.is_none());
        assert!(chain[2].1.text.is_empty());
        assert!(chain[2].1.vector.is_some());
        assert_eq!(chain[3].1.text, chain[2].1.text);
        assert!(chain[3].1.vector.is_some());
    }

    #[test]
    fn a_query_with_no_filter_or_vector_still_produces_four_stages() {
        let query = SearchQuery::new("bare keyword query");
        let chain = fallback_chain(&query);
        assert_eq!(chain.len(), 4);
    }
}
