//! ABOUTME: Concurrent retrieval dispatch — single-query, decomposition fan-out, and web-to-reference conversion

use futures::future::join_all;
use groundcrew_core::{DecomposedQuery, Reference, ReferenceSource, SubQuery, WebResult};
use groundcrew_retrieval::{RetrievalEngine, RetrievalResult, Result, SearchQuery};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::warn;

/// Runs the fallback chain (and, if configured, reformulation) once for the
/// whole question, optionally in lazy (summary-only) mode. Returns the
/// retrieval crate's own error type so callers can wrap the call in
/// `groundcrew_utils::retry_with_backoff` before converting.
pub async fn run_vector_retrieval(
    engine: &RetrievalEngine,
    question: &str,
    top_k: u32,
    reranker_threshold: f32,
    max_reformulations: u32,
    lazy: bool,
) -> Result<RetrievalResult> {
    let query = SearchQuery::new(question)
        .with_top_k(top_k)
        .with_reranker_threshold(reranker_threshold);
    let result = if lazy {
        engine.retrieve_lazy(query, max_reformulations).await?
    } else {
        engine.retrieve(query, max_reformulations).await?
    };
    Ok(result)
}

/// Runs retrieval for every sub-query of a decomposition, in topological
/// waves bounded by `max_parallel` concurrent retrievals per wave
/// (`spec.md` §4.1 step 5: "independent sub-queries execute concurrently").
/// Deduped by reference id across sub-queries.
pub async fn run_decomposed_retrieval(
    engine: &RetrievalEngine,
    decomposed: &DecomposedQuery,
    max_parallel: u32,
    max_reformulations: u32,
) -> Vec<Reference> {
    let mut done: HashSet<String> = HashSet::new();
    let mut remaining: Vec<&SubQuery> = decomposed.sub_queries.iter().collect();
    let mut merged: HashMap<String, Reference> = HashMap::new();
    let semaphore = Arc::new(Semaphore::new(max_parallel.max(1) as usize));

    while !remaining.is_empty() {
        let (ready, pending): (Vec<&SubQuery>, Vec<&SubQuery>) = remaining
            .into_iter()
            .partition(|sub| sub.depends_on.iter().all(|dep| done.contains(dep)));
        if ready.is_empty() {
            warn!("decomposition fan-out stalled on an unsatisfied dependency");
            break;
        }

        let waves = ready.iter().map(|sub| {
            let semaphore = Arc::clone(&semaphore);
            let query = SearchQuery::new(sub.text.clone());
            async move {
                let _permit = semaphore.acquire().await.expect("semaphore is never closed");
                engine.retrieve(query, max_reformulations).await
            }
        });
        let outcomes = join_all(waves).await;

        for (sub, outcome) in ready.iter().zip(outcomes) {
            done.insert(sub.id.clone());
            match outcome {
                Ok(result) => {
                    for reference in result.references {
                        merged.entry(reference.id.clone()).or_insert(reference);
                    }
                }
                Err(err) => warn!(sub_query = sub.id, error = %err, "sub-query retrieval failed, continuing with remaining evidence"),
            }
        }
        remaining = pending;
    }

    merged.into_values().collect()
}

/// Converts web results surviving quality filtering into `Reference`s so
/// they can be fused with index evidence and cited the same way
/// (`spec.md` §4.4).
#[must_use]
pub fn web_results_to_references(results: &[WebResult]) -> Vec<Reference> {
    results
        .iter()
        .map(|result| Reference {
            id: format!("web-{}", result.id),
            title: Some(result.title.clone()),
            url: Some(result.url.clone()),
            page_number: None,
            content: result.snippet.clone(),
            score: Some(result.scores.overall).filter(|s| *s > 0.0),
            captions: Vec::new(),
            source: ReferenceSource::Web,
            is_summary: false,
        })
        .collect()
}
