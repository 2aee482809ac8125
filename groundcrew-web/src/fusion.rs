//! ABOUTME: Reciprocal-rank fusion of index and web evidence, with optional semantic boost

use groundcrew_core::{cosine_similarity, Reference};
use std::collections::HashMap;
use tracing::debug;

pub const DEFAULT_RRF_K: f32 = 60.0;
pub const DEFAULT_SEMANTIC_BOOST_WEIGHT: f32 = 0.3;

fn dedupe_key(reference: &Reference) -> String {
    reference
        .url
        .as_ref()
        .map(|u| u.trim_end_matches('/').to_lowercase())
        .unwrap_or_else(|| reference.id.clone())
}

/// Fuses index and web evidence by reciprocal-rank fusion: an item present
/// at rank `r` (1-indexed) in a source contributes `1 / (k + r)`; an item
/// present in both sources sums both contributions. Deduped by normalized
/// URL (falling back to id for references without one). Optionally blends
/// in a semantic-similarity term against `query_embedding`, when every
/// reference carries a `score` already populated with a comparable
/// embedding-derived relevance (`final = (1-w)*RRF + w*similarity`).
#[must_use]
pub fn fuse(
    index_refs: &[Reference],
    web_refs: &[Reference],
    k: f32,
    semantic_boost: Option<(&[f32], &HashMap<String, Vec<f32>>, f32)>,
) -> Vec<Reference> {
    let mut rrf_scores: HashMap<String, f32> = HashMap::new();
    let mut merged: HashMap<String, Reference> = HashMap::new();

    for source in [index_refs, web_refs] {
        for (rank, reference) in source.iter().enumerate() {
            let key = dedupe_key(reference);
            let contribution = 1.0 / (k + (rank + 1) as f32);
            *rrf_scores.entry(key.clone()).or_insert(0.0) += contribution;
            merged.entry(key).or_insert_with(|| reference.clone());
        }
    }

    let mut fused: Vec<(String, f32)> = rrf_scores.into_iter().collect();

    if let Some((query_embedding, embeddings_by_key, weight)) = semantic_boost {
        for (key, rrf) in &mut fused {
            if let Some(embedding) = embeddings_by_key.get(key) {
                let similarity = cosine_similarity(query_embedding, embedding);
                *rrf = (1.0 - weight) * *rrf + weight * similarity;
            }
        }
    }

    fused.sort_by(|a, b| b.1.total_cmp(&a.1));
    debug!(count = fused.len(), "fused index and web evidence by RRF");

    fused
        .into_iter()
        .filter_map(|(key, score)| merged.remove(&key).map(|reference| reference.with_score(score)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference(id: &str, url: &str) -> Reference {
        Reference::from_index(id, "content").with_url(url)
    }

    #[test]
    fn items_in_both_sources_outrank_single_source_items() {
        let index = vec![reference("1", "https://a.example"), reference("2", "https://b.example")];
        let web = vec![reference("3", "https://a.example"), reference("4", "https://c.example")];
        let fused = fuse(&index, &web, DEFAULT_RRF_K, None);
        assert_eq!(fused[0].url.as_deref(), Some("https://a.example"));
    }

    #[test]
    fn dedupes_by_normalized_url_across_sources() {
        let index = vec![reference("1", "https://a.example/")];
        let web = vec![reference("2", "https://a.example")];
        let fused = fuse(&index, &web, DEFAULT_RRF_K, None);
        assert_eq!(fused.len(), 1);
    }

    #[test]
    fn semantic_boost_can_reorder_results() {
        let index = vec![reference("1", "https://a.example"), reference("2", "https://b.example")];
        let web: Vec<Reference> = vec![];
        let mut embeddings = HashMap::new();
        embeddings.insert("https://a.example".to_string(), vec![0.0, 1.0]);
        embeddings.insert("https://b.example".to_string(), vec![1.0, 0.0]);
        let query = vec![1.0, 0.0];
        let fused = fuse(&index, &web, DEFAULT_RRF_K, Some((&query, &embeddings, 0.9)));
        assert_eq!(fused[0].url.as_deref(), Some("https://b.example"));
    }

    proptest::proptest! {
        #[test]
        fn fused_output_never_exceeds_the_union_of_distinct_urls(
            index_urls in proptest::collection::vec(0u8..6, 0..8),
            web_urls in proptest::collection::vec(0u8..6, 0..8),
        ) {
            let index: Vec<Reference> = index_urls
                .iter()
                .enumerate()
                .map(|(i, n)| reference(&format!("i{i}"), &format!("https://{n}.example")))
                .collect();
            let web: Vec<Reference> = web_urls
                .iter()
                .enumerate()
                .map(|(i, n)| reference(&format!("w{i}"), &format!("https://{n}.example")))
                .collect();

            let distinct: std::collections::HashSet<u8> = index_urls.iter().chain(web_urls.iter()).copied().collect();
            let fused = fuse(&index, &web, DEFAULT_RRF_K, None);

            proptest::prop_assert_eq!(fused.len(), distinct.len());
            let scores: Vec<f32> = fused.iter().map(|r| r.score.unwrap_or(0.0)).collect();
            let mut sorted_desc = scores.clone();
            sorted_desc.sort_by(|a, b| b.total_cmp(a));
            proptest::prop_assert_eq!(scores, sorted_desc);
        }
    }
}
