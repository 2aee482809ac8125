//! ABOUTME: Ranks summary bullets for inclusion by embedding similarity, falling back to recency

use groundcrew_core::{cosine_similarity, SummaryBullet};

/// Ranks `bullets` against `query_embedding` and returns the top `k`. When
/// `embeddings` is absent (or a mismatched length), falls back to the most
/// recent `k` bullets by `turn` (`spec.md` §4.5: "otherwise recency-based").
#[must_use]
pub fn select_summaries(
    query_embedding: Option<&[f32]>,
    bullets: &[SummaryBullet],
    embeddings: Option<&[Vec<f32>]>,
    k: usize,
) -> Vec<SummaryBullet> {
    match (query_embedding, embeddings) {
        (Some(query_embedding), Some(embeddings)) if embeddings.len() == bullets.len() => {
            let mut scored: Vec<(f32, usize)> = embeddings
                .iter()
                .enumerate()
                .map(|(i, embedding)| (cosine_similarity(query_embedding, embedding), i))
                .collect();
            scored.sort_by(|a, b| b.0.total_cmp(&a.0));
            scored.into_iter().take(k).map(|(_, i)| bullets[i].clone()).collect()
        }
        _ => {
            let mut by_recency: Vec<&SummaryBullet> = bullets.iter().collect();
            by_recency.sort_by(|a, b| b.turn.cmp(&a.turn));
            by_recency.into_iter().take(k).cloned().collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bullet(turn: u32, text: &str) -> SummaryBullet {
        SummaryBullet { turn, text: text.to_string() }
    }

    #[test]
    fn ranks_by_cosine_similarity_when_embeddings_are_available() {
        let bullets = vec![bullet(1, "a"), bullet(2, "b")];
        let embeddings = vec![vec![0.0, 1.0], vec![1.0, 0.0]];
        let selected = select_summaries(Some(&[1.0, 0.0]), &bullets, Some(&embeddings), 1);
        assert_eq!(selected[0].text, "b");
    }

    #[test]
    fn falls_back_to_recency_without_embeddings() {
        let bullets = vec![bullet(1, "old"), bullet(5, "new"), bullet(3, "mid")];
        let selected = select_summaries(None, &bullets, None, 2);
        assert_eq!(selected.iter().map(|b| b.text.as_str()).collect::<Vec<_>>(), vec!["new", "mid"]);
    }

    #[test]
    fn falls_back_to_recency_on_mismatched_embedding_count() {
        let bullets = vec![bullet(1, "a"), bullet(2, "b")];
        let embeddings = vec![vec![1.0, 0.0]];
        let selected = select_summaries(Some(&[1.0, 0.0]), &bullets, Some(&embeddings), 1);
        assert_eq!(selected[0].text, "b");
    }
}
