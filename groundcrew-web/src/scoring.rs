//! ABOUTME: Domain authority lookup and authority/novelty/relevance quality scoring for web results

use groundcrew_core::{cosine_similarity, WebResult, WebScore};
use std::collections::HashSet;
use tracing::debug;

const AUTHORITY_TRUSTED: f32 = 0.9;
const AUTHORITY_UNKNOWN: f32 = 0.5;
const AUTHORITY_SPAM: f32 = 0.0;

const AUTHORITY_WEIGHT: f32 = 0.3;
const NOVELTY_WEIGHT: f32 = 0.3;
const RELEVANCE_WEIGHT: f32 = 0.4;

const KEEP_MIN_AUTHORITY: f32 = 0.3;
const KEEP_MAX_STALENESS: f32 = 0.9;
const KEEP_MIN_RELEVANCE: f32 = 0.3;

/// Lookup table of domains known to be trustworthy or known spam/low-quality
/// sources. Anything not listed scores as unknown.
#[derive(Debug, Clone, Default)]
pub struct DomainAuthority {
    trusted: HashSet<String>,
    spam: HashSet<String>,
}

impl DomainAuthority {
    #[must_use]
    pub fn new(trusted: impl IntoIterator<Item = String>, spam: impl IntoIterator<Item = String>) -> Self {
        Self {
            trusted: trusted.into_iter().collect(),
            spam: spam.into_iter().collect(),
        }
    }

    #[must_use]
    pub fn score(&self, url: &str) -> f32 {
        let Some(domain) = extract_domain(url) else {
            return AUTHORITY_UNKNOWN;
        };
        if self.trusted.contains(&domain) {
            AUTHORITY_TRUSTED
        } else if self.spam.contains(&domain) {
            AUTHORITY_SPAM
        } else {
            AUTHORITY_UNKNOWN
        }
    }
}

fn extract_domain(url: &str) -> Option<String> {
    let without_scheme = url.split_once("://").map_or(url, |(_, rest)| rest);
    let host = without_scheme.split('/').next()?;
    Some(host.trim_start_matches("www.").to_lowercase())
}

/// A web result paired with its embedding, ready for scoring against the
/// query and the evidence already retrieved from the index.
#[derive(Debug, Clone)]
pub struct ScorableResult {
    pub result: WebResult,
    pub embedding: Vec<f32>,
}

#[derive(Debug, Clone)]
pub struct FilterOutcome {
    /// Each result's `scores` field is populated before it lands here.
    pub kept: Vec<WebResult>,
    pub removed: Vec<WebResult>,
}

/// Scores each candidate against domain authority, novelty relative to
/// evidence already known from the index, and relevance to the query, then
/// partitions into kept/removed per `spec.md` §4.4's keep predicate and
/// sorts `kept` by `overall` descending.
#[must_use]
pub fn filter(
    candidates: Vec<ScorableResult>,
    query_embedding: &[f32],
    known_embeddings: &[Vec<f32>],
    authority: &DomainAuthority,
) -> FilterOutcome {
    let mut kept = Vec::new();
    let mut removed = Vec::new();

    for candidate in candidates {
        let mut result = candidate.result;
        let score = score_one(&result, &candidate.embedding, query_embedding, known_embeddings, authority);
        let staleness = 1.0 - score.novelty;
        let keep = score.authority >= KEEP_MIN_AUTHORITY
            && staleness <= KEEP_MAX_STALENESS
            && score.relevance >= KEEP_MIN_RELEVANCE;

        debug!(url = %result.url, ?score, keep, "scored web result");
        result.scores = score;
        if keep {
            kept.push(result);
        } else {
            removed.push(result);
        }
    }

    kept.sort_by(|a, b| b.scores.overall.total_cmp(&a.scores.overall));
    FilterOutcome { kept, removed }
}

fn score_one(
    result: &WebResult,
    embedding: &[f32],
    query_embedding: &[f32],
    known_embeddings: &[Vec<f32>],
    authority: &DomainAuthority,
) -> WebScore {
    let authority_score = authority.score(&result.url);

    let max_known_similarity = known_embeddings
        .iter()
        .map(|known| cosine_similarity(embedding, known))
        .fold(f32::NEG_INFINITY, f32::max);
    let novelty = if known_embeddings.is_empty() {
        1.0
    } else {
        (1.0 - max_known_similarity).clamp(0.0, 1.0)
    };

    let relevance = cosine_similarity(query_embedding, embedding);

    let overall = AUTHORITY_WEIGHT * authority_score + NOVELTY_WEIGHT * novelty + RELEVANCE_WEIGHT * relevance;

    WebScore {
        authority: authority_score,
        novelty,
        relevance,
        overall,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(url: &str) -> WebResult {
        WebResult::new(url, "title", "snippet")
    }

    #[test]
    fn trusted_domain_scores_higher_than_unknown() {
        let authority = DomainAuthority::new(["wikipedia.org".to_string()], []);
        assert!(authority.score("https://wikipedia.org/wiki/X") > authority.score("https://nobody-knows.example"));
    }

    #[test]
    fn keeps_relevant_novel_authoritative_results() {
        let authority = DomainAuthority::new(["wikipedia.org".to_string()], []);
        let candidates = vec![ScorableResult {
            result: result("https://wikipedia.org/wiki/x"),
            embedding: vec![1.0, 0.0],
        }];
        let outcome = filter(candidates, &[1.0, 0.0], &[], &authority);
        assert_eq!(outcome.kept.len(), 1);
        assert!(outcome.removed.is_empty());
    }

    #[test]
    fn drops_results_too_similar_to_known_evidence() {
        let authority = DomainAuthority::new(["wikipedia.org".to_string()], []);
        let candidates = vec![ScorableResult {
            result: result("https://wikipedia.org/wiki/x"),
            embedding: vec![1.0, 0.0],
        }];
        let known = vec![vec![1.0, 0.0]];
        let outcome = filter(candidates, &[1.0, 0.0], &known, &authority);
        assert!(outcome.kept.is_empty());
        assert_eq!(outcome.removed.len(), 1);
    }

    #[test]
    fn drops_spam_domains_regardless_of_relevance() {
        let authority = DomainAuthority::new([], ["spam.example".to_string()]);
        let candidates = vec![ScorableResult {
            result: result("https://spam.example/page"),
            embedding: vec![1.0, 0.0],
        }];
        let outcome = filter(candidates, &[1.0, 0.0], &[], &authority);
        assert!(outcome.kept.is_empty());
    }

    #[test]
    fn kept_results_carry_their_computed_scores() {
        let authority = DomainAuthority::new(["wikipedia.org".to_string()], []);
        let candidates = vec![ScorableResult {
            result: result("https://wikipedia.org/wiki/x"),
            embedding: vec![1.0, 0.0],
        }];
        let outcome = filter(candidates, &[1.0, 0.0], &[], &authority);
        assert_eq!(outcome.kept[0].scores.authority, AUTHORITY_TRUSTED);
        assert_eq!(outcome.kept[0].scores.relevance, 1.0);
    }
}
