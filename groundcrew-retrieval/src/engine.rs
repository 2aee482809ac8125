//! ABOUTME: Retrieval engine: runs the fallback chain, then adaptive reformulation, over a search client

use crate::client::SearchClient;
use crate::error::{RetrievalError, Result};
use crate::query::SearchQuery;
use crate::strategy::{fallback_chain, FallbackStage};
use groundcrew_core::{Message, Reference};
use groundcrew_providers::{CompletionRequest, LlmProvider};
use std::sync::Arc;
use tracing::{info, warn};

const LAZY_SUMMARY_CHARS: usize = 240;
const DEFAULT_MIN_DOCS: usize = 1;

/// How a `retrieve` call actually found its evidence — useful for
/// telemetry and for the critic/CRAG stage deciding how much to trust it.
#[derive(Debug, Clone)]
pub struct RetrievalDiagnostics {
    pub stage: FallbackStage,
    pub reformulations: u32,
    pub attempted: usize,
    pub succeeded: bool,
    pub mean_score: Option<f32>,
    pub min_score: Option<f32>,
    pub max_score: Option<f32>,
}

/// Truncate each reference's content to [`LAZY_SUMMARY_CHARS`] and flag it
/// as summary-only, so the caller later calls [`RetrievalEngine::load`] for
/// the ones it actually cites.
fn mark_as_summary(references: &mut [Reference]) {
    for reference in references {
        if reference.content.len() > LAZY_SUMMARY_CHARS {
            reference.content.truncate(LAZY_SUMMARY_CHARS);
            reference.content.push('\u{2026}');
        }
        reference.is_summary = true;
    }
}

fn score_stats(references: &[Reference]) -> (Option<f32>, Option<f32>, Option<f32>) {
    let scores: Vec<f32> = references.iter().filter_map(|r| r.score).collect();
    if scores.is_empty() {
        return (None, None, None);
    }
    let sum: f32 = scores.iter().sum();
    let min = scores.iter().copied().fold(f32::INFINITY, f32::min);
    let max = scores.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    (Some(sum / scores.len() as f32), Some(min), Some(max))
}

#[derive(Debug, Clone)]
pub struct RetrievalResult {
    pub references: Vec<Reference>,
    pub diagnostics: RetrievalDiagnostics,
}

/// Retrieves evidence for a query, falling back through the 4-stage chain
/// and, when that's exhausted and a provider is available, reformulating
/// the query text and trying the chain again (`spec.md` §4.3, adaptive
/// retrieval).
pub struct RetrievalEngine {
    client: Arc<dyn SearchClient>,
    provider: Option<Arc<dyn LlmProvider>>,
    min_docs: usize,
}

impl RetrievalEngine {
    #[must_use]
    pub fn new(client: Arc<dyn SearchClient>) -> Self {
        Self {
            client,
            provider: None,
            min_docs: DEFAULT_MIN_DOCS,
        }
    }

    #[must_use]
    pub fn with_reformulation_provider(mut self, provider: Arc<dyn LlmProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Minimum document count the first (primary-threshold) stage must clear
    /// to terminate the chain immediately; later stages accept any result.
    #[must_use]
    pub fn with_min_docs(mut self, min_docs: usize) -> Self {
        self.min_docs = min_docs;
        self
    }

    /// Run the fallback chain once against `query`, returning the first
    /// stage that cleared its success bar: `min_docs` for the primary
    /// hybrid stage, any non-empty result for every relaxed stage after it.
    /// The last stage, [`FallbackStage::LazyMode`], never fails on a thin
    /// result — it accepts whatever the vector-only query returns and
    /// marks it as summary evidence rather than exhausting the chain.
    async fn run_chain(&self, query: &SearchQuery) -> Result<(FallbackStage, Vec<Reference>)> {
        for (stage, attempt) in fallback_chain(query) {
            let mut references = self.client.search(&attempt).await?;

            if stage == FallbackStage::LazyMode {
                if references.is_empty() {
                    break;
                }
                mark_as_summary(&mut references);
                info!(?stage, count = references.len(), "retrieval fell back to lazy mode");
                return Ok((stage, references));
            }

            let threshold = if stage == FallbackStage::HybridRerank { self.min_docs } else { 1 };
            if references.len() >= threshold {
                info!(?stage, count = references.len(), "retrieval stage produced results");
                return Ok((stage, references));
            }
            warn!(?stage, count = references.len(), "retrieval stage under threshold, relaxing query");
        }
        Err(RetrievalError::Empty)
    }

    async fn reformulate(&self, original: &str) -> Result<String> {
        let provider = self
            .provider
            .as_ref()
            .ok_or(RetrievalError::Empty)?;
        let prompt = format!(
            "Rewrite this search query to surface different relevant documents. \
             Keep the same intent. Return only the rewritten query.\n\nQuery: {original}"
        );
        let response = provider
            .complete(CompletionRequest::new(vec![Message::user(prompt)]))
            .await?;
        Ok(response.text.trim().to_string())
    }

    /// Retrieve full-content evidence, exhausting the fallback chain and,
    /// if configured, up to `max_reformulations` query rewrites.
    pub async fn retrieve(&self, mut query: SearchQuery, max_reformulations: u32) -> Result<RetrievalResult> {
        let mut reformulations = 0;
        let mut attempted = 0;
        loop {
            attempted += 1;
            match self.run_chain(&query).await {
                Ok((stage, references)) => {
                    let (mean_score, min_score, max_score) = score_stats(&references);
                    return Ok(RetrievalResult {
                        references,
                        diagnostics: RetrievalDiagnostics {
                            stage,
                            reformulations,
                            attempted,
                            succeeded: true,
                            mean_score,
                            min_score,
                            max_score,
                        },
                    });
                }
                Err(RetrievalError::Empty) if reformulations < max_reformulations && self.provider.is_some() => {
                    let rewritten = self.reformulate(&query.text).await?;
                    info!(attempt = reformulations + 1, rewritten, "reformulating query after empty retrieval");
                    query = SearchQuery { text: rewritten, ..query };
                    reformulations += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// Retrieve summary-only evidence: the planner's eager choice to skip
    /// full-content loading upfront, independent of whether the fallback
    /// chain itself had to fall all the way to [`FallbackStage::LazyMode`].
    /// Each reference's `content` is truncated and `is_summary` is set, so
    /// the caller can later call [`Self::load`] for the ones it actually
    /// cites.
    pub async fn retrieve_lazy(&self, query: SearchQuery, max_reformulations: u32) -> Result<RetrievalResult> {
        let mut result = self.retrieve(query, max_reformulations).await?;
        mark_as_summary(&mut result.references);
        Ok(result)
    }

    pub async fn load(&self, id: &str) -> Result<Reference> {
        self.client.load(id).await
    }
}
