//! Resolved feature flags and tunables that drive a turn's pipeline.
//!
//! `FeatureSet` is the fully-resolved value consumed by every other crate.
//! `FeatureLayer` is the partial, "only what changed" shape used at each of
//! the three configuration layers named in the turn contract: compiled-in
//! defaults, a persisted per-session override, and a per-request override.
//! `merge` composes three layers the same way the source project composes
//! config files: later layers win field-by-field, `None` means "inherit".

use serde::{Deserialize, Serialize};

/// Fully resolved configuration for one turn. Every field has a concrete
/// value; there is nothing left to inherit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureSet {
    pub enable_lazy_retrieval: bool,
    pub enable_intent_routing: bool,
    pub enable_query_decomposition: bool,
    pub enable_web_reranking: bool,
    pub enable_semantic_boost: bool,
    pub enable_semantic_memory: bool,
    pub enable_critic: bool,
    pub enable_crag: bool,
    pub enable_web_quality_filter: bool,
    pub enable_adaptive_retrieval: bool,

    /// Sub-queries run concurrently when a question is decomposed.
    pub max_parallel_sub_queries: u32,
    /// Adaptive reformulation attempts before falling back to web search.
    pub max_reformulations: u32,
    /// Documents requested per retrieval call before reranking.
    pub top_k: u32,
    /// Minimum reranker score a document must clear to stay in context.
    pub reranker_threshold: f32,
    /// RRF constant used when fusing index and web result rankings.
    pub rrf_k: u32,
    /// Weight given to the semantic-similarity term in web result fusion.
    pub semantic_boost_weight: f32,
    /// Soft token budget for assembled context before compaction kicks in.
    pub context_token_budget: u32,
    /// Wall-clock budget for a turn before `DeadlineExceeded` is raised.
    pub turn_timeout_ms: u64,
}

impl Default for FeatureSet {
    fn default() -> Self {
        Self {
            enable_lazy_retrieval: true,
            enable_intent_routing: true,
            enable_query_decomposition: false,
            enable_web_reranking: true,
            enable_semantic_boost: true,
            enable_semantic_memory: false,
            enable_critic: true,
            enable_crag: true,
            enable_web_quality_filter: true,
            enable_adaptive_retrieval: true,

            max_parallel_sub_queries: 4,
            max_reformulations: 3,
            top_k: 8,
            reranker_threshold: 0.55,
            rrf_k: 60,
            semantic_boost_weight: 0.3,
            context_token_budget: 6_000,
            turn_timeout_ms: 30_000,
        }
    }
}

/// A partial override of `FeatureSet`: every field is optional, `None`
/// meaning "inherit the layer beneath this one".
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureLayer {
    pub enable_lazy_retrieval: Option<bool>,
    pub enable_intent_routing: Option<bool>,
    pub enable_query_decomposition: Option<bool>,
    pub enable_web_reranking: Option<bool>,
    pub enable_semantic_boost: Option<bool>,
    pub enable_semantic_memory: Option<bool>,
    pub enable_critic: Option<bool>,
    pub enable_crag: Option<bool>,
    pub enable_web_quality_filter: Option<bool>,
    pub enable_adaptive_retrieval: Option<bool>,

    pub max_parallel_sub_queries: Option<u32>,
    pub max_reformulations: Option<u32>,
    pub top_k: Option<u32>,
    pub reranker_threshold: Option<f32>,
    pub rrf_k: Option<u32>,
    pub semantic_boost_weight: Option<f32>,
    pub context_token_budget: Option<u32>,
    pub turn_timeout_ms: Option<u64>,
}

macro_rules! apply_layer {
    ($base:expr, $layer:expr, $($field:ident),+ $(,)?) => {
        $(
            if let Some(value) = $layer.$field {
                $base.$field = value;
            }
        )+
    };
}

/// Apply `layer` on top of `base`, returning the resolved set.
///
/// Mirrors the source project's layer composition: each present field in
/// `layer` overrides `base`; absent fields fall through unchanged.
#[must_use]
pub fn apply(mut base: FeatureSet, layer: &FeatureLayer) -> FeatureSet {
    apply_layer!(
        base,
        layer,
        enable_lazy_retrieval,
        enable_intent_routing,
        enable_query_decomposition,
        enable_web_reranking,
        enable_semantic_boost,
        enable_semantic_memory,
        enable_critic,
        enable_crag,
        enable_web_quality_filter,
        enable_adaptive_retrieval,
        max_parallel_sub_queries,
        max_reformulations,
        top_k,
        reranker_threshold,
        rrf_k,
        semantic_boost_weight,
        context_token_budget,
        turn_timeout_ms,
    );
    base
}

/// Resolve the three configuration layers named in the turn contract:
/// compiled-in defaults, a persisted per-session override, and a
/// per-request override. Later layers take precedence.
#[must_use]
pub fn merge(
    defaults: FeatureSet,
    persisted: Option<&FeatureLayer>,
    request: Option<&FeatureLayer>,
) -> FeatureSet {
    let mut resolved = defaults;
    if let Some(layer) = persisted {
        resolved = apply(resolved, layer);
    }
    if let Some(layer) = request {
        resolved = apply(resolved, layer);
    }
    resolved
}
