//! ABOUTME: Intent classification and routing profile types produced by the planner

use serde::{Deserialize, Serialize};

/// Coarse classification of a turn's question, used to pick a `RouteProfile`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentKind {
    FactualLookup,
    Conversational,
    Procedural,
    Comparative,
}

/// Planner output naming the strategy a turn should run with.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Intent {
    pub kind: IntentKind,
    /// 0.0..=1.0 confidence reported by the classifier.
    pub confidence: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetrieverStrategy {
    IndexOnly,
    WebOnly,
    Hybrid,
}

/// The concrete routing decision derived from an `Intent` (`spec.md` §4.1 step 4).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteProfile {
    pub strategy: RetrieverStrategy,
    pub use_lazy_retrieval: bool,
    pub use_decomposition: bool,
}

impl RouteProfile {
    /// Default routing for a conversational turn needing no evidence.
    #[must_use]
    pub fn conversational() -> Self {
        Self {
            strategy: RetrieverStrategy::IndexOnly,
            use_lazy_retrieval: false,
            use_decomposition: false,
        }
    }

    /// Default routing for a grounded factual lookup.
    #[must_use]
    pub fn factual() -> Self {
        Self {
            strategy: RetrieverStrategy::Hybrid,
            use_lazy_retrieval: true,
            use_decomposition: false,
        }
    }

    /// Default routing for a comparative question needing sub-query fan-out.
    #[must_use]
    pub fn comparative() -> Self {
        Self {
            strategy: RetrieverStrategy::Hybrid,
            use_lazy_retrieval: true,
            use_decomposition: true,
        }
    }
}
