//! ABOUTME: The sync Response shape returned by a completed turn (spec.md §6)

use groundcrew_core::{CriticReport, Plan, Reference, RouteProfile, Usage, WebResult};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RetrievalDiagnosticsView {
    pub stage: String,
    pub reformulations: u32,
    pub attempted: usize,
    pub succeeded: bool,
    pub mean_score: Option<f32>,
    pub min_score: Option<f32>,
    pub max_score: Option<f32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DecompositionDiagnosticsView {
    pub sub_query_count: usize,
    pub fell_back: bool,
}

/// Per-turn diagnostics surfaced alongside the answer (`spec.md` §6
/// `diagnostics: {retrieval, webFilter?, reformulations?, decomposition?}`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Diagnostics {
    pub retrieval: Option<RetrievalDiagnosticsView>,
    pub web_filter_kept: Option<usize>,
    pub web_filter_removed: Option<usize>,
    pub decomposition: Option<DecompositionDiagnosticsView>,
    pub crag_action: Option<String>,
    /// The turn returned something, but it's incomplete: retrieval failed
    /// to clear its success bar even after every fallback, or the critic
    /// loop exhausted its revisions without accepting the final draft.
    pub partial: bool,
    /// The critic loop ran and its last report was not `Accept`.
    pub critic_unresolved: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteInfo {
    pub intent: String,
    pub confidence: f32,
    pub strategy: String,
}

#[must_use]
pub fn route_info(intent: &groundcrew_core::Intent, route: &RouteProfile) -> RouteInfo {
    RouteInfo {
        intent: format!("{:?}", intent.kind),
        confidence: intent.confidence,
        strategy: format!("{:?}", route.strategy),
    }
}

/// The full response to a completed turn, matching spec.md §6's sync
/// response shape field for field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
    pub answer: String,
    pub references: Vec<Reference>,
    pub web_results: Vec<WebResult>,
    pub activity: Vec<groundcrew_core::ActivityStep>,
    pub plan: Plan,
    pub critic: Vec<CriticReport>,
    pub route: Option<RouteInfo>,
    pub diagnostics: Diagnostics,
    pub usage: Usage,
    pub session_id: String,
    pub turn: u32,
}
