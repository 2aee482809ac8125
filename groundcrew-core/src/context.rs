//! ABOUTME: Per-turn execution context threaded through every component call

use crate::types::SessionId;
use tokio_util::sync::CancellationToken;

/// Feature overrides scoped to a single turn, layered on top of session and
/// request-level configuration by `groundcrew_config::FeatureSet::merge`.
#[derive(Debug, Clone, Default)]
pub struct FeatureOverrides {
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
}

/// Everything the orchestrator threads through a single turn's pipeline:
/// identity, cancellation, deadline, and feature overrides. Cloning is
/// cheap — the cancellation token is shared, not duplicated.
#[derive(Debug, Clone)]
pub struct TurnContext {
    pub session_id: SessionId,
    pub turn: u32,
    cancellation: CancellationToken,
    deadline: Option<std::time::Instant>,
    pub overrides: FeatureOverrides,
}

impl TurnContext {
    #[must_use]
    pub fn new(session_id: SessionId, turn: u32) -> Self {
        Self {
            session_id,
            turn,
            cancellation: CancellationToken::new(),
            deadline: None,
            overrides: FeatureOverrides::default(),
        }
    }

    #[must_use]
    pub fn with_deadline(mut self, timeout: std::time::Duration) -> Self {
        self.deadline = Some(std::time::Instant::now() + timeout);
        self
    }

    #[must_use]
    pub fn with_overrides(mut self, overrides: FeatureOverrides) -> Self {
        self.overrides = overrides;
        self
    }

    #[must_use]
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancellation.clone()
    }

    /// A context that inherits this one's cancellation token and deadline
    /// but names an independent sub-operation — used for the per-sub-query
    /// contexts spawned by `groundcrew_retrieval` under decomposition.
    #[must_use]
    pub fn child(&self) -> Self {
        Self {
            session_id: self.session_id.clone(),
            turn: self.turn,
            cancellation: self.cancellation.child_token(),
            deadline: self.deadline,
            overrides: self.overrides.clone(),
        }
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }

    pub fn cancel(&self) {
        self.cancellation.cancel();
    }

    #[must_use]
    pub fn deadline_exceeded(&self) -> bool {
        self.deadline.is_some_and(|d| std::time::Instant::now() >= d)
    }

    #[must_use]
    pub fn remaining(&self) -> Option<std::time::Duration> {
        self.deadline
            .map(|d| d.saturating_duration_since(std::time::Instant::now()))
    }
}
