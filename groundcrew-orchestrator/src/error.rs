//! ABOUTME: Orchestrator error taxonomy composing every component's errors onto the shared ErrorKind

use groundcrew_core::ErrorKind;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("turn cancelled")]
    Cancelled,

    #[error("turn exceeded its deadline")]
    DeadlineExceeded,

    #[error("circuit breaker open for {0}")]
    CircuitOpen(String),

    #[error(transparent)]
    Provider(#[from] groundcrew_providers::ProviderError),

    #[error(transparent)]
    Retrieval(#[from] groundcrew_retrieval::RetrievalError),

    #[error(transparent)]
    Web(#[from] groundcrew_web::WebError),

    #[error(transparent)]
    Context(#[from] groundcrew_context::ContextError),

    #[error(transparent)]
    Memory(#[from] groundcrew_memory::MemoryError),

    #[error(transparent)]
    Planner(#[from] groundcrew_planner::PlannerError),

    #[error(transparent)]
    Critic(#[from] groundcrew_critic::CriticError),

    #[error(transparent)]
    Core(#[from] groundcrew_core::CoreError),
}

pub type Result<T> = std::result::Result<T, OrchestratorError>;

impl OrchestratorError {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Cancelled => ErrorKind::Cancelled,
            Self::DeadlineExceeded => ErrorKind::DeadlineExceeded,
            Self::CircuitOpen(_) => ErrorKind::UpstreamTransient,
            Self::Provider(e) => e.kind(),
            Self::Retrieval(e) => e.kind(),
            Self::Web(e) => e.kind(),
            Self::Context(e) => e.kind(),
            Self::Memory(e) => e.kind(),
            Self::Planner(e) => e.kind(),
            Self::Critic(e) => e.kind(),
            Self::Core(_) => ErrorKind::InternalInvariant,
        }
    }

    #[must_use]
    pub fn to_turn_error(&self) -> groundcrew_core::TurnError {
        groundcrew_core::TurnError::new(self.kind(), self.to_string())
    }
}
