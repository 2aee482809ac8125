//! ABOUTME: Planner error taxonomy mapping onto the shared ErrorKind classification

use groundcrew_core::ErrorKind;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PlannerError {
    #[error("planner configuration error: {0}")]
    Configuration(String),

    #[error("structured planner output failed schema validation: {0}")]
    Schema(String),

    #[error(transparent)]
    Provider(#[from] groundcrew_providers::ProviderError),

    #[error(transparent)]
    Core(#[from] groundcrew_core::CoreError),
}

pub type Result<T> = std::result::Result<T, PlannerError>;

impl PlannerError {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Configuration(_) => ErrorKind::Config,
            Self::Schema(_) => ErrorKind::Schema,
            Self::Provider(e) => e.kind(),
            Self::Core(_) => ErrorKind::InternalInvariant,
        }
    }
}
