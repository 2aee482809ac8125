//! ABOUTME: Critic/CRAG error taxonomy mapping onto the shared ErrorKind classification

use groundcrew_core::ErrorKind;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CriticError {
    #[error("critic configuration error: {0}")]
    Configuration(String),

    #[error("structured critic output failed schema validation: {0}")]
    Schema(String),

    #[error(transparent)]
    Provider(#[from] groundcrew_providers::ProviderError),

    #[error("turn cancelled")]
    Cancelled,
}

pub type Result<T> = std::result::Result<T, CriticError>;

impl CriticError {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Configuration(_) => ErrorKind::Config,
            Self::Schema(_) => ErrorKind::Schema,
            Self::Provider(e) => e.kind(),
            Self::Cancelled => ErrorKind::Cancelled,
        }
    }
}
