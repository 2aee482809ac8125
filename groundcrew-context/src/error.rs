//! ABOUTME: Context pipeline error taxonomy mapping onto the shared ErrorKind classification

use groundcrew_core::ErrorKind;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ContextError {
    #[error("context pipeline configuration error: {0}")]
    Configuration(String),

    #[error(transparent)]
    Provider(#[from] groundcrew_providers::ProviderError),

    #[error("assembled context exceeds the model's context window even after trimming")]
    Overflow,
}

pub type Result<T> = std::result::Result<T, ContextError>;

impl ContextError {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Configuration(_) => ErrorKind::Config,
            Self::Provider(e) => e.kind(),
            Self::Overflow => ErrorKind::ContextOverflow,
        }
    }
}
