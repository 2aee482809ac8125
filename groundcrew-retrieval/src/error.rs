//! ABOUTME: Retrieval error taxonomy mapping onto the shared ErrorKind classification

use groundcrew_core::ErrorKind;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RetrievalError {
    #[error("search client configuration error: {0}")]
    Configuration(String),

    #[error("search request timed out")]
    Timeout,

    #[error("search backend returned a transient error: {0}")]
    Transient(String),

    #[error("search backend rejected the query: {0}")]
    InvalidQuery(String),

    #[error("no evidence survived retrieval and every fallback stage was exhausted")]
    Empty,

    #[error(transparent)]
    Provider(#[from] groundcrew_providers::ProviderError),
}

pub type Result<T> = std::result::Result<T, RetrievalError>;

impl RetrievalError {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Configuration(_) => ErrorKind::Config,
            Self::Timeout => ErrorKind::UpstreamTimeout,
            Self::Transient(_) => ErrorKind::UpstreamTransient,
            Self::InvalidQuery(_) => ErrorKind::UpstreamInvalidRequest,
            Self::Empty => ErrorKind::RetrievalEmpty,
            Self::Provider(e) => e.kind(),
        }
    }
}
