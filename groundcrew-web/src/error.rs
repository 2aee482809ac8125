//! ABOUTME: Web augmentation error taxonomy mapping onto the shared ErrorKind classification

use groundcrew_core::ErrorKind;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WebError {
    #[error("web search configuration error: {0}")]
    Configuration(String),

    #[error("web search request timed out")]
    Timeout,

    #[error("web search backend returned a transient error: {0}")]
    Transient(String),

    #[error("web search backend rejected the query: {0}")]
    InvalidQuery(String),
}

pub type Result<T> = std::result::Result<T, WebError>;

impl WebError {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Configuration(_) => ErrorKind::Config,
            Self::Timeout => ErrorKind::UpstreamTimeout,
            Self::Transient(_) => ErrorKind::UpstreamTransient,
            Self::InvalidQuery(_) => ErrorKind::UpstreamInvalidRequest,
        }
    }
}
