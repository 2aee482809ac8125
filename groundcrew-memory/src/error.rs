//! ABOUTME: Memory store error taxonomy mapping onto the shared ErrorKind classification

use groundcrew_core::ErrorKind;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MemoryError {
    #[error("memory store configuration error: {0}")]
    Configuration(String),

    #[error("long-term memory backend returned a transient error: {0}")]
    Transient(String),

    #[error("embedding has {actual} dimensions, store expects {expected}")]
    DimensionMismatch { expected: usize, actual: usize },
}

pub type Result<T> = std::result::Result<T, MemoryError>;

impl MemoryError {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Configuration(_) => ErrorKind::Config,
            Self::Transient(_) => ErrorKind::UpstreamTransient,
            Self::DimensionMismatch { .. } => ErrorKind::Schema,
        }
    }
}
