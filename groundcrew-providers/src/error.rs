//! ABOUTME: Provider error taxonomy mapping onto the shared ErrorKind classification

use groundcrew_core::ErrorKind;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("provider configuration error: {message}")]
    Configuration { message: String },

    #[error("authentication failed for provider {provider}: {message}")]
    Auth { provider: String, message: String },

    #[error("request to {provider} timed out")]
    Timeout { provider: String },

    #[error("provider {provider} rate limited the request, retry after {retry_after_ms:?}ms")]
    RateLimited {
        provider: String,
        retry_after_ms: Option<u64>,
    },

    #[error("provider {provider} returned a transient error: {message}")]
    Transient { provider: String, message: String },

    #[error("provider {provider} rejected the request: {message}")]
    InvalidRequest { provider: String, message: String },

    #[error("provider {provider} returned a response that failed schema validation: {message}")]
    SchemaViolation { provider: String, message: String },

    #[error("unknown provider: {0}")]
    UnknownProvider(String),
}

pub type Result<T> = std::result::Result<T, ProviderError>;

impl ProviderError {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Configuration { .. } | Self::UnknownProvider(_) => ErrorKind::Config,
            Self::Auth { .. } => ErrorKind::Auth,
            Self::Timeout { .. } => ErrorKind::UpstreamTimeout,
            Self::RateLimited { .. } => ErrorKind::UpstreamRateLimited,
            Self::Transient { .. } => ErrorKind::UpstreamTransient,
            Self::InvalidRequest { .. } => ErrorKind::UpstreamInvalidRequest,
            Self::SchemaViolation { .. } => ErrorKind::Schema,
        }
    }
}
