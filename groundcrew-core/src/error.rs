//! ABOUTME: Error taxonomy shared by every groundcrew crate
//! ABOUTME: Defines CoreError plus the turn-level ErrorKind classification from the orchestrator contract

use thiserror::Error;

/// Errors raised while building or manipulating shared data-model types.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("validation error: {message}")]
    Validation { message: String },

    #[error("invariant violated: {message}")]
    Invariant { message: String },
}

pub type Result<T> = std::result::Result<T, CoreError>;

/// Stable error classification surfaced to transports and telemetry.
///
/// This is a taxonomy, not a type hierarchy: every component-specific error
/// (`RetrievalError`, `ProviderError`, ...) maps onto one of these kinds at
/// the orchestrator boundary so `spec.md` §7's propagation and recovery
/// rules can be expressed as a single `match`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Config,
    Auth,
    UpstreamTimeout,
    UpstreamRateLimited,
    UpstreamTransient,
    UpstreamInvalidRequest,
    Schema,
    RetrievalEmpty,
    ContextOverflow,
    Cancelled,
    DeadlineExceeded,
    InternalInvariant,
}

impl ErrorKind {
    /// Whether this kind is eligible for the retry middleware in `groundcrew-utils`.
    #[must_use]
    pub const fn retryable(self) -> bool {
        matches!(
            self,
            Self::UpstreamTimeout | Self::UpstreamRateLimited | Self::UpstreamTransient
        )
    }

    /// Whether a turn can continue (with degraded evidence) after this error.
    #[must_use]
    pub const fn recoverable(self) -> bool {
        matches!(self, Self::RetrievalEmpty | Self::ContextOverflow)
    }

    /// Whether this kind ends the turn outright.
    #[must_use]
    pub const fn terminal(self) -> bool {
        matches!(
            self,
            Self::Cancelled | Self::DeadlineExceeded | Self::InternalInvariant | Self::Auth
        )
    }
}

/// A classified error carrying the stable `kind`, a human message, and
/// whether the caller should retry. Mirrors the `error{kind, message,
/// retryable}` streaming event from `spec.md` §6.
#[derive(Debug, Clone, Error, serde::Serialize, serde::Deserialize)]
#[error("{kind:?}: {message}")]
pub struct TurnError {
    pub kind: ErrorKind,
    pub message: String,
    pub retryable: bool,
}

impl TurnError {
    #[must_use]
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        let retryable = kind.retryable();
        Self {
            kind,
            message: message.into(),
            retryable,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_kinds_are_exactly_the_upstream_ones() {
        assert!(ErrorKind::UpstreamTimeout.retryable());
        assert!(ErrorKind::UpstreamRateLimited.retryable());
        assert!(ErrorKind::UpstreamTransient.retryable());
        assert!(!ErrorKind::UpstreamInvalidRequest.retryable());
        assert!(!ErrorKind::Config.retryable());
    }

    #[test]
    fn terminal_kinds_end_the_turn() {
        assert!(ErrorKind::Cancelled.terminal());
        assert!(ErrorKind::DeadlineExceeded.terminal());
        assert!(!ErrorKind::RetrievalEmpty.terminal());
    }

    #[test]
    fn turn_error_derives_retryable_from_kind() {
        let err = TurnError::new(ErrorKind::UpstreamRateLimited, "429");
        assert!(err.retryable);
        let err = TurnError::new(ErrorKind::Config, "bad config");
        assert!(!err.retryable);
    }
}
