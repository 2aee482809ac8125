//! ABOUTME: LLM provider abstraction, registry, and rig-core backed implementation
//! ABOUTME: Trimmed from a multi-backend (cloud + local GGUF + Ollama) crate down to hosted API providers

pub mod abstraction;
pub mod auth;
pub mod error;
pub mod rig;

pub use abstraction::{
    CompletionRequest, CompletionResponse, LlmProvider, ProviderCapabilities, ProviderConfig,
    ProviderManager, ProviderRegistry, TokenStream,
};
pub use auth::{Auth, BearerTokenSource, CachedBearerToken};
pub use error::{ProviderError, Result};
pub use rig::RigProvider;
