//! ABOUTME: Hybrid search client trait and adaptive fallback retrieval engine

pub mod client;
pub mod engine;
pub mod error;
pub mod query;
pub mod strategy;

pub use client::SearchClient;
pub use engine::{RetrievalDiagnostics, RetrievalEngine, RetrievalResult};
pub use error::{Result, RetrievalError};
pub use query::{SearchQuery, VectorFilterMode};
pub use strategy::{fallback_chain, FallbackStage};
