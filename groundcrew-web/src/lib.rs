//! ABOUTME: Web search augmentation — search client trait, quality filtering, and RRF fusion

pub mod client;
pub mod error;
pub mod fusion;
pub mod scoring;

pub use client::WebSearchClient;
pub use error::{Result, WebError};
pub use fusion::{fuse, DEFAULT_RRF_K, DEFAULT_SEMANTIC_BOOST_WEIGHT};
pub use scoring::{filter, DomainAuthority, FilterOutcome, ScorableResult};
