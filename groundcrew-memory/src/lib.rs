//! ABOUTME: Short-term per-session memory and long-term embedding-indexed recall

pub mod error;
pub mod long_term;
pub mod short_term;

pub use error::{MemoryError, Result};
pub use long_term::{recall_or_empty, InMemoryLongTermStore, LongTermMemoryStore, MemoryStats, RecallFilter};
pub use short_term::{SessionMemory, ShortTermStore};
