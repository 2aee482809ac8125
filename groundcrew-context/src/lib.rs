//! ABOUTME: Context pipeline — history compaction, summary selection, and token budgeting

pub mod budget;
pub mod compact;
pub mod error;
pub mod select;

pub use budget::{budget, estimate_tokens, total_tokens, SectionCaps, Sections};
pub use compact::{compact as compact_history, CompactionResult};
pub use error::{ContextError, Result};
pub use select::select_summaries;
