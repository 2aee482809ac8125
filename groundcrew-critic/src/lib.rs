//! ABOUTME: Post-synthesis critic grading and pre-synthesis CRAG retrieval grading

pub mod crag;
pub mod critic;
pub mod error;
pub mod revise;
#[cfg(test)]
mod testutil;

pub use crag::{grade_retrieval, refine};
pub use critic::{citation_closure, citation_coverage, grade_answer, DEFAULT_GROUNDEDNESS_THRESHOLD};
pub use error::{CriticError, Result};
pub use revise::critic_loop;
