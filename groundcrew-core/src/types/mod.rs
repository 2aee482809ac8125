//! ABOUTME: Shared data-model types re-exported at the crate root

pub mod critic;
pub mod decomposition;
pub mod intent;
pub mod memory;
pub mod message;
pub mod plan;
pub mod reference;
pub mod session;
pub mod telemetry;
pub mod web;

pub use critic::{CRAGAction, CRAGConfidence, CRAGEvaluation, CriticAction, CriticReport};
pub use decomposition::{DecomposedQuery, SubQuery};
pub use intent::{Intent, IntentKind, RetrieverStrategy, RouteProfile};
pub use memory::{cosine_similarity, LongTermMemory, MemoryType, SalienceNote, SummaryBullet};
pub use message::{first_two_non_system, Message, Role};
pub use plan::{Plan, PlanStep, PlanStepKind};
pub use reference::{citations_are_closed, extract_citations, Reference, ReferenceSource};
pub use session::SessionId;
pub use telemetry::{ActivityStep, TelemetryEvent, Usage};
pub use web::{WebResult, WebScore};
