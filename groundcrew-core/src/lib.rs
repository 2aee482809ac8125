//! ABOUTME: Shared data model, error taxonomy, and turn context for the groundcrew workspace
//! ABOUTME: Every other groundcrew-* crate depends on this one; it depends on nothing in-workspace

pub mod context;
pub mod error;
pub mod types;

pub use context::{FeatureOverrides, TurnContext};
pub use error::{CoreError, ErrorKind, Result, TurnError};
pub use types::{
    citations_are_closed, cosine_similarity, extract_citations, ActivityStep, CRAGAction,
    CRAGConfidence, CRAGEvaluation, CriticAction, CriticReport, DecomposedQuery, Intent,
    IntentKind, LongTermMemory, MemoryType, Message, Plan, PlanStep, PlanStepKind,
    Reference, ReferenceSource, RetrieverStrategy, RouteProfile, Role, SalienceNote, SessionId,
    SubQuery, SummaryBullet, TelemetryEvent, Usage, WebResult, WebScore,
};
