//! ABOUTME: The tagged streaming event union emitted for every turn

use groundcrew_core::{
    ActivityStep, CriticReport, Plan, Reference, RouteProfile, TelemetryEvent, TurnError, Usage,
    WebResult,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Every variant a client may receive while a turn is in flight.
///
/// Serializes with an externally tagged `type` discriminant, one event per
/// SSE/WebSocket frame. Order between variants is not guaranteed except
/// that `complete`/`error` is always last and `done` always terminates the
/// stream.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TurnEvent {
    Status { message: String },
    Plan { plan: Plan },
    Route { route: RouteProfile },
    Context { references: Vec<Reference> },
    Activity { step: ActivityStep },
    Citations { ids: Vec<String> },
    WebResults { results: Vec<WebResult> },
    Token { text: String },
    Usage { usage: Usage },
    Critique { report: CriticReport },
    Telemetry { telemetry: TelemetryEvent },
    Complete { answer: String },
    Error { error: TurnError },
    Done,
}

/// Carries a `TurnEvent` along with the session/turn it belongs to and a
/// correlation id unique to the event itself, so a client or log sink can
/// de-duplicate redelivered events.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorrelatedEvent {
    pub correlation_id: Uuid,
    pub session_id: String,
    pub turn: u32,
    pub sequence: u64,
    pub event: TurnEvent,
}
