//! ABOUTME: Turn event streaming, session-scoped pub/sub bus, and activity telemetry
//! ABOUTME: Trimmed from a cross-language event system down to groundcrew's single streaming contract

pub mod bus;
pub mod event;
pub mod recorder;

pub use bus::EventBus;
pub use event::{CorrelatedEvent, TurnEvent};
pub use recorder::{AggregateCounters, TraceRecorder, TurnMode};

pub mod prelude {
    pub use crate::{AggregateCounters, CorrelatedEvent, EventBus, TraceRecorder, TurnEvent, TurnMode};
}
