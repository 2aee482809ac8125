//! ABOUTME: Per-session activity recorder feeding the final telemetry event

use groundcrew_core::{ActivityStep, TelemetryEvent, Usage};
use std::time::Instant;

/// What kind of turn is being recorded, mirrors the orchestrator's chosen
/// route so telemetry sinks can group by mode without re-deriving it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnMode {
    Conversational,
    Grounded,
}

/// Records the activity trace and usage for one turn. Created by
/// `start`, fed via `emit`, and finalized by `complete` or `fail`.
pub struct TraceRecorder {
    session_id: String,
    #[allow(dead_code)]
    mode: TurnMode,
    #[allow(dead_code)]
    question: String,
    started_at: Instant,
    steps: Vec<ActivityStep>,
    usage: Usage,
}

impl TraceRecorder {
    #[must_use]
    pub fn start(session_id: impl Into<String>, mode: TurnMode, question: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            mode,
            question: question.into(),
            started_at: Instant::now(),
            steps: Vec::new(),
            usage: Usage::default(),
        }
    }

    /// Record a completed step with its own timing, computed by the caller
    /// (e.g. `Instant::now() - step_start`).
    pub fn emit(&mut self, name: impl Into<String>, duration_ms: u64, ok: bool) {
        self.steps.push(ActivityStep {
            name: name.into(),
            started_at: chrono::Utc::now(),
            duration_ms,
            ok,
        });
    }

    pub fn add_usage(&mut self, usage: Usage) {
        self.usage = self.usage.combine(usage);
    }

    #[must_use]
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Finalize a successful turn into its `TelemetryEvent`.
    #[must_use]
    pub fn complete(self) -> TelemetryEvent {
        TelemetryEvent {
            steps: self.steps,
            usage: self.usage,
            total_duration_ms: self.started_at.elapsed().as_millis() as u64,
        }
    }

    /// Finalize a failed turn, appending a synthetic failing step so the
    /// trace shows where things stopped.
    #[must_use]
    pub fn fail(mut self, stage: impl Into<String>) -> TelemetryEvent {
        self.emit(stage, 0, false);
        self.complete()
    }
}

/// Running totals across every turn a process has recorded, used for the
/// aggregate counters named in the telemetry contract (turn count, total
/// tokens, error rate).
#[derive(Debug, Default)]
pub struct AggregateCounters {
    pub turns: u64,
    pub failures: u64,
    pub usage: Usage,
}

impl AggregateCounters {
    pub fn record(&mut self, telemetry: &TelemetryEvent, ok: bool) {
        self.turns += 1;
        if !ok {
            self.failures += 1;
        }
        self.usage = self.usage.combine(telemetry.usage);
    }

    #[must_use]
    pub fn error_rate(&self) -> f64 {
        if self.turns == 0 {
            0.0
        } else {
            self.failures as f64 / self.turns as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn complete_reports_recorded_steps_and_usage() {
        let mut recorder = TraceRecorder::start("s1", TurnMode::Grounded, "what is photosynthesis?");
        recorder.emit("retrieve", 40, true);
        recorder.add_usage(Usage {
            prompt_tokens: 100,
            completion_tokens: 20,
        });
        let telemetry = recorder.complete();
        assert_eq!(telemetry.steps.len(), 1);
        assert_eq!(telemetry.usage.total(), 120);
    }

    #[test]
    fn fail_appends_a_failing_step() {
        let recorder = TraceRecorder::start("s1", TurnMode::Grounded, "q");
        let telemetry = recorder.fail("retrieve");
        assert_eq!(telemetry.steps.len(), 1);
        assert!(!telemetry.steps[0].ok);
    }

    #[test]
    fn aggregate_counters_track_error_rate() {
        let mut counters = AggregateCounters::default();
        let ok_telemetry = TraceRecorder::start("s", TurnMode::Conversational, "hi").complete();
        let failed_telemetry = TraceRecorder::start("s", TurnMode::Conversational, "hi").fail("plan");
        counters.record(&ok_telemetry, true);
        counters.record(&failed_telemetry, false);
        assert_eq!(counters.turns, 2);
        assert!((counters.error_rate() - 0.5).abs() < 1e-9);
    }
}
