//! ABOUTME: Execution plan emitted by the planner ahead of retrieval

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanStepKind {
    Retrieve,
    WebSearch,
    Decompose,
    Synthesize,
    Critique,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanStep {
    pub kind: PlanStepKind,
    pub description: String,
}

/// The ordered set of steps the orchestrator intends to run for a turn.
/// Streamed to clients as the `plan` event (`spec.md` §6) before execution
/// begins, so it reflects intent rather than the final, possibly degraded,
/// execution trace.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Plan {
    pub steps: Vec<PlanStep>,
}

impl Plan {
    #[must_use]
    pub fn new(steps: Vec<PlanStep>) -> Self {
        Self { steps }
    }

    #[must_use]
    pub fn contains(&self, kind: PlanStepKind) -> bool {
        self.steps.iter().any(|s| s.kind == kind)
    }
}
