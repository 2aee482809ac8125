//! ABOUTME: Intent classification, plan generation, and query decomposition ahead of retrieval

pub mod decompose;
pub mod error;
pub mod intent;
pub mod plan;
pub mod route;
#[cfg(test)]
mod testutil;

pub use decompose::{assess, decompose, ComplexityAssessment, DEFAULT_COMPLEXITY_THRESHOLD};
pub use error::{PlannerError, Result};
pub use intent::{classify_intent, DEFAULT_INTENT_CONF_THRESHOLD};
pub use plan::generate_plan;
pub use route::route_for;

use groundcrew_core::{DecomposedQuery, Intent, Plan, PlanStep, PlanStepKind, RouteProfile};
use groundcrew_providers::LlmProvider;

/// Plan confidence below this forces `steps = {vector_search, web_search}`
/// (`spec.md` §4.1 step 6: "escalate").
pub const DEFAULT_DUAL_THRESHOLD: f32 = 0.4;

/// Everything the orchestrator needs from planning a turn: the classified
/// intent, its route profile, the (possibly escalated) plan, and an
/// optional decomposition when the question warranted one.
#[derive(Debug, Clone)]
pub struct PlannerOutput {
    pub intent: Intent,
    pub route: RouteProfile,
    pub plan: Plan,
    pub plan_confidence: f32,
    pub decomposition: Option<(DecomposedQuery, String)>,
}

/// Tunables resolved from `groundcrew_config::FeatureSet` for one turn.
#[derive(Debug, Clone, Copy)]
pub struct PlannerTuning {
    pub intent_conf_threshold: f32,
    pub dual_threshold: f32,
    pub decomposition_complexity_threshold: f32,
    pub enable_decomposition: bool,
}

impl Default for PlannerTuning {
    fn default() -> Self {
        Self {
            intent_conf_threshold: DEFAULT_INTENT_CONF_THRESHOLD,
            dual_threshold: DEFAULT_DUAL_THRESHOLD,
            decomposition_complexity_threshold: DEFAULT_COMPLEXITY_THRESHOLD,
            enable_decomposition: false,
        }
    }
}

/// Forces a plan to run both retrieval steps when its confidence is too
/// low to trust a narrower one.
fn escalate_if_low_confidence(plan: Plan, confidence: f32, dual_threshold: f32) -> Plan {
    if confidence >= dual_threshold {
        return plan;
    }
    let mut steps = vec![
        PlanStep {
            kind: PlanStepKind::Retrieve,
            description: "retrieve from the internal knowledge index".into(),
        },
        PlanStep {
            kind: PlanStepKind::WebSearch,
            description: "search the public web".into(),
        },
    ];
    steps.extend(plan.steps.into_iter().filter(|s| s.kind == PlanStepKind::Synthesize));
    Plan::new(steps)
}

/// Runs intent routing, plan generation (with low-confidence escalation),
/// and optional query decomposition for one turn, in the order
/// `spec.md` §4.1 steps 5-7 describe.
pub async fn plan_turn(question: &str, provider: &dyn LlmProvider, tuning: PlannerTuning) -> Result<PlannerOutput> {
    let intent = classify_intent(question, provider, tuning.intent_conf_threshold).await?;
    let route = route_for(&intent);

    let (plan, plan_confidence) = generate_plan(question, provider).await?;
    let plan = escalate_if_low_confidence(plan, plan_confidence, tuning.dual_threshold);

    let decomposition = if tuning.enable_decomposition && route.use_decomposition {
        let assessment = assess(question, provider, tuning.decomposition_complexity_threshold).await?;
        if assessment.needs_decomposition {
            Some(decompose(question, provider).await?)
        } else {
            None
        }
    } else {
        None
    };

    Ok(PlannerOutput {
        intent,
        route,
        plan,
        plan_confidence,
        decomposition,
    })
}
