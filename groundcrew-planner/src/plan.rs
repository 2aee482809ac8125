//! ABOUTME: Generates an execution Plan (retrieval/web/both + confidence) via structured LLM output

use crate::error::{PlannerError, Result};
use groundcrew_core::{Message, Plan, PlanStep, PlanStepKind};
use groundcrew_providers::{CompletionRequest, LlmProvider};
use serde::Deserialize;
use serde_json::json;

#[derive(Debug, Deserialize)]
struct PlannedSteps {
    confidence: f32,
    steps: Vec<StepName>,
    #[allow(dead_code)]
    rationale: String,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
enum StepName {
    VectorSearch,
    WebSearch,
}

fn plan_schema() -> serde_json::Value {
    json!({
        "type": "object",
        "properties": {
            "confidence": { "type": "number" },
            "steps": {
                "type": "array",
                "items": { "type": "string", "enum": ["vector_search", "web_search"] }
            },
            "rationale": { "type": "string" }
        },
        "required": ["confidence", "steps", "rationale"]
    })
}

/// Asks the provider which evidence-gathering steps a question needs
/// (`spec.md` §4.7: "plan generation (retrieval/web/both + confidence)").
/// A step named in the plan always becomes a `Retrieve`/`WebSearch` plan
/// step; `Synthesize` is appended last since every plan ends in synthesis.
pub async fn generate_plan(question: &str, provider: &dyn LlmProvider) -> Result<(Plan, f32)> {
    let prompt = format!(
        "Decide which evidence-gathering steps this question needs: \
         vector_search (search an internal knowledge index), web_search \
         (search the public web), or both. Report your confidence \
         (0.0-1.0) and a one-sentence rationale.\n\nQuestion: {question}"
    );
    let request = CompletionRequest::new(vec![Message::user(prompt)]);
    let value = provider.complete_structured(request, &plan_schema()).await?;
    let planned: PlannedSteps =
        serde_json::from_value(value).map_err(|e| PlannerError::Schema(e.to_string()))?;

    let mut steps: Vec<PlanStep> = planned
        .steps
        .into_iter()
        .map(|step| match step {
            StepName::VectorSearch => PlanStep {
                kind: PlanStepKind::Retrieve,
                description: "retrieve from the internal knowledge index".into(),
            },
            StepName::WebSearch => PlanStep {
                kind: PlanStepKind::WebSearch,
                description: "search the public web".into(),
            },
        })
        .collect();
    steps.push(PlanStep {
        kind: PlanStepKind::Synthesize,
        description: "synthesize a grounded answer from gathered evidence".into(),
    });

    Ok((Plan::new(steps), planned.confidence))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::StubProvider;

    #[tokio::test]
    async fn plan_includes_requested_steps_and_always_ends_in_synthesis() {
        let provider = StubProvider::with_json(json!({
            "confidence": 0.8,
            "steps": ["vector_search", "web_search"],
            "rationale": "needs both sources"
        }));
        let (plan, confidence) = generate_plan("what changed in rust 2024", &provider).await.unwrap();
        assert!(plan.contains(PlanStepKind::Retrieve));
        assert!(plan.contains(PlanStepKind::WebSearch));
        assert_eq!(plan.steps.last().unwrap().kind, PlanStepKind::Synthesize);
        assert!((confidence - 0.8).abs() < f32::EPSILON);
    }

    #[tokio::test]
    async fn empty_step_list_still_synthesizes() {
        let provider = StubProvider::with_json(json!({
            "confidence": 0.95,
            "steps": [],
            "rationale": "purely conversational"
        }));
        let (plan, _) = generate_plan("thanks!", &provider).await.unwrap();
        assert_eq!(plan.steps.len(), 1);
        assert_eq!(plan.steps[0].kind, PlanStepKind::Synthesize);
    }
}
