//! ABOUTME: Complexity assessment and query decomposition into a sub-query DAG

use crate::error::{PlannerError, Result};
use groundcrew_core::{DecomposedQuery, Message, SubQuery};
use groundcrew_providers::{CompletionRequest, LlmProvider};
use serde::Deserialize;
use serde_json::json;
use tracing::warn;

/// `assess` triggers decomposition above this complexity score by default.
pub const DEFAULT_COMPLEXITY_THRESHOLD: f32 = 0.6;

#[derive(Debug, Clone, Copy)]
pub struct ComplexityAssessment {
    pub complexity: f32,
    pub needs_decomposition: bool,
}

#[derive(Debug, Deserialize)]
struct RawAssessment {
    complexity: f32,
}

fn assessment_schema() -> serde_json::Value {
    json!({
        "type": "object",
        "properties": { "complexity": { "type": "number" } },
        "required": ["complexity"]
    })
}

/// Scores how complex `question` is on `[0, 1]` (`spec.md` §4.7:
/// `assess(question) → {complexity, needsDecomposition}`).
pub async fn assess(question: &str, provider: &dyn LlmProvider, threshold: f32) -> Result<ComplexityAssessment> {
    let prompt = format!(
        "Rate how complex this question is on a scale from 0.0 (simple, \
         single-fact) to 1.0 (requires comparing or combining several \
         independent pieces of information).\n\nQuestion: {question}"
    );
    let request = CompletionRequest::new(vec![Message::user(prompt)]);
    let value = provider.complete_structured(request, &assessment_schema()).await?;
    let raw: RawAssessment =
        serde_json::from_value(value).map_err(|e| PlannerError::Schema(e.to_string()))?;

    Ok(ComplexityAssessment {
        complexity: raw.complexity,
        needs_decomposition: raw.complexity >= threshold,
    })
}

#[derive(Debug, Deserialize)]
struct RawSubQuery {
    id: String,
    text: String,
    #[serde(default)]
    depends_on: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RawDecomposition {
    sub_queries: Vec<RawSubQuery>,
    synthesis_prompt: String,
}

fn decomposition_schema() -> serde_json::Value {
    json!({
        "type": "object",
        "properties": {
            "sub_queries": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "id": { "type": "string" },
                        "text": { "type": "string" },
                        "depends_on": { "type": "array", "items": { "type": "string" } }
                    },
                    "required": ["id", "text"]
                }
            },
            "synthesis_prompt": { "type": "string" }
        },
        "required": ["sub_queries", "synthesis_prompt"]
    })
}

/// Decomposes `question` into a dependency DAG of sub-queries plus the
/// prompt used to synthesize their answers back together. If the
/// provider's graph contains a cycle or an unknown dependency, acyclicity
/// verification rejects it and the caller falls back to the original,
/// undecomposed question (`spec.md` §4.7).
pub async fn decompose(question: &str, provider: &dyn LlmProvider) -> Result<(DecomposedQuery, String)> {
    let prompt = format!(
        "Break this question into independent or dependent sub-questions \
         that together answer it. Give each an id, its text, and the ids \
         of any sub-questions it depends on. Also give a synthesis prompt \
         for combining the sub-answers.\n\nQuestion: {question}"
    );
    let request = CompletionRequest::new(vec![Message::user(prompt)]);
    let value = provider.complete_structured(request, &decomposition_schema()).await?;
    let raw: RawDecomposition =
        serde_json::from_value(value).map_err(|e| PlannerError::Schema(e.to_string()))?;

    let sub_queries: Vec<SubQuery> = raw
        .sub_queries
        .into_iter()
        .map(|s| SubQuery {
            id: s.id,
            text: s.text,
            depends_on: s.depends_on,
        })
        .collect();

    match DecomposedQuery::new(question, sub_queries) {
        Ok(decomposed) => Ok((decomposed, raw.synthesis_prompt)),
        Err(e) => {
            warn!(error = %e, "decomposition graph invalid, falling back to the original question");
            fallback(question)
        }
    }
}

/// A single-node decomposition standing in for "don't decompose": the
/// original question as its own sole sub-query.
fn fallback(question: &str) -> Result<(DecomposedQuery, String)> {
    let decomposed = DecomposedQuery::new(
        question,
        vec![SubQuery {
            id: "q0".into(),
            text: question.to_string(),
            depends_on: Vec::new(),
        }],
    )
    .map_err(PlannerError::Core)?;
    Ok((decomposed, question.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::StubProvider;

    #[tokio::test]
    async fn high_complexity_triggers_decomposition() {
        let provider = StubProvider::with_json(json!({ "complexity": 0.85 }));
        let result = assess("compare A, B, and C across five dimensions", &provider, DEFAULT_COMPLEXITY_THRESHOLD)
            .await
            .unwrap();
        assert!(result.needs_decomposition);
    }

    #[tokio::test]
    async fn low_complexity_skips_decomposition() {
        let provider = StubProvider::with_json(json!({ "complexity": 0.1 }));
        let result = assess("what is the capital of France", &provider, DEFAULT_COMPLEXITY_THRESHOLD)
            .await
            .unwrap();
        assert!(!result.needs_decomposition);
    }

    #[tokio::test]
    async fn decomposes_into_a_valid_dag() {
        let provider = StubProvider::with_json(json!({
            "sub_queries": [
                {"id": "a", "text": "population of A", "depends_on": []},
                {"id": "b", "text": "population of B", "depends_on": []},
                {"id": "c", "text": "compare a and b", "depends_on": ["a", "b"]}
            ],
            "synthesis_prompt": "combine the population figures"
        }));
        let (decomposed, synthesis_prompt) = decompose("compare population of A and B", &provider).await.unwrap();
        assert_eq!(decomposed.sub_queries.len(), 3);
        assert_eq!(synthesis_prompt, "combine the population figures");
    }

    #[tokio::test]
    async fn a_cyclic_graph_falls_back_to_the_original_question() {
        let provider = StubProvider::with_json(json!({
            "sub_queries": [
                {"id": "a", "text": "x", "depends_on": ["b"]},
                {"id": "b", "text": "y", "depends_on": ["a"]}
            ],
            "synthesis_prompt": "n/a"
        }));
        let (decomposed, _) = decompose("some cyclic question", &provider).await.unwrap();
        assert_eq!(decomposed.sub_queries.len(), 1);
        assert_eq!(decomposed.sub_queries[0].text, "some cyclic question");
    }
}
